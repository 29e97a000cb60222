use std::collections::{BTreeSet, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::core::types::ColumnMeta;

/// One visible column of a table, after exclusion and customisation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub sql_type: String,
    pub caption: String,
    pub searchable: bool,
    pub displayed: bool,
    /// Raw SQL selected in place of the bare column name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_expression: Option<String>,
}

impl ColumnDescriptor {
    pub fn from_meta(meta: &ColumnMeta) -> Self {
        let sql_type = meta.decl_type.clone().unwrap_or_default();
        Self {
            name: meta.name.clone(),
            searchable: is_searchable_type(&sql_type),
            sql_type,
            caption: meta.name.clone(),
            displayed: true,
            custom_expression: None,
        }
    }

    /// Name the column carries in the projected rows: the trailing
    /// `AS alias` of a custom expression, otherwise the column key.
    pub fn projected_name(&self) -> String {
        self.custom_expression
            .as_deref()
            .and_then(expression_alias)
            .unwrap_or_else(|| self.name.clone())
    }
}

/// Trailing `AS alias` of a select expression, unquoted.
pub fn expression_alias(expr: &str) -> Option<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let caps = PATTERN
        .get_or_init(|| {
            Regex::new(r#"(?i)\s+AS\s+("(?:[^"]|"")+"|[A-Za-z_][A-Za-z0-9_]*)\s*$"#)
                .expect("static pattern")
        })
        .captures(expr)?;
    let alias = caps.get(1)?.as_str();
    Some(match alias.strip_prefix('"').and_then(|a| a.strip_suffix('"')) {
        Some(quoted) => quoted.replace("\"\"", "\""),
        None => alias.to_string(),
    })
}

/// Coarse lexical classification of a declared type: `VARCHAR...`, `...TEXT`
/// and `INT...` are searchable, case-insensitively. Untyped columns are not.
pub fn is_searchable_type(sql_type: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)^VARCHAR|TEXT$|^INT").expect("static pattern"))
        .is_match(sql_type)
}

/// Ordered column list for one table. Position is significant: sort
/// requests address columns by index into this list.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ColumnCatalog {
    columns: Vec<ColumnDescriptor>,
}

impl ColumnCatalog {
    /// Build from introspected columns, dropping excluded names and
    /// duplicate keys (first occurrence wins), then letting `customize`
    /// adjust each surviving column.
    pub fn build<I, F>(metas: I, excluded: &BTreeSet<String>, mut customize: F) -> Self
    where
        I: IntoIterator<Item = ColumnMeta>,
        F: FnMut(&mut ColumnDescriptor),
    {
        let mut seen = HashSet::new();
        let columns = metas
            .into_iter()
            .filter(|m| !excluded.contains(&m.name))
            .filter(|m| seen.insert(m.name.clone()))
            .map(|m| {
                let mut column = ColumnDescriptor::from_meta(&m);
                customize(&mut column);
                column
            })
            .collect();
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column key at a sort position.
    pub fn key_at(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(|c| c.name.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn searchable(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| c.searchable)
    }

    pub fn displayed(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| c.displayed)
    }
}
