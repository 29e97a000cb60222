use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::core::catalog::ColumnDescriptor;
use crate::core::descriptor::{DataTable, TableDescriptor};
use crate::core::store::TableStore;
use crate::core::types::SearchContext;
use crate::error::{AppError, AppResult};

/// Per-column adjustments applied on top of introspection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnOverride {
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub searchable: Option<bool>,
    #[serde(default)]
    pub display: Option<bool>,
    #[serde(default)]
    pub sql: Option<String>,
}

/// A descriptor driven by configuration rather than code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfiguredTable {
    pub table: String,
    pub route: String,
    pub exclude_columns: Vec<String>,
    pub search_context: SearchContext,
    pub columns: HashMap<String, ColumnOverride>,
}

impl ConfiguredTable {
    pub fn new(table: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            route: route.into(),
            exclude_columns: Vec::new(),
            search_context: SearchContext::Where,
            columns: HashMap::new(),
        }
    }

    /// Parse one table entry. `exclude_columns` is checked from the raw
    /// JSON so a malformed list fails here, never at request time.
    pub fn from_value(v: &Value) -> AppResult<Self> {
        let obj = v
            .as_object()
            .ok_or_else(|| AppError::InvalidConfig("table entry must be an object".into()))?;

        let table = obj
            .get("table")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::InvalidConfig("table entry missing string field: table".into()))?;
        let route = match obj.get("route") {
            None | Some(Value::Null) => table,
            Some(Value::String(r)) => r.as_str(),
            Some(_) => return Err(AppError::InvalidConfig("route must be a string".into())),
        };

        let mut out = ConfiguredTable::new(table, route);
        if let Some(v) = obj.get("exclude_columns") {
            out.exclude_columns = exclude_columns_from_value(v)?;
        }
        if let Some(v) = obj.get("search_context") {
            out.search_context = serde_json::from_value(v.clone())
                .map_err(|e| AppError::InvalidConfig(format!("search_context: {e}")))?;
        }
        if let Some(v) = obj.get("columns") {
            out.columns = serde_json::from_value(v.clone())
                .map_err(|e| AppError::InvalidConfig(format!("columns: {e}")))?;
        }
        Ok(out)
    }
}

impl TableDescriptor for ConfiguredTable {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn route(&self) -> &str {
        &self.route
    }

    fn excluded_columns(&self) -> &[String] {
        &self.exclude_columns
    }

    fn search_context(&self) -> SearchContext {
        self.search_context
    }

    fn customize_column(&self, column: &mut ColumnDescriptor) {
        let Some(o) = self.columns.get(&column.name) else {
            return;
        };
        if let Some(caption) = &o.caption {
            column.caption = caption.clone();
        }
        if let Some(searchable) = o.searchable {
            column.searchable = searchable;
        }
        if let Some(display) = o.display {
            column.displayed = display;
        }
        if let Some(sql) = &o.sql {
            column.custom_expression = Some(sql.clone());
        }
    }
}

pub fn exclude_columns_from_value(v: &Value) -> AppResult<Vec<String>> {
    let arr = v
        .as_array()
        .ok_or_else(|| AppError::InvalidConfig("exclude_columns must be an array".into()))?;
    arr.iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                AppError::InvalidConfig("exclude_columns must be an array of strings".into())
            })
        })
        .collect()
}

/// Configured tables keyed by route. Clones share the same tables and
/// therefore the same catalog caches.
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: BTreeMap<String, Arc<DataTable<ConfiguredTable>>>,
}

impl TableRegistry {
    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let v: Value = serde_json::from_str(&raw)?;
        Self::from_value(&v)
    }

    /// `{"tables": [ {...}, ... ]}`
    pub fn from_value(v: &Value) -> AppResult<Self> {
        let tables = v
            .get("tables")
            .and_then(Value::as_array)
            .ok_or_else(|| AppError::InvalidConfig("config must contain a tables array".into()))?;

        let mut registry = TableRegistry::default();
        for entry in tables {
            registry.insert(ConfiguredTable::from_value(entry)?)?;
        }
        Ok(registry)
    }

    pub fn insert(&mut self, descriptor: ConfiguredTable) -> AppResult<()> {
        let table = DataTable::new(descriptor)?;
        let route = table.route().to_string();
        if self.tables.contains_key(&route) {
            return Err(AppError::InvalidConfig(format!("duplicate route: {route}")));
        }
        tracing::info!(route = %route, table = table.table_name(), "table registered");
        self.tables.insert(route, Arc::new(table));
        Ok(())
    }

    pub fn get(&self, route: &str) -> AppResult<Arc<DataTable<ConfiguredTable>>> {
        self.tables
            .get(route)
            .cloned()
            .ok_or_else(|| AppError::InvalidRequest(format!("unknown route: {route}")))
    }

    pub fn routes(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    /// Load every catalog up front. A table that is missing or has no
    /// visible columns is a configuration error.
    pub fn validate<S: TableStore + ?Sized>(&self, store: &S) -> AppResult<()> {
        for (route, table) in &self.tables {
            let catalog = table.columns(store)?;
            if catalog.is_empty() {
                return Err(AppError::InvalidConfig(format!(
                    "route {route}: table {} has no visible columns",
                    table.table_name()
                )));
            }
        }
        Ok(())
    }
}
