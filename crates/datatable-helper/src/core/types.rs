use serde::{Deserialize, Serialize};

/// A column as reported by the store, before exclusion and classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    #[serde(default)]
    pub decl_type: Option<String>,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, decl_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            decl_type: Some(decl_type.into()),
        }
    }
}

pub type DbRow = std::collections::HashMap<String, serde_json::Value>;

/// Boolean context used to OR-combine search predicates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SearchContext {
    #[default]
    Where,
    Having,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Some(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(SortDirection::Desc)
        } else {
            None
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Which response shape the assembler produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Rows plus `recordsFiltered` / `recordsTotal`.
    #[default]
    Counted,
    /// Rows only (legacy clients).
    Simple,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseOptions {
    pub mode: ResponseMode,
    /// Attach the rendered SQL to the response. Diagnostics only.
    pub debug: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DebugInfo {
    pub sql: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResultPage {
    #[serde(rename = "data")]
    pub rows: Vec<DbRow>,
    #[serde(rename = "recordsFiltered", skip_serializing_if = "Option::is_none")]
    pub records_filtered: Option<u64>,
    #[serde(rename = "recordsTotal", skip_serializing_if = "Option::is_none")]
    pub records_total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draw: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}
