use std::path::PathBuf;

use clap::Parser;

use crate::config::{ConfiguredTable, TableRegistry};
use crate::core::types::{ResponseMode, ResponseOptions, SearchContext};
use crate::error::{AppError, AppResult};

#[derive(Parser, Debug, Clone)]
#[command(name = "datatable-helper")]
pub struct Args {
    /// SQLite database file to serve (opened read-only).
    #[arg(long)]
    pub db: PathBuf,

    /// JSON table registry: {"tables": [{"table": .., "route": .., ...}]}
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Serve a single table without a config file.
    #[arg(long, conflicts_with = "config")]
    pub table: Option<String>,

    /// Route for --table (defaults to the table name).
    #[arg(long, requires = "table")]
    pub route: Option<String>,

    /// Column to hide from --table (repeatable).
    #[arg(long, requires = "table")]
    pub exclude: Vec<String>,

    /// How search predicates are combined for --table.
    #[arg(long, value_enum, default_value_t = SearchContext::Where)]
    pub search_context: SearchContext,

    /// Response shape: counted (rows + counts) or simple (rows only).
    #[arg(long, value_enum, default_value_t = ResponseMode::Counted)]
    pub response_mode: ResponseMode,

    /// Attach rendered SQL to responses. Never enable for end users.
    #[arg(long, env = "APP_DEBUG")]
    pub debug: bool,

    /// Logging level (stderr). Also supports RUST_LOG.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// SQLite busy timeout.
    #[arg(long, default_value_t = 2_000)]
    pub busy_timeout_ms: u64,
}

impl Args {
    pub fn response_options(&self) -> ResponseOptions {
        ResponseOptions {
            mode: self.response_mode,
            debug: self.debug,
        }
    }

    pub fn registry(&self) -> AppResult<TableRegistry> {
        if let Some(path) = &self.config {
            return TableRegistry::load(path);
        }
        let Some(table) = &self.table else {
            return Err(AppError::InvalidConfig(
                "either --config or --table is required".into(),
            ));
        };

        let mut descriptor = ConfiguredTable::new(table, self.route.as_deref().unwrap_or(table));
        descriptor.exclude_columns = self.exclude.clone();
        descriptor.search_context = self.search_context;

        let mut registry = TableRegistry::default();
        registry.insert(descriptor)?;
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_table_flags() {
        let args = Args::try_parse_from([
            "datatable-helper",
            "--db",
            "app.sqlite",
            "--table",
            "people",
            "--exclude",
            "password",
            "--exclude",
            "token",
            "--search-context",
            "having",
            "--response-mode",
            "simple",
        ])
        .unwrap();
        let registry = args.registry().unwrap();
        let table = registry.get("people").unwrap();
        assert_eq!(table.excluded().len(), 2);
        assert_eq!(table.search_context(), SearchContext::Having);
        assert_eq!(args.response_options().mode, ResponseMode::Simple);
    }

    #[test]
    fn requires_a_table_source() {
        let args = Args::try_parse_from(["datatable-helper", "--db", "app.sqlite"]).unwrap();
        assert!(matches!(args.registry(), Err(AppError::InvalidConfig(_))));
    }
}
