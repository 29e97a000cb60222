use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::catalog::{ColumnCatalog, ColumnDescriptor};
use crate::core::schema;
use crate::core::store::TableStore;
use crate::core::types::SearchContext;
use crate::error::{AppError, AppResult};

/// What an integrator supplies to expose one table.
pub trait TableDescriptor {
    fn table_name(&self) -> &str;

    /// Route the client widget fetches records from.
    fn route(&self) -> &str;

    fn excluded_columns(&self) -> &[String] {
        &[]
    }

    fn search_context(&self) -> SearchContext {
        SearchContext::Where
    }

    /// Adjust an introspected column before it is cached.
    fn customize_column(&self, _column: &mut ColumnDescriptor) {}
}

/// A validated descriptor together with its memoized column catalog.
///
/// Safe to share across concurrent requests; the catalog is introspected
/// once per instance. Two racing first accesses may both introspect, and
/// the first stored result wins.
#[derive(Debug)]
pub struct DataTable<D> {
    descriptor: D,
    excluded: BTreeSet<String>,
    catalog: Mutex<Option<Arc<ColumnCatalog>>>,
}

impl<D: TableDescriptor> DataTable<D> {
    pub fn new(descriptor: D) -> AppResult<Self> {
        let table = descriptor.table_name();
        if !schema::is_safe_table_ref(table) {
            return Err(AppError::InvalidConfig(format!(
                "invalid table identifier: {table}"
            )));
        }
        if descriptor.route().is_empty() {
            return Err(AppError::InvalidConfig(format!("table {table} has an empty route")));
        }

        let mut excluded = BTreeSet::new();
        for name in descriptor.excluded_columns() {
            if name.is_empty() {
                return Err(AppError::InvalidConfig(
                    "exclude_columns must not contain empty names".into(),
                ));
            }
            excluded.insert(name.clone());
        }

        Ok(Self {
            descriptor,
            excluded,
            catalog: Mutex::new(None),
        })
    }

    pub fn descriptor(&self) -> &D {
        &self.descriptor
    }

    pub fn table_name(&self) -> &str {
        self.descriptor.table_name()
    }

    pub fn route(&self) -> &str {
        self.descriptor.route()
    }

    pub fn search_context(&self) -> SearchContext {
        self.descriptor.search_context()
    }

    pub fn excluded(&self) -> &BTreeSet<String> {
        &self.excluded
    }

    pub fn columns<S: TableStore + ?Sized>(&self, store: &S) -> AppResult<Arc<ColumnCatalog>> {
        if let Some(catalog) = self.lock()?.as_ref() {
            return Ok(Arc::clone(catalog));
        }

        // Introspect without holding the lock.
        let metas = store.list_columns(self.table_name())?;
        let catalog = ColumnCatalog::build(metas, &self.excluded, |c| {
            self.descriptor.customize_column(c)
        });
        tracing::debug!(
            table = self.table_name(),
            columns = catalog.len(),
            searchable = catalog.searchable().count(),
            "column catalog loaded"
        );

        let mut guard = self.lock()?;
        Ok(Arc::clone(guard.get_or_insert_with(|| Arc::new(catalog))))
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Option<Arc<ColumnCatalog>>>> {
        self.catalog
            .lock()
            .map_err(|_| AppError::Internal("poisoned lock".into()))
    }
}
