use crate::core::catalog::ColumnCatalog;
use crate::core::descriptor::{DataTable, TableDescriptor};
use crate::core::catalog::expression_alias;
use crate::core::plan::{quote_ident, PlanBuilder, QueryPlan, SelectItem};
use crate::core::predicate::{apply_limit, apply_order, apply_search};
use crate::core::request::TableRequest;
use crate::core::store::TableStore;
use crate::error::{AppError, AppResult};

/// Compose the catalog's selection with the request's search, order and
/// page bounds, in that sequence.
pub fn build_plan<D, S>(table: &DataTable<D>, store: &S, request: &TableRequest) -> AppResult<QueryPlan>
where
    D: TableDescriptor,
    S: TableStore + ?Sized,
{
    let catalog = table.columns(store)?;
    if catalog.is_empty() {
        return Err(AppError::TableUnavailable(table.table_name().to_string()));
    }

    let mut builder = PlanBuilder::new(table.table_name(), select_items(&catalog));
    apply_search(&catalog, table.search_context(), &request.search, &mut builder);
    apply_order(&catalog, request.order.as_ref(), &mut builder)?;
    apply_limit(&request.page, &mut builder);

    let plan = builder.build();
    tracing::debug!(
        table = plan.table(),
        predicates = plan.predicates().len(),
        ordered = plan.order_by().is_some(),
        offset = ?plan.offset(),
        limit = ?plan.limit(),
        "query plan built"
    );
    Ok(plan)
}

/// Plain column names, or a column's custom expression when it has one.
/// An expression without its own alias is projected under the column key.
pub fn select_items(catalog: &ColumnCatalog) -> Vec<SelectItem> {
    catalog
        .columns()
        .iter()
        .map(|c| match &c.custom_expression {
            Some(expr) if expression_alias(expr).is_some() => SelectItem::Raw(expr.clone()),
            Some(expr) => SelectItem::Raw(format!("{expr} AS {}", quote_ident(&c.name))),
            None => SelectItem::Column(c.name.clone()),
        })
        .collect()
}
