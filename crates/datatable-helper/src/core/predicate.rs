//! Request-driven transformations over a [`PlanBuilder`]. Each is
//! independent of the others; the planner applies them search, order, limit.

use crate::core::catalog::ColumnCatalog;
use crate::core::plan::{PlanBuilder, LIKE};
use crate::core::request::{OrderRequest, PageRequest, SearchRequest};
use crate::core::types::SearchContext;
use crate::error::{AppError, AppResult};

/// OR-combine `column LIKE '%keyword%'` over every searchable column.
/// The keyword is matched as one substring, whitespace included. In the
/// having context the projected name is matched, so aliased expressions
/// are searched by their alias.
pub fn apply_search(
    catalog: &ColumnCatalog,
    context: SearchContext,
    search: &SearchRequest,
    builder: &mut PlanBuilder,
) {
    let Some(keyword) = search.keyword() else {
        return;
    };
    let pattern = format!("%{keyword}%");

    for column in catalog.searchable() {
        match context {
            SearchContext::Where => builder.or_where(&column.name, LIKE, pattern.clone()),
            SearchContext::Having => builder.or_having(&column.projected_name(), LIKE, pattern.clone()),
        };
    }
}

/// Resolve a positional sort request against the catalog keys.
/// Out-of-range positions are rejected, never clamped.
pub fn apply_order(
    catalog: &ColumnCatalog,
    order: Option<&OrderRequest>,
    builder: &mut PlanBuilder,
) -> AppResult<()> {
    let Some(order) = order else {
        return Ok(());
    };
    let column = catalog
        .key_at(order.column_index)
        .ok_or(AppError::OrderColumnOutOfRange {
            index: order.column_index,
            count: catalog.len(),
        })?;
    builder.order_by(column, order.direction);
    Ok(())
}

pub fn apply_limit(page: &PageRequest, builder: &mut PlanBuilder) {
    if let Some(offset) = page.offset {
        builder.offset(offset);
    }
    if let Some(limit) = page.limit {
        builder.limit(limit);
    }
}
