use crate::core::descriptor::{DataTable, TableDescriptor};
use crate::core::planner::build_plan;
use crate::core::request::TableRequest;
use crate::core::store::TableStore;
use crate::core::types::{DebugInfo, ResponseMode, ResponseOptions, ResultPage};
use crate::error::AppResult;

/// Run one request through the pipeline and shape the response.
pub fn fetch_records<D, S>(
    table: &DataTable<D>,
    store: &S,
    request: &TableRequest,
    options: ResponseOptions,
) -> AppResult<ResultPage>
where
    D: TableDescriptor,
    S: TableStore,
{
    let plan = build_plan(table, store, request)?;

    let (rows, records_filtered, records_total) = match options.mode {
        ResponseMode::Simple => (store.select(&plan)?, None, None),
        ResponseMode::Counted => store.snapshot(|s| {
            let rows = s.select(&plan)?;
            let filtered = s.count(&plan.without_bounds())?;
            let total = s.count(&plan.without_bounds().without_filters())?;
            Ok((rows, Some(filtered), Some(total)))
        })?,
    };

    tracing::debug!(
        route = table.route(),
        rows = rows.len(),
        filtered = ?records_filtered,
        total = ?records_total,
        "records fetched"
    );

    Ok(ResultPage {
        rows,
        records_filtered,
        records_total,
        draw: request.draw,
        debug: options.debug.then(|| DebugInfo {
            sql: plan.to_sql().sql,
        }),
    })
}
