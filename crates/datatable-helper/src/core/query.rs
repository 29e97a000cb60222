use std::collections::HashMap;

use base64::Engine;
use rusqlite::{params_from_iter, types::ValueRef, Connection, Row};

use crate::core::plan::RenderedSql;
use crate::core::types::DbRow;
use crate::error::AppResult;

pub fn run_select(conn: &Connection, rendered: &RenderedSql) -> AppResult<Vec<DbRow>> {
    tracing::trace!(sql = %rendered.sql, params = rendered.params.len(), "select");
    let mut stmt = conn.prepare(&rendered.sql)?;
    let col_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

    let mut rows = Vec::new();
    let mut r = stmt.query(params_from_iter(rendered.params.iter()))?;
    while let Some(row) = r.next()? {
        rows.push(row_to_json_object(row, &col_names)?);
    }
    Ok(rows)
}

pub fn run_count(conn: &Connection, rendered: &RenderedSql) -> AppResult<u64> {
    tracing::trace!(sql = %rendered.sql, params = rendered.params.len(), "count");
    let n: i64 = conn.query_row(
        &rendered.sql,
        params_from_iter(rendered.params.iter()),
        |row| row.get(0),
    )?;
    Ok(n.max(0) as u64)
}

fn row_to_json_object(row: &Row<'_>, col_names: &[String]) -> AppResult<DbRow> {
    let mut out = HashMap::with_capacity(col_names.len());
    for (i, name) in col_names.iter().enumerate() {
        let v = match row.get_ref(i)? {
            ValueRef::Null => serde_json::Value::Null,
            ValueRef::Integer(x) => serde_json::Value::from(x),
            ValueRef::Real(x) => serde_json::Value::from(x),
            ValueRef::Text(t) => serde_json::Value::from(String::from_utf8_lossy(t).to_string()),
            ValueRef::Blob(b) => serde_json::json!({
                "$type": "blob",
                "base64": base64::engine::general_purpose::STANDARD.encode(b),
                "size": b.len()
            }),
        };
        out.insert(name.clone(), v);
    }
    Ok(out)
}
