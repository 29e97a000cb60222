use rusqlite::{Connection, Row};

use crate::core::types::ColumnMeta;
use crate::error::{AppError, AppResult};

/// Columns of `table` in declaration order. Accepts `table` or `schema.table`.
pub fn list_columns(conn: &Connection, table: &str) -> AppResult<Vec<ColumnMeta>> {
    // PRAGMA arguments are not parameterizable, so the name must be a
    // validated identifier to prevent injection.
    if !is_safe_table_ref(table) {
        return Err(AppError::InvalidRequest(format!(
            "invalid table identifier: {table}"
        )));
    }

    let sql = match table.split_once('.') {
        Some((schema, name)) => format!("PRAGMA {schema}.table_info({name})"),
        None => format!("PRAGMA table_info({table})"),
    };
    let mut stmt = conn.prepare(&sql)?;
    let cols = stmt
        .query_map([], |row: &Row<'_>| {
            let name: String = row.get("name")?;
            let decl_type: Option<String> = row.get("type")?;
            Ok(ColumnMeta {
                name,
                decl_type: decl_type.filter(|t| !t.is_empty()),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(cols)
}

pub(crate) fn is_safe_identifier(s: &str) -> bool {
    // Minimal safe subset: [A-Za-z_][A-Za-z0-9_]*
    let mut chars = s.chars();
    let Some(first) = chars.next() else { return false };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) fn is_safe_table_ref(s: &str) -> bool {
    match s.split_once('.') {
        None => is_safe_identifier(s),
        Some((schema, table)) => is_safe_identifier(schema) && is_safe_identifier(table),
    }
}
