use std::collections::BTreeMap;

use serde::Deserialize;

use crate::core::types::SortDirection;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pub keyword: Option<String>,
}

impl SearchRequest {
    /// The keyword to match, or `None` when absent or empty.
    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref().filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderRequest {
    pub column_index: usize,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

/// A decoded table request: search keyword, single-column order and page bounds.
///
/// Deserializes from either order format the client widget has used:
/// `"order": [{"column": 1, "dir": "desc"}]` or a bare `"order": 1`
/// (ascending).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawRequest")]
pub struct TableRequest {
    pub search: SearchRequest,
    pub order: Option<OrderRequest>,
    pub page: PageRequest,
    /// Client request counter, echoed back untouched.
    pub draw: Option<u64>,
}

impl TableRequest {
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.search.keyword = Some(keyword.into());
        self
    }

    pub fn with_order(mut self, column_index: usize, direction: SortDirection) -> Self {
        self.order = Some(OrderRequest {
            column_index,
            direction,
        });
        self
    }

    pub fn with_page(mut self, offset: Option<u64>, limit: Option<u64>) -> Self {
        self.page = PageRequest { offset, limit };
        self
    }

    /// Parse already-decoded form fields as sent by the client widget
    /// (`search[value]`, `order[0][column]`, `order[0][dir]`, `start`,
    /// `length`, `draw`, or a bare `order`). Unknown fields are ignored.
    pub fn from_form<I, K, V>(fields: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut req = TableRequest::default();
        let mut entries: BTreeMap<usize, (Option<usize>, Option<String>)> = BTreeMap::new();
        let mut bare_order = None;
        let mut length = None;

        for (k, v) in fields {
            let (key, value) = (k.as_ref(), v.as_ref());
            match key {
                "draw" => req.draw = parse_opt_u64(key, value)?,
                "start" => req.page.offset = parse_opt_u64(key, value)?,
                "length" => length = parse_opt_i64(key, value)?,
                "search[value]" => req.search.keyword = Some(value.to_string()),
                "order" => bare_order = Some(parse_usize(key, value)?),
                _ => {
                    let Some((idx, field)) = parse_order_key(key) else {
                        continue;
                    };
                    let entry = entries.entry(idx).or_default();
                    match field {
                        "column" => entry.0 = Some(parse_usize(key, value)?),
                        "dir" => entry.1 = Some(value.to_string()),
                        _ => {}
                    }
                }
            }
        }

        req.page.limit = length_to_limit(length)?;

        // Only the first sort entry is honoured.
        if let Some((_, (column, dir))) = entries.into_iter().next() {
            let column = column
                .ok_or_else(|| AppError::InvalidRequest("order entry without column".into()))?;
            req.order = Some(order_request(column, dir.as_deref())?);
        } else if let Some(column) = bare_order {
            req.order = Some(OrderRequest {
                column_index: column,
                direction: SortDirection::Asc,
            });
        }

        Ok(req)
    }
}

#[derive(Debug, Deserialize)]
struct RawRequest {
    #[serde(default)]
    draw: Option<u64>,
    #[serde(default)]
    search: Option<RawSearch>,
    #[serde(default)]
    order: Option<RawOrder>,
    #[serde(default)]
    start: Option<u64>,
    #[serde(default)]
    length: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawSearch {
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawOrder {
    Index(usize),
    Entries(Vec<RawOrderEntry>),
}

#[derive(Debug, Deserialize)]
struct RawOrderEntry {
    column: usize,
    #[serde(default)]
    dir: Option<String>,
}

impl TryFrom<RawRequest> for TableRequest {
    type Error = AppError;

    fn try_from(raw: RawRequest) -> AppResult<Self> {
        let order = match raw.order {
            None => None,
            Some(RawOrder::Index(column)) => Some(OrderRequest {
                column_index: column,
                direction: SortDirection::Asc,
            }),
            Some(RawOrder::Entries(entries)) => match entries.into_iter().next() {
                Some(first) => Some(order_request(first.column, first.dir.as_deref())?),
                None => None,
            },
        };

        Ok(TableRequest {
            search: SearchRequest {
                keyword: raw.search.and_then(|s| s.value),
            },
            order,
            page: PageRequest {
                offset: raw.start,
                limit: length_to_limit(raw.length)?,
            },
            draw: raw.draw,
        })
    }
}

fn order_request(column: usize, dir: Option<&str>) -> AppResult<OrderRequest> {
    let direction = match dir {
        None => SortDirection::Asc,
        Some(d) => SortDirection::parse(d)
            .ok_or_else(|| AppError::InvalidRequest(format!("invalid sort direction: {d}")))?,
    };
    Ok(OrderRequest {
        column_index: column,
        direction,
    })
}

/// `-1` is the widget's "show all"; any other negative length is rejected.
fn length_to_limit(length: Option<i64>) -> AppResult<Option<u64>> {
    match length {
        None | Some(-1) => Ok(None),
        Some(n) if n < 0 => Err(AppError::InvalidRequest(format!("invalid length: {n}"))),
        Some(n) => Ok(Some(n as u64)),
    }
}

/// `order[3][dir]` -> `(3, "dir")`
fn parse_order_key(key: &str) -> Option<(usize, &str)> {
    let rest = key.strip_prefix("order[")?;
    let (idx, rest) = rest.split_once("][")?;
    let field = rest.strip_suffix(']')?;
    Some((idx.parse().ok()?, field))
}

fn parse_usize(key: &str, value: &str) -> AppResult<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidRequest(format!("{key} must be an unsigned integer")))
}

fn parse_opt_u64(key: &str, value: &str) -> AppResult<Option<u64>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| AppError::InvalidRequest(format!("{key} must be an unsigned integer")))
}

fn parse_opt_i64(key: &str, value: &str) -> AppResult<Option<i64>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| AppError::InvalidRequest(format!("{key} must be an integer")))
}
