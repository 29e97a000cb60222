use std::fmt;

use serde::Serialize;

use crate::core::types::{SearchContext, SortDirection};

pub const LIKE: &str = "LIKE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum SelectItem {
    Column(String),
    /// Raw SQL expression, emitted verbatim.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchPredicate {
    pub context: SearchContext,
    pub column: String,
    pub operator: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

/// SQL text plus positional parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSql {
    pub sql: String,
    pub params: Vec<String>,
}

/// Fully composed select/filter/sort/page over one table. Immutable once
/// built; derive variants with `without_bounds` / `without_filters`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryPlan {
    table: String,
    select: Vec<SelectItem>,
    predicates: Vec<SearchPredicate>,
    order_by: Option<OrderBy>,
    offset: Option<u64>,
    limit: Option<u64>,
}

impl QueryPlan {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn select(&self) -> &[SelectItem] {
        &self.select
    }

    pub fn predicates(&self) -> &[SearchPredicate] {
        &self.predicates
    }

    pub fn order_by(&self) -> Option<&OrderBy> {
        self.order_by.as_ref()
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Same plan with order, offset and limit dropped.
    pub fn without_bounds(&self) -> QueryPlan {
        QueryPlan {
            order_by: None,
            offset: None,
            limit: None,
            ..self.clone()
        }
    }

    /// Same plan with search predicates dropped.
    pub fn without_filters(&self) -> QueryPlan {
        QueryPlan {
            predicates: Vec::new(),
            ..self.clone()
        }
    }

    pub fn to_sql(&self) -> RenderedSql {
        let mut params = Vec::new();
        let mut sql = self.render_filtered(&mut params);

        if let Some(order) = &self.order_by {
            sql.push_str(&format!(
                " ORDER BY {} {}",
                quote_ident(&order.column),
                order.direction.as_sql()
            ));
        }

        // SQLite only accepts OFFSET after a LIMIT clause.
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }

        RenderedSql { sql, params }
    }

    /// Row count matching the filters, ignoring order and bounds.
    pub fn count_sql(&self) -> RenderedSql {
        let mut params = Vec::new();
        let inner = self.render_filtered(&mut params);
        RenderedSql {
            sql: format!("SELECT COUNT(*) FROM ({inner})"),
            params,
        }
    }

    fn render_filtered(&self, params: &mut Vec<String>) -> String {
        let columns = self
            .select
            .iter()
            .map(|item| match item {
                SelectItem::Column(name) => quote_ident(name),
                SelectItem::Raw(expr) => expr.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("SELECT {columns} FROM {}", self.table);

        if let Some(clause) = self.render_predicates(SearchContext::Where, params) {
            sql.push_str(&format!(" WHERE {clause}"));
        }

        // HAVING filters the projected rows, so computed aliases are visible.
        if let Some(clause) = self.render_predicates(SearchContext::Having, params) {
            sql = format!("SELECT * FROM ({sql}) WHERE {clause}");
        }

        sql
    }

    fn render_predicates(&self, context: SearchContext, params: &mut Vec<String>) -> Option<String> {
        let parts: Vec<String> = self
            .predicates
            .iter()
            .filter(|p| p.context == context)
            .map(|p| {
                params.push(p.value.clone());
                format!("{} {} ?", quote_ident(&p.column), p.operator)
            })
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(format!("({})", parts.join(" OR ")))
        }
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql().sql)
    }
}

/// Mutable accumulator the predicate builders write into.
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    plan: QueryPlan,
}

impl PlanBuilder {
    pub fn new(table: impl Into<String>, select: Vec<SelectItem>) -> Self {
        Self {
            plan: QueryPlan {
                table: table.into(),
                select,
                predicates: Vec::new(),
                order_by: None,
                offset: None,
                limit: None,
            },
        }
    }

    pub fn or_where(&mut self, column: &str, operator: &'static str, value: String) -> &mut Self {
        self.push_predicate(SearchContext::Where, column, operator, value)
    }

    pub fn or_having(&mut self, column: &str, operator: &'static str, value: String) -> &mut Self {
        self.push_predicate(SearchContext::Having, column, operator, value)
    }

    pub fn order_by(&mut self, column: &str, direction: SortDirection) -> &mut Self {
        self.plan.order_by = Some(OrderBy {
            column: column.to_string(),
            direction,
        });
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.plan.offset = Some(offset);
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.plan.limit = Some(limit);
        self
    }

    pub fn build(self) -> QueryPlan {
        self.plan
    }

    fn push_predicate(
        &mut self,
        context: SearchContext,
        column: &str,
        operator: &'static str,
        value: String,
    ) -> &mut Self {
        self.plan.predicates.push(SearchPredicate {
            context,
            column: column.to_string(),
            operator,
            value,
        });
        self
    }
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
