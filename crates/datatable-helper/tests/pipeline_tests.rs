use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use datatable_helper::config::ColumnOverride;
use datatable_helper::core::markup::{render_markup, MarkupOptions, WIDGET_CLASS};
use datatable_helper::core::plan::QueryPlan;
use datatable_helper::core::planner::build_plan;
use datatable_helper::core::types::{ColumnMeta, DbRow, SortDirection};
use datatable_helper::{
    fetch_records, AppError, AppResult, ConfiguredTable, DataTable, ResponseMode, ResponseOptions,
    SearchContext, SqliteStore, TableDescriptor, TableRequest, TableStore,
};
use rusqlite::Connection;

fn people_store() -> SqliteStore {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE people (
            id INTEGER PRIMARY KEY,
            name VARCHAR(64) NOT NULL,
            bio TEXT,
            born DATETIME,
            secret TEXT
        );",
    )
    .unwrap();
    for i in 1..=100 {
        let bio = if i % 14 == 0 { "likes zebras" } else { "plain" };
        conn.execute(
            "INSERT INTO people (id, name, bio, born, secret) VALUES (?1, ?2, ?3, '2020-01-01', 'hunter2')",
            rusqlite::params![i, format!("person-{i:03}"), bio],
        )
        .unwrap();
    }
    SqliteStore::new(conn)
}

fn people_table() -> DataTable<ConfiguredTable> {
    let mut t = ConfiguredTable::new("people", "/people");
    t.exclude_columns = vec!["secret".into()];
    DataTable::new(t).unwrap()
}

fn counted() -> ResponseOptions {
    ResponseOptions {
        mode: ResponseMode::Counted,
        debug: false,
    }
}

struct CountingStore {
    inner: SqliteStore,
    list_calls: AtomicUsize,
}

impl TableStore for CountingStore {
    fn list_columns(&self, table: &str) -> AppResult<Vec<ColumnMeta>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_columns(table)
    }

    fn select(&self, plan: &QueryPlan) -> AppResult<Vec<DbRow>> {
        self.inner.select(plan)
    }

    fn count(&self, plan: &QueryPlan) -> AppResult<u64> {
        self.inner.count(plan)
    }
}

struct People;

impl TableDescriptor for People {
    fn table_name(&self) -> &str {
        "people"
    }

    fn route(&self) -> &str {
        "/people"
    }
}

#[test]
fn catalog_is_introspected_once_per_instance() {
    let store = CountingStore {
        inner: people_store(),
        list_calls: AtomicUsize::new(0),
    };
    let table = people_table();

    let first = table.columns(&store).unwrap();
    let second = table.columns(&store).unwrap();
    fetch_records(&table, &store, &TableRequest::default().with_keyword("x"), counted()).unwrap();

    assert_eq!(store.list_calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
    assert!(first.get("secret").is_none());

    // A new instance introspects again.
    let other = DataTable::new(People).unwrap();
    let all = other.columns(&store).unwrap();
    assert_eq!(store.list_calls.load(Ordering::SeqCst), 2);
    assert!(all.get("secret").is_some());
}

/// Fixed schema, slow introspection. Shareable across threads.
struct SlowStore {
    list_calls: AtomicUsize,
}

impl TableStore for SlowStore {
    fn list_columns(&self, _table: &str) -> AppResult<Vec<ColumnMeta>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        Ok(vec![
            ColumnMeta::new("id", "INTEGER"),
            ColumnMeta::new("name", "TEXT"),
            ColumnMeta::new("secret", "TEXT"),
        ])
    }

    fn select(&self, _plan: &QueryPlan) -> AppResult<Vec<DbRow>> {
        Err(AppError::Internal("not used".into()))
    }

    fn count(&self, _plan: &QueryPlan) -> AppResult<u64> {
        Err(AppError::Internal("not used".into()))
    }
}

#[test]
fn concurrent_first_access_shares_one_catalog() {
    const THREADS: usize = 8;
    let store = SlowStore {
        list_calls: AtomicUsize::new(0),
    };
    let table = people_table();
    let barrier = Barrier::new(THREADS);

    let seen: Vec<_> = thread::scope(|s| {
        let mut handles = Vec::new();
        for _ in 0..THREADS {
            let (table, store, barrier) = (&table, &store, &barrier);
            handles.push(s.spawn(move || {
                barrier.wait();
                table.columns(store).unwrap()
            }));
        }
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let stored = table.columns(&store).unwrap();
    assert!(seen.iter().all(|c| Arc::ptr_eq(c, &stored)));
    let keys: Vec<&str> = stored.keys().collect();
    assert_eq!(keys, vec!["id", "name"]);

    let calls = store.list_calls.load(Ordering::SeqCst);
    assert!((1..=THREADS).contains(&calls));
    for _ in 0..3 {
        table.columns(&store).unwrap();
    }
    assert_eq!(store.list_calls.load(Ordering::SeqCst), calls);
}

#[test]
fn excluded_columns_never_reach_rows() {
    let store = people_store();
    let page = fetch_records(&people_table(), &store, &TableRequest::default(), counted()).unwrap();
    assert_eq!(page.rows.len(), 100);
    assert!(page.rows.iter().all(|r| !r.contains_key("secret")));
    assert!(page.rows[0].contains_key("born"));
}

#[test]
fn counted_page_reports_filtered_and_total() {
    let store = people_store();
    let req = TableRequest::default()
        .with_keyword("zebra")
        .with_page(Some(0), Some(5));

    let page = fetch_records(&people_table(), &store, &req, counted()).unwrap();

    assert_eq!(page.rows.len(), 5);
    assert_eq!(page.records_filtered, Some(7));
    assert_eq!(page.records_total, Some(100));
    assert!(page.debug.is_none());
}

#[test]
fn simple_mode_returns_rows_only() {
    let store = people_store();
    let req = TableRequest::default().with_keyword("zebra");
    let options = ResponseOptions {
        mode: ResponseMode::Simple,
        debug: false,
    };

    let page = fetch_records(&people_table(), &store, &req, options).unwrap();
    assert_eq!(page.rows.len(), 7);
    assert_eq!(page.records_filtered, None);

    let wire = serde_json::to_value(&page).unwrap();
    assert!(wire.get("data").is_some());
    assert!(wire.get("recordsFiltered").is_none());
    assert!(wire.get("recordsTotal").is_none());
    assert!(wire.get("debug").is_none());
}

#[test]
fn counted_wire_shape() {
    let store = people_store();
    let mut req = TableRequest::default().with_page(None, Some(2));
    req.draw = Some(9);
    let page = fetch_records(&people_table(), &store, &req, counted()).unwrap();
    let wire = serde_json::to_value(&page).unwrap();
    assert_eq!(wire["recordsFiltered"], 100);
    assert_eq!(wire["recordsTotal"], 100);
    assert_eq!(wire["draw"], 9);
    assert_eq!(wire["data"].as_array().unwrap().len(), 2);
}

#[test]
fn orders_by_position_descending() {
    let store = people_store();
    let req = TableRequest::default()
        .with_order(1, SortDirection::Desc)
        .with_page(None, Some(3));
    let plan = build_plan(&people_table(), &store, &req).unwrap();
    assert!(plan.to_sql().sql.contains(r#"ORDER BY "name" DESC"#));

    let page = fetch_records(&people_table(), &store, &req, counted()).unwrap();
    let names: Vec<&str> = page.rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["person-100", "person-099", "person-098"]);
}

#[test]
fn out_of_range_order_is_rejected() {
    let store = people_store();
    let req = TableRequest::default().with_order(4, SortDirection::Asc);
    let err = fetch_records(&people_table(), &store, &req, counted()).unwrap_err();
    assert!(matches!(err, AppError::OrderColumnOutOfRange { index: 4, count: 4 }));
    assert_eq!(err.code(), "ORDER_OUT_OF_RANGE");
}

#[test]
fn page_bounds_apply_after_order() {
    let store = people_store();
    let req = TableRequest::default()
        .with_order(0, SortDirection::Asc)
        .with_page(Some(20), Some(10));
    let plan = build_plan(&people_table(), &store, &req).unwrap();
    assert_eq!((plan.offset(), plan.limit()), (Some(20), Some(10)));

    let page = fetch_records(&people_table(), &store, &req, counted()).unwrap();
    let ids: Vec<i64> = page.rows.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, (21..=30).collect::<Vec<_>>());
    assert_eq!(page.records_filtered, Some(100));
}

#[test]
fn debug_attaches_sql_without_values() {
    let store = people_store();
    let req = TableRequest::default().with_keyword("zebra");
    let options = ResponseOptions {
        mode: ResponseMode::Counted,
        debug: true,
    };
    let page = fetch_records(&people_table(), &store, &req, options).unwrap();
    let sql = page.debug.unwrap().sql;
    assert!(sql.contains(r#""bio" LIKE ?"#));
    assert!(!sql.contains("zebra"));
}

#[test]
fn having_context_searches_computed_columns() {
    let store = people_store();
    let mut t = ConfiguredTable::new("people", "/people");
    t.exclude_columns = vec!["secret".into()];
    t.search_context = SearchContext::Having;
    t.columns.insert(
        "name".into(),
        ColumnOverride {
            sql: Some("upper(name) AS name".into()),
            ..Default::default()
        },
    );
    let table = DataTable::new(t).unwrap();

    let req = TableRequest::default().with_keyword("PERSON-00");
    let page = fetch_records(&table, &store, &req, counted()).unwrap();
    assert_eq!(page.records_filtered, Some(9));
    assert_eq!(page.records_total, Some(100));
    assert!(page
        .rows
        .iter()
        .all(|r| r["name"].as_str().unwrap().starts_with("PERSON-00")));
}

fn having_table(expr: &str) -> DataTable<ConfiguredTable> {
    let mut t = ConfiguredTable::new("people", "/people");
    t.exclude_columns = vec!["secret".into()];
    t.search_context = SearchContext::Having;
    t.columns.insert(
        "name".into(),
        ColumnOverride {
            sql: Some(expr.into()),
            ..Default::default()
        },
    );
    DataTable::new(t).unwrap()
}

#[test]
fn having_context_searches_by_expression_alias() {
    let store = people_store();
    let table = having_table("upper(name) AS shout");

    // "am" appears in the key "name" but in no projected value.
    let req = TableRequest::default().with_keyword("am");
    let page = fetch_records(&table, &store, &req, counted()).unwrap();
    assert_eq!(page.records_filtered, Some(0));
    assert!(page.rows.is_empty());

    let req = TableRequest::default().with_keyword("PERSON-00");
    let options = ResponseOptions {
        mode: ResponseMode::Counted,
        debug: true,
    };
    let page = fetch_records(&table, &store, &req, options).unwrap();
    assert_eq!(page.records_filtered, Some(9));
    assert!(page
        .rows
        .iter()
        .all(|r| r["shout"].as_str().unwrap().starts_with("PERSON-00")));
    let sql = page.debug.unwrap().sql;
    assert!(sql.contains(r#""shout" LIKE ?"#));
    assert!(!sql.contains(r#""name" LIKE ?"#));
}

#[test]
fn unaliased_expressions_are_projected_under_the_key() {
    let store = people_store();
    let table = having_table("upper(name)");

    let req = TableRequest::default().with_keyword("PERSON-00");
    let page = fetch_records(&table, &store, &req, counted()).unwrap();
    assert_eq!(page.records_filtered, Some(9));
    assert!(page
        .rows
        .iter()
        .all(|r| r["name"].as_str().unwrap().starts_with("PERSON-00")));

    let req = TableRequest::default().with_keyword("am");
    let page = fetch_records(&table, &store, &req, counted()).unwrap();
    assert_eq!(page.records_filtered, Some(0));
}

#[test]
fn store_failures_are_query_errors_without_sql() {
    let store = people_store();
    let mut t = ConfiguredTable::new("people", "/people");
    t.columns.insert(
        "name".into(),
        ColumnOverride {
            sql: Some("no_such_column AS name".into()),
            ..Default::default()
        },
    );
    let table = DataTable::new(t).unwrap();

    let err = fetch_records(&table, &store, &TableRequest::default(), counted()).unwrap_err();
    assert!(matches!(err, AppError::QueryFailed(_)));
    assert!(!err.to_string().contains("SELECT"));
}

#[test]
fn missing_table_is_unavailable_at_request_time() {
    let store = people_store();
    let table = DataTable::new(ConfiguredTable::new("ghosts", "/ghosts")).unwrap();
    let err = fetch_records(&table, &store, &TableRequest::default(), counted()).unwrap_err();
    assert!(matches!(&err, AppError::TableUnavailable(t) if t == "ghosts"));
    assert_eq!(err.code(), "TABLE_UNAVAILABLE");
}

#[test]
fn markup_lists_displayed_columns() {
    let store = people_store();
    let mut t = ConfiguredTable::new("people", "/people?x=1&y=2");
    t.exclude_columns = vec!["secret".into()];
    t.columns.insert(
        "bio".into(),
        ColumnOverride {
            display: Some(false),
            ..Default::default()
        },
    );
    t.columns.insert(
        "name".into(),
        ColumnOverride {
            caption: Some("Full <name>".into()),
            ..Default::default()
        },
    );
    let table = DataTable::new(t).unwrap();

    let html = render_markup(&table, &store, MarkupOptions::default()).unwrap();
    assert!(html.starts_with(r#"<table class="perry-rylance-datatable" data-route="/people?x=1&amp;y=2">"#));
    assert_eq!(WIDGET_CLASS, "perry-rylance-datatable");
    assert!(html.contains(
        r#"<th data-column-field="name" data-column-type="VARCHAR(64)">Full &lt;name&gt;</th>"#
    ));
    assert!(html.contains(r#"data-column-field="born""#));
    assert!(!html.contains("bio"));
    assert!(!html.contains("secret"));
    assert!(!html.contains("data-auto-initialize"));

    let html = render_markup(
        &table,
        &store,
        MarkupOptions {
            auto_initialize: false,
        },
    )
    .unwrap();
    assert!(html.contains(r#"data-auto-initialize="false""#));
}
