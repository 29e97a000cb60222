use std::{
    path::{Path, PathBuf},
    sync::mpsc,
    thread,
};

use rusqlite::{Connection, OpenFlags};
use tokio::sync::oneshot;

use crate::{
    core::store::SqliteStore,
    error::{AppError, AppResult},
};

type Job = Box<dyn FnOnce(&SqliteStore) + Send + 'static>;

/// Handle to a dedicated thread that owns the SQLite connection. Blocking
/// pipeline work is shipped to it as jobs and answered over oneshots.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    tx: mpsc::Sender<Job>,
    pub db_path: PathBuf,
}

impl WorkerHandle {
    pub fn spawn(db_path: &Path, busy_timeout_ms: u64) -> AppResult<Self> {
        let db_path = absolute_path(db_path)?;
        let conn = open_conn(&db_path, busy_timeout_ms)?;
        Ok(Self::with_connection(conn, db_path))
    }

    pub fn with_connection(conn: Connection, db_path: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel::<Job>();
        let store = SqliteStore::new(conn);
        thread::spawn(move || db_worker_main(store, rx));
        Self { tx, db_path }
    }

    pub async fn run<T, F>(&self, f: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteStore) -> AppResult<T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |store: &SqliteStore| {
            let _ = tx.send(f(store));
        });
        self.tx
            .send(job)
            .map_err(|_| AppError::Internal("db worker unavailable".into()))?;
        rx.await
            .map_err(|_| AppError::Internal("db worker dropped response".into()))?
    }
}

fn db_worker_main(store: SqliteStore, rx: mpsc::Receiver<Job>) {
    while let Ok(job) = rx.recv() {
        job(&store);
    }
    tracing::debug!("db worker exiting");
}

fn open_conn(path: &Path, busy_timeout_ms: u64) -> AppResult<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(path, flags).map_err(|source| AppError::DbOpenFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let _ = conn.busy_timeout(std::time::Duration::from_millis(busy_timeout_ms));
    Ok(conn)
}

fn absolute_path(path: &Path) -> AppResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
