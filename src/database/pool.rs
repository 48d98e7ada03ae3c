//! Fixed-size connection pool over `tokio-rusqlite`
//!
//! Every slot is opened and liveness-probed up front through a [`RetryManager`].
//! A [`PooledConnection`] guard returns its connection to the pool when dropped,
//! so release happens on every exit path of an operation.

use std::ops::Deref;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{Semaphore, SemaphorePermit};
use tokio_rusqlite::Connection;
use tracing::{debug, info};

use crate::error::DbError;
use crate::retry::RetryManager;

/// Busy timeout applied to every pooled connection
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Pool of open SQLite connections
pub struct ConnectionPool {
    idle: Mutex<Vec<Connection>>,
    permits: Semaphore,
    size: usize,
    acquire_timeout: Duration,
}

impl ConnectionPool {
    /// Open `size` connections to `path`, retrying each per `retry`
    ///
    /// Fails with the last `DbError::Connection` once a slot exhausts its budget.
    pub async fn establish(
        path: &str,
        size: usize,
        retry: &RetryManager,
        acquire_timeout: Duration,
    ) -> Result<Self, DbError> {
        let mut connections = Vec::with_capacity(size);

        for slot in 0..size {
            let conn = retry.execute(|| open_connection(path)).await?;
            debug!(slot, "Pooled connection established");
            connections.push(conn);
        }

        info!(
            size,
            attempts = retry.attempts(),
            delay_secs = retry.delay().as_secs(),
            "Connection pool ready"
        );

        Ok(Self {
            idle: Mutex::new(connections),
            permits: Semaphore::new(size),
            size,
            acquire_timeout,
        })
    }

    /// Borrow a connection, waiting at most the configured acquire timeout
    pub async fn acquire(&self) -> Result<PooledConnection<'_>, DbError> {
        let permit = tokio::time::timeout(self.acquire_timeout, self.permits.acquire())
            .await
            .map_err(|_| {
                DbError::PoolTimeout(format!("no connection within {:?}", self.acquire_timeout))
            })?
            .map_err(|_| DbError::Connection("connection pool closed".to_string()))?;

        let conn = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .ok_or_else(|| DbError::Connection("no idle connection".to_string()))?;

        Ok(PooledConnection {
            conn: Some(conn),
            pool: self,
            _permit: permit,
        })
    }

    /// Total number of connections owned by the pool
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of connections not currently borrowed
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    fn release(&self, conn: Connection) {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(conn);
    }
}

/// Scoped loan of a pooled connection
pub struct PooledConnection<'a> {
    conn: Option<Connection>,
    pool: &'a ConnectionPool,
    // Dropped after `drop` has pushed the connection back.
    _permit: SemaphorePermit<'a>,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn
            .as_ref()
            .expect("pooled connection is present until drop")
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}

/// Open one connection and probe it
async fn open_connection(path: &str) -> Result<Connection, DbError> {
    let conn = Connection::open(path)
        .await
        .map_err(|e| DbError::Connection(e.to_string()))?;

    conn.call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get::<_, String>(0))?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
    })
    .await
    .map_err(|e| DbError::Connection(e.to_string()))?;

    Ok(conn)
}
