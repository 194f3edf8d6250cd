use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use super::{
    latest_about_value, now_millis, record_key, storage_error, AboutIndex, FriendsGraph, LogStore,
    LogWriter,
};
use crate::constants::content_types;
use crate::error::{QueryError, QueryResult};
use crate::models::{Content, LogRecord, RecordValue, Tombstones, TrustGraph};
use crate::query::{Field, Predicate, Query, RecordStream, Scalar};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        key TEXT NOT NULL UNIQUE,
        author TEXT NOT NULL,
        sequence INTEGER NOT NULL,
        timestamp INTEGER NOT NULL,
        private INTEGER NOT NULL,
        content_type TEXT NOT NULL,
        body TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS records_by_time ON records (timestamp, id);
    CREATE INDEX IF NOT EXISTS records_by_type ON records (content_type, timestamp);
    CREATE INDEX IF NOT EXISTS records_by_author ON records (author, timestamp);
"#;

/// Log persisted as JSON rows in a single SQLite table.
///
/// Reads run page by page on the blocking pool. Author, type and privacy
/// conditions narrow the SQL scan; the full predicate is then evaluated in
/// Rust so matching semantics are identical to [`super::MemoryLog`].
#[derive(Clone)]
pub struct SqliteLog {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLog {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open log database: {}", path.display()))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize log schema")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Imports already-keyed records in one transaction, skipping known keys.
    /// Returns how many were new.
    pub fn insert_records(&self, records: &[LogRecord]) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO records
                 (key, author, sequence, timestamp, private, content_type, body)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for record in records {
                let body = serde_json::to_string(record)?;
                inserted += stmt.execute(params![
                    record.key,
                    record.value.author,
                    record.value.sequence as i64,
                    record.value.timestamp,
                    record.value.private,
                    record.content().kind(),
                    body,
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> QueryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> QueryResult<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || f(&conn.lock()))
            .await
            .map_err(storage_error)?
    }

    async fn records_of_type(&self, kind: &'static str) -> QueryResult<Vec<LogRecord>> {
        self.blocking(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT body FROM records WHERE content_type = ?1
                     ORDER BY timestamp DESC, id DESC",
                )
                .map_err(storage_error)?;
            let rows = stmt
                .query_map([kind], |row| row.get::<_, String>(0))
                .map_err(storage_error)?;
            let mut records = Vec::new();
            for body in rows {
                let body = body.map_err(storage_error)?;
                records.push(serde_json::from_str(&body)?);
            }
            Ok(records)
        })
        .await
    }
}

/// Rows fetched per round trip to the blocking pool.
const PAGE_SIZE: usize = 64;

/// Position of the last row read: `(timestamp, id)`.
type Cursor = (i64, i64);

/// Top-level conjuncts of `filter` that map onto indexed columns. The full
/// predicate is still evaluated on every row, so this only narrows the scan.
fn column_conditions(filter: Option<&Predicate>) -> Vec<(&'static str, SqlValue)> {
    let clauses: &[Predicate] = match filter {
        Some(Predicate::And(clauses)) => clauses.as_slice(),
        Some(single) => std::slice::from_ref(single),
        None => &[],
    };

    clauses
        .iter()
        .filter_map(|clause| match clause {
            Predicate::Eq(Field::Author, Scalar::Str(author)) => {
                Some(("author", SqlValue::Text(author.clone())))
            }
            Predicate::Eq(Field::Type, Scalar::Str(kind)) => {
                Some(("content_type", SqlValue::Text(kind.clone())))
            }
            Predicate::Eq(Field::Private, Scalar::Bool(true)) => {
                Some(("private", SqlValue::Integer(1)))
            }
            Predicate::Absent(Field::Private) => Some(("private", SqlValue::Integer(0))),
            _ => None,
        })
        .collect()
}

struct Page {
    records: Vec<LogRecord>,
    last: Option<Cursor>,
    exhausted: bool,
}

fn read_page(conn: &Connection, query: &Query, after: Option<Cursor>) -> QueryResult<Page> {
    let (order, before) = if query.reverse {
        ("DESC", "<")
    } else {
        ("ASC", ">")
    };

    let mut conditions: Vec<String> = Vec::new();
    let mut values: Vec<SqlValue> = Vec::new();
    for (column, value) in column_conditions(query.filter.as_ref()) {
        values.push(value);
        conditions.push(format!("{column} = ?{}", values.len()));
    }
    if let Some((timestamp, id)) = after {
        values.push(SqlValue::Integer(timestamp));
        values.push(SqlValue::Integer(id));
        let (ts, row) = (values.len() - 1, values.len());
        conditions.push(format!(
            "(timestamp {before} ?{ts} OR (timestamp = ?{ts} AND id {before} ?{row}))"
        ));
    }
    let filter = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    let sql = format!(
        "SELECT id, timestamp, body FROM records {filter}
         ORDER BY timestamp {order}, id {order} LIMIT {PAGE_SIZE}"
    );

    let mut stmt = conn.prepare(&sql).map_err(storage_error)?;
    let mut rows = stmt.query(params_from_iter(values)).map_err(storage_error)?;
    let mut page = Page {
        records: Vec::new(),
        last: None,
        exhausted: true,
    };
    let mut fetched = 0;
    while let Some(row) = rows.next().map_err(storage_error)? {
        fetched += 1;
        let id: i64 = row.get(0).map_err(storage_error)?;
        let timestamp: i64 = row.get(1).map_err(storage_error)?;
        let body: String = row.get(2).map_err(storage_error)?;
        page.last = Some((timestamp, id));

        let record: LogRecord = serde_json::from_str(&body)?;
        if query.matches(&record) {
            page.records.push(record);
        }
    }
    page.exhausted = fetched < PAGE_SIZE;
    Ok(page)
}

struct ScanState {
    log: SqliteLog,
    query: Arc<Query>,
    after: Option<Cursor>,
    remaining: usize,
    done: bool,
}

impl LogStore for SqliteLog {
    /// Pages through matching rows on demand; nothing past the page being
    /// consumed is read, and dropping the stream ends the scan.
    fn read(&self, query: &Query) -> RecordStream {
        let state = ScanState {
            log: self.clone(),
            query: Arc::new(query.clone()),
            after: None,
            remaining: query.limit.unwrap_or(usize::MAX),
            done: false,
        };

        stream::unfold(state, |mut state| async move {
            if state.done || state.remaining == 0 {
                return None;
            }
            let query = state.query.clone();
            let after = state.after;
            let items: Vec<QueryResult<LogRecord>> =
                match state.log.blocking(move |conn| read_page(conn, &query, after)).await {
                    Ok(mut page) => {
                        page.records.truncate(state.remaining);
                        state.remaining -= page.records.len();
                        state.after = page.last;
                        state.done = page.exhausted;
                        page.records.into_iter().map(Ok).collect()
                    }
                    Err(err) => {
                        state.done = true;
                        vec![Err(err)]
                    }
                };
            Some((stream::iter(items), state))
        })
        .flatten()
        .boxed()
    }
}

#[async_trait]
impl FriendsGraph for SqliteLog {
    async fn get_graph(&self) -> QueryResult<TrustGraph> {
        let contacts = self
            .records_of_type(content_types::CONTACT)
            .await
            .map_err(|err| QueryError::GraphLookup(err.to_string()))?;
        Ok(TrustGraph::from_contacts(&contacts))
    }

    async fn is_following(&self, source: &str, dest: &str) -> QueryResult<bool> {
        Ok(self.get_graph().await?.follows(source, dest))
    }
}

#[async_trait]
impl AboutIndex for SqliteLog {
    async fn latest_value(&self, key: &str, dest: &str) -> QueryResult<Option<String>> {
        let (abouts, deletes) = futures::try_join!(
            self.records_of_type(content_types::ABOUT),
            self.records_of_type(content_types::DELETE),
        )?;
        Ok(latest_about_value(&abouts, &Tombstones::from_records(&deletes), key, dest))
    }
}

#[async_trait]
impl LogWriter for SqliteLog {
    async fn append(&self, author: &str, content: Content, private: bool) -> QueryResult<LogRecord> {
        let author = author.to_string();
        self.blocking(move |conn| {
            let last_sequence: Option<i64> = conn
                .query_row(
                    "SELECT MAX(sequence) FROM records WHERE author = ?1",
                    [&author],
                    |row| row.get(0),
                )
                .optional()
                .map_err(storage_error)?
                .flatten();
            let newest: Option<i64> = conn
                .query_row("SELECT MAX(timestamp) FROM records", [], |row| row.get(0))
                .optional()
                .map_err(storage_error)?
                .flatten();

            let value = RecordValue {
                author,
                sequence: last_sequence.unwrap_or(0) as u64 + 1,
                timestamp: newest.map_or(now_millis(), |ts| now_millis().max(ts.saturating_add(1))),
                private,
                content,
            };
            let record = LogRecord {
                key: record_key(&value)?,
                value,
            };
            let body = serde_json::to_string(&record)?;
            conn.execute(
                "INSERT INTO records
                 (key, author, sequence, timestamp, private, content_type, body)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.key,
                    record.value.author,
                    record.value.sequence as i64,
                    record.value.timestamp,
                    record.value.private,
                    record.content().kind(),
                    body,
                ],
            )
            .map_err(|err| QueryError::AppendFailure(err.to_string()))?;
            Ok(record)
        })
        .await
    }
}
