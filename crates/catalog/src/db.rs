//! Database connection and pool management.

use exn::ResultExt;
use sqlx::SqliteConnection;
use sqlx::pool::PoolConnectionMetadata;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::time::Duration;
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// Embedded migrations that are run automatically on connect.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
// Imports resolve several references concurrently.
const MAX_CONNECTIONS: u32 = 5;

/// Connection pool for the media catalog.
///
/// Hand it to [`Repository::from`](crate::Repository) to read and write rows.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    async fn new(options: SqliteConnectOptions, max: Option<u32>) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            // Query-based PRAGMAs are per connection, not per database.
            .after_connect(|conn, meta| Box::pin(async move {
                Self::apply_pragmas(conn, meta).await
            }))
            .max_connections(max.unwrap_or(MAX_CONNECTIONS))
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Open (or create) the catalog database at `path` and run migrations.
    ///
    /// # Arguments
    /// * `path` - SQLite database file; its parent directory must exist
    ///
    /// # Errors
    ///
    /// Returns [`Database`](ErrorKind::Database) if the file cannot be opened
    /// or created, and [`Migration`](ErrorKind::Migration) if the schema
    /// cannot be brought up to date.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ampstory_catalog::{Database, Repository};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let db = Database::connect("/var/lib/ampstory/catalog.sqlite3").await?;
    /// let repo = Repository::from(&db);
    /// println!("{} images catalogued", repo.count_images().await?);
    /// db.close().await;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let options = Self::base_options().filename(path).create_if_missing(true);
        Self::new(options, None).await
    }

    /// Open a throwaway in-memory catalog.
    ///
    /// The pool holds a single connection, so every query sees the same
    /// database. Not gated behind `cfg(test)`: the library crate's tests use it too.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = Self::base_options().filename(":memory:");
        // Every in-memory connection is its own database.
        Self::new(options, Some(1)).await
    }

    fn base_options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .synchronous(SqliteSynchronous::Normal)
            // Concurrent imports all write through the single WAL writer.
            .busy_timeout(Duration::from_millis(5000))
    }

    async fn apply_pragmas(conn: &mut SqliteConnection, _meta: PoolConnectionMetadata) -> sqlx::Result<()> {
        sqlx::query(
            r#"
                PRAGMA wal_autocheckpoint = 1000;
                PRAGMA cache_size = -4096;
                PRAGMA temp_store = MEMORY;
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    #[instrument("migrating catalog", skip(self))]
    async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.or_raise(|| ErrorKind::Migration)
    }

    /// The underlying pool, for queries the [`Repository`](crate::Repository)
    /// does not cover.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for checked-out connections and close the pool.
    pub async fn close(&self) {
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }
}
