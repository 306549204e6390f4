//! # notekeep-db
//!
//! PostgreSQL store for notekeep.
//!
//! This crate provides:
//! - Connection pool management
//! - Note, tag, and association queries
//! - A transactional unit of work ([`PgStoreTx`]) implementing the core store traits
//! - The [`Database`] handle implementing [`notekeep_core::Store`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use notekeep_db::Database;
//! use notekeep_core::{NoteStore, Store, StoreTx};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/notekeep").await?;
//!
//!     let mut tx = db.begin().await?;
//!     let note = tx.insert_note("Hello", Some("world")).await?;
//!     tx.commit().await?;
//!
//!     println!("Created note: {}", note.id);
//!     Ok(())
//! }
//! ```
pub mod note_tags;
pub mod notes;
pub mod pool;
pub mod tags;
pub mod tx;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

use async_trait::async_trait;
use sqlx::PgPool;

use notekeep_core::{
    Error, ListNotesRequest, NoteId, NoteWithTags, Result, Store, StoreTx, Tag, TagId, TagSummary,
};

pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use tx::PgStoreTx;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// The PostgreSQL store handle. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: PgPool,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for Database {
    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        Ok(Box::new(PgStoreTx::begin(&self.pool).await?))
    }

    async fn fetch_note(&self, id: NoteId) -> Result<NoteWithTags> {
        notes::fetch(&self.pool, id).await
    }

    async fn list_notes(&self, req: ListNotesRequest) -> Result<Vec<NoteWithTags>> {
        notes::list(&self.pool, req).await
    }

    async fn list_tags(&self) -> Result<Vec<TagSummary>> {
        tags::list_with_counts(&self.pool).await
    }

    async fn search_tags(&self, fragment: &str, limit: i64) -> Result<Vec<Tag>> {
        tags::search(&self.pool, fragment, limit).await
    }

    async fn update_tag_color(&self, id: TagId, color: Option<&str>) -> Result<Tag> {
        tags::update_color(&self.pool, id, color).await
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(Error::from)?;
        log_pool_metrics(&self.pool);
        Ok(())
    }
}
