//! Graph store for the concept graph
//!
//! Provides SurrealDB integration with schema management and the
//! concept, chunk and relation queries the question-answering core needs.

pub mod error;
pub mod repository;
pub mod schema;

pub use error::{DbError, Result};
pub use repository::{DbStats, Repository};

use surrealdb::engine::local::{Db, Mem};
use surrealdb::Surreal;

#[cfg(feature = "rocksdb")]
use std::path::Path;
#[cfg(feature = "rocksdb")]
use surrealdb::engine::local::RocksDb;

/// Database connection type
pub type DbConnection = Surreal<Db>;

/// Initialize database with RocksDB (persistent)
#[cfg(feature = "rocksdb")]
pub async fn init_persistent(path: impl AsRef<Path>) -> Result<DbConnection> {
    let db = Surreal::new::<RocksDb>(path.as_ref())
        .await
        .map_err(|e| DbError::Connection(format!("{}: {}", path.as_ref().display(), e)))?;
    setup_database(&db).await?;
    Ok(db)
}

/// Initialize database in-memory (for testing)
pub async fn init_memory() -> Result<DbConnection> {
    let db = Surreal::new::<Mem>(()).await?;
    setup_database(&db).await?;
    Ok(db)
}

/// Setup database namespace, database, and schema
async fn setup_database(db: &DbConnection) -> Result<()> {
    db.use_ns("conceptgraph").use_db("graph").await?;
    schema::initialize_schema(db).await?;
    Ok(())
}
