//! SurrealDB schema definitions

use crate::{DbConnection, DbError, Result};
use tracing::info;

/// Initialize the database schema
pub async fn initialize_schema(db: &DbConnection) -> Result<()> {
    info!("Initializing database schema...");

    db.query(SCHEMA_DEFINITION)
        .await?
        .check()
        .map_err(|e| DbError::SchemaInit(e.to_string()))?;

    info!("Schema initialized successfully");
    Ok(())
}

// Concept and chunk record keys are the concept name and chunk id, so every
// join keys on them exactly.
const SCHEMA_DEFINITION: &str = r#"
-- ============================================
-- TABLES
-- ============================================

-- Concepts (merged on name, last write wins)
DEFINE TABLE IF NOT EXISTS concept SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS name ON concept TYPE string;
DEFINE FIELD IF NOT EXISTS concept_type ON concept TYPE string DEFAULT 'default';
DEFINE FIELD IF NOT EXISTS importance ON concept TYPE float DEFAULT 0.5;
DEFINE FIELD IF NOT EXISTS updated_at ON concept TYPE datetime DEFAULT time::now();

-- Document chunks (immutable once written)
DEFINE TABLE IF NOT EXISTS chunk SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS chunk_id ON chunk TYPE string;
DEFINE FIELD IF NOT EXISTS text ON chunk TYPE string;
DEFINE FIELD IF NOT EXISTS source ON chunk TYPE string;
DEFINE FIELD IF NOT EXISTS chunk_index ON chunk TYPE int;
DEFINE FIELD IF NOT EXISTS created_at ON chunk TYPE datetime DEFAULT time::now();

-- ============================================
-- GRAPH EDGE TABLES
-- ============================================

-- Concept to concept relations
DEFINE TABLE IF NOT EXISTS relates_to TYPE RELATION IN concept OUT concept SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS relation_type ON relates_to TYPE string DEFAULT 'relates_to';
DEFINE FIELD IF NOT EXISTS strength ON relates_to TYPE float DEFAULT 0.5;
DEFINE FIELD IF NOT EXISTS updated_at ON relates_to TYPE datetime DEFAULT time::now();

-- Chunk to concept mentions
DEFINE TABLE IF NOT EXISTS mentions TYPE RELATION IN chunk OUT concept SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS strength ON mentions TYPE float DEFAULT 0.5;
DEFINE FIELD IF NOT EXISTS created_at ON mentions TYPE datetime DEFAULT time::now();

-- ============================================
-- INDEXES
-- ============================================

DEFINE INDEX IF NOT EXISTS idx_concept_name ON concept FIELDS name UNIQUE;
DEFINE INDEX IF NOT EXISTS idx_concept_importance ON concept FIELDS importance;
DEFINE INDEX IF NOT EXISTS idx_chunk_source ON chunk FIELDS source;
DEFINE INDEX IF NOT EXISTS idx_relates_in ON relates_to FIELDS in;
DEFINE INDEX IF NOT EXISTS idx_relates_out ON relates_to FIELDS out;
DEFINE INDEX IF NOT EXISTS idx_mentions_out ON mentions FIELDS out;
"#;
