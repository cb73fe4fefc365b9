//! Command seam to the vector-search backend under test.
//!
//! The harness treats the backend as a black box: it composes textual
//! commands, hands them to [`Backend::execute`], and reads back ordered
//! result rows. Nothing here inspects backend-internal state, so any system
//! that can accept the dialect below can be benchmarked.
//!
//! The dialect is SQL-flavored:
//!
//! ```text
//! CREATE TABLE items (embedding VECTOR(128), id INTEGER);
//! CREATE INDEX items_embedding_hnsw ON items USING hnsw (embedding vector_l2_ops)
//!     WITH (m = 16, ef_construction = 64, ef_search = 100);
//! INSERT INTO items VALUES ([0.000000, …], 42);
//! SELECT id, embedding FROM items ORDER BY embedding <-> [0.000000, …] LIMIT 100;
//! ```

use std::fmt::Write as _;

/// Error surfaced by a backend for a rejected or failed command.
///
/// The driver decides severity by stage: schema commands are fatal, per-row
/// commands are counted and skipped.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// One row returned from a backend command: ordered string fields.
///
/// For similarity queries the first field is the stored identifier and rows
/// arrive in similarity-rank order, nearest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub fields: Vec<String>,
}

impl ResultRow {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// The identifier field, when present.
    pub fn id_field(&self) -> Option<&str> {
        self.fields.first().map(String::as_str)
    }
}

/// A vector-search backend reachable through one operation.
pub trait Backend {
    /// Execute one backend-specific command.
    ///
    /// Returns result rows in the order the backend produced them; only
    /// query-type commands yield rows, the rest return an empty set on
    /// acceptance.
    fn execute(&mut self, command: &str) -> Result<Vec<ResultRow>, BackendError>;
}

/// Index construction parameters, passed through to the backend verbatim.
///
/// The harness does not interpret these beyond embedding them in the
/// `CREATE INDEX` command; they trade build cost and query latency against
/// recall on the backend side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexParams {
    /// Graph degree (`m`).
    pub m: usize,
    /// Construction search width (`ef_construction`).
    pub ef_construction: usize,
    /// Query search width (`ef_search`).
    pub ef_search: usize,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            m: 16,
            ef_construction: 64,
            ef_search: 100,
        }
    }
}

impl IndexParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the graph degree.
    pub fn with_m(mut self, m: usize) -> Self {
        self.m = m;
        self
    }

    /// Set the construction search width.
    pub fn with_ef_construction(mut self, ef: usize) -> Self {
        self.ef_construction = ef;
        self
    }

    /// Set the query search width.
    pub fn with_ef_search(mut self, ef: usize) -> Self {
        self.ef_search = ef;
        self
    }
}

/// Declare a collection with one vector column and one integer id column.
pub fn create_collection(collection: &str, dim: usize) -> String {
    format!("CREATE TABLE {collection} (embedding VECTOR({dim}), id INTEGER);")
}

/// Declare an HNSW index over the vector column with pass-through parameters.
pub fn create_index(collection: &str, params: &IndexParams) -> String {
    format!(
        "CREATE INDEX {collection}_embedding_hnsw ON {collection} USING hnsw \
         (embedding vector_l2_ops) WITH (m = {}, ef_construction = {}, ef_search = {});",
        params.m, params.ef_construction, params.ef_search
    )
}

/// Insert one row pairing a vector literal with its zero-based identifier.
pub fn insert_row(collection: &str, vector: &[f32], id: u32) -> String {
    format!(
        "INSERT INTO {collection} VALUES ({}, {id});",
        vector_literal(vector)
    )
}

/// Top-`limit` similarity query ordered by ascending distance.
pub fn similarity_query(collection: &str, vector: &[f32], limit: usize) -> String {
    format!(
        "SELECT id, embedding FROM {collection} ORDER BY embedding <-> {} LIMIT {limit};",
        vector_literal(vector)
    )
}

/// Render a vector as the dialect's literal form: fixed six-decimal
/// components, comma-separated, in brackets.
pub fn vector_literal(vector: &[f32]) -> String {
    let mut out = String::with_capacity(vector.len() * 10 + 2);
    out.push('[');
    for (i, v) in vector.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{v:.6}");
    }
    out.push(']');
    out
}
