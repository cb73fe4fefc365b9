//! Bundled reference backend: exact linear scan behind the command seam.
//!
//! Parses the harness command dialect, keeps rows in memory, and answers
//! similarity queries by brute-force L2 scan sorted ascending. No index
//! structure is built; `CREATE INDEX` is accepted and ignored, which is
//! exactly the contract a scan satisfies. Useful as the always-available
//! system under test, as the oracle in end-to-end tests, and for generating
//! exact ground truth.

use crate::backend::{vector_literal, Backend, BackendError, ResultRow};

/// In-memory exact-scan backend.
#[derive(Debug, Default)]
pub struct ScanBackend {
    collection: Option<Collection>,
}

#[derive(Debug)]
struct Collection {
    name: String,
    dim: usize,
    rows: Vec<(u32, Vec<f32>)>,
}

impl ScanBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows currently stored. Test hook.
    pub fn row_count(&self) -> usize {
        self.collection.as_ref().map_or(0, |c| c.rows.len())
    }

    fn collection_mut(&mut self, name: &str) -> Result<&mut Collection, BackendError> {
        match self.collection.as_mut() {
            Some(c) if c.name == name => Ok(c),
            Some(c) => Err(err(format!(
                "unknown collection {name:?} (have {:?})",
                c.name
            ))),
            None => Err(err(format!("unknown collection {name:?}"))),
        }
    }

    fn create_table(&mut self, cmd: &str) -> Result<(), BackendError> {
        let rest = cmd
            .strip_prefix("CREATE TABLE ")
            .ok_or_else(|| err("malformed CREATE TABLE"))?;
        let name_end = rest
            .find(" (")
            .ok_or_else(|| err("CREATE TABLE missing column list"))?;
        let name = rest[..name_end].trim();
        if name.is_empty() {
            return Err(err("CREATE TABLE missing collection name"));
        }

        let dim_start = rest
            .find("VECTOR(")
            .ok_or_else(|| err("CREATE TABLE missing VECTOR column"))?
            + "VECTOR(".len();
        let dim_len = rest[dim_start..]
            .find(')')
            .ok_or_else(|| err("unterminated VECTOR dimension"))?;
        let dim: usize = rest[dim_start..dim_start + dim_len]
            .trim()
            .parse()
            .map_err(|_| err("VECTOR dimension is not an integer"))?;
        if dim == 0 {
            return Err(err("VECTOR dimension must be positive"));
        }

        if self.collection.is_some() {
            return Err(err("collection already exists"));
        }
        self.collection = Some(Collection {
            name: name.to_string(),
            dim,
            rows: Vec::new(),
        });
        Ok(())
    }

    fn create_index(&mut self, cmd: &str) -> Result<(), BackendError> {
        let rest = cmd
            .split(" ON ")
            .nth(1)
            .ok_or_else(|| err("CREATE INDEX missing ON clause"))?;
        let name = rest
            .split_whitespace()
            .next()
            .ok_or_else(|| err("CREATE INDEX missing collection name"))?;
        // A scan answers queries exactly with no structure; accept the
        // declaration so the schema phase succeeds.
        self.collection_mut(name)?;
        Ok(())
    }

    fn insert(&mut self, cmd: &str) -> Result<(), BackendError> {
        let rest = cmd
            .strip_prefix("INSERT INTO ")
            .ok_or_else(|| err("malformed INSERT"))?;
        let name_end = rest
            .find(" VALUES ")
            .ok_or_else(|| err("INSERT missing VALUES clause"))?;
        let name = rest[..name_end].trim().to_string();

        let (vector, after) = parse_vector_literal(&rest[name_end..])?;
        let id_text: String = after
            .chars()
            .skip_while(|c| *c == ',' || c.is_whitespace())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        let id: u32 = id_text
            .parse()
            .map_err(|_| err("INSERT missing integer identifier"))?;

        let collection = self.collection_mut(&name)?;
        if vector.len() != collection.dim {
            return Err(err(format!(
                "vector has {} components, column is VECTOR({})",
                vector.len(),
                collection.dim
            )));
        }
        collection.rows.push((id, vector));
        Ok(())
    }

    fn query(&mut self, cmd: &str) -> Result<Vec<ResultRow>, BackendError> {
        let rest = cmd
            .split(" FROM ")
            .nth(1)
            .ok_or_else(|| err("SELECT missing FROM clause"))?;
        let name = rest
            .split_whitespace()
            .next()
            .ok_or_else(|| err("SELECT missing collection name"))?
            .to_string();

        let order_at = rest
            .find("<->")
            .ok_or_else(|| err("SELECT missing distance operator"))?;
        let (query, after) = parse_vector_literal(&rest[order_at..])?;

        let limit_at = after
            .find("LIMIT ")
            .ok_or_else(|| err("SELECT missing LIMIT clause"))?
            + "LIMIT ".len();
        let limit: usize = after[limit_at..]
            .trim_end_matches(';')
            .trim()
            .parse()
            .map_err(|_| err("LIMIT is not an integer"))?;

        let collection = self.collection_mut(&name)?;
        if query.len() != collection.dim {
            return Err(err(format!(
                "query has {} components, column is VECTOR({})",
                query.len(),
                collection.dim
            )));
        }

        let mut scored: Vec<(u32, &Vec<f32>, f32)> = collection
            .rows
            .iter()
            .map(|(id, v)| (*id, v, l2_squared(&query, v)))
            .collect();
        scored.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(id, v, _)| ResultRow::new(vec![id.to_string(), vector_literal(v)]))
            .collect())
    }
}

impl Backend for ScanBackend {
    fn execute(&mut self, command: &str) -> Result<Vec<ResultRow>, BackendError> {
        let cmd = command.trim().trim_end_matches(';');
        if cmd.starts_with("CREATE TABLE") {
            self.create_table(cmd)?;
            Ok(Vec::new())
        } else if cmd.starts_with("CREATE INDEX") {
            self.create_index(cmd)?;
            Ok(Vec::new())
        } else if cmd.starts_with("INSERT INTO") {
            self.insert(cmd)?;
            Ok(Vec::new())
        } else if cmd.starts_with("SELECT") {
            self.query(cmd)
        } else {
            Err(err(format!(
                "unrecognized command: {:?}",
                cmd.split_whitespace().take(2).collect::<Vec<_>>().join(" ")
            )))
        }
    }
}

/// L2 distance squared; ordering-equivalent to L2 and cheaper.
fn l2_squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Parse the first `[…]` literal in `text`; returns the components and the
/// remainder after the closing bracket.
fn parse_vector_literal(text: &str) -> Result<(Vec<f32>, &str), BackendError> {
    let open = text.find('[').ok_or_else(|| err("missing vector literal"))?;
    let close = text[open..]
        .find(']')
        .ok_or_else(|| err("unterminated vector literal"))?
        + open;
    let body = &text[open + 1..close];

    let mut vector = Vec::new();
    if !body.trim().is_empty() {
        for part in body.split(',') {
            let v: f32 = part
                .trim()
                .parse()
                .map_err(|_| err(format!("bad vector component {:?}", part.trim())))?;
            vector.push(v);
        }
    }
    Ok((vector, &text[close + 1..]))
}

fn err(msg: impl Into<String>) -> BackendError {
    msg.into().into()
}
