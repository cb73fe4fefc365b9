//! fvecs/ivecs vector file codec.
//!
//! The Texmex vector file family stores one record per vector:
//!
//! | Field | Size | Meaning |
//! |-------|------|---------|
//! | `dim` | 4 bytes, `i32` LE | components in this record |
//! | payload | `dim * 4` bytes | `f32` LE (fvecs) or `i32` LE (ivecs) |
//!
//! Records repeat back to back with no padding, so a well-formed file is
//! exactly `records * (dim + 1) * 4` bytes. Decoding strips every per-record
//! header, yielding a dense `records * dim` buffer in insertion order.
//!
//! The ivecs variant shares the framing but carries integer identifiers
//! (ground-truth neighbor lists). It is decoded as integers directly rather
//! than reinterpreting float storage.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{HarnessError, Result};

/// Largest per-vector dimension accepted by the decoder.
///
/// A header outside `1..=MAX_DIMENSION` means the file is not in this
/// format at all (or is byte-swapped), so decoding stops before any
/// allocation is sized from it.
pub const MAX_DIMENSION: usize = 1_000_000;

/// An ordered set of fixed-dimension vectors, stored contiguously.
///
/// `data` holds `len() * dimension()` components in insertion order with the
/// per-record headers stripped. Immutable after decode.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSet {
    dim: usize,
    data: Vec<f32>,
}

impl VectorSet {
    /// Build a set from uniform-length rows. Used by tests and the
    /// synthetic-workload generator; files go through [`read_fvecs`].
    pub fn from_rows(dim: usize, rows: &[Vec<f32>]) -> Result<Self> {
        if dim == 0 || dim > MAX_DIMENSION {
            return Err(HarnessError::DimensionMismatch {
                subject: "vector dimension",
                expected: 1,
                actual: dim,
            });
        }
        let mut data = Vec::with_capacity(rows.len() * dim);
        for row in rows {
            if row.len() != dim {
                return Err(HarnessError::DimensionMismatch {
                    subject: "vector row length",
                    expected: dim,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self { dim, data })
    }

    /// Components per vector.
    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// Number of vectors.
    pub fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    /// Whether the set holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow vector `i`.
    ///
    /// # Panics
    /// Panics if `i >= len()`.
    pub fn get(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    /// Iterate vectors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dim)
    }

    /// The dense component buffer, headers stripped.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Ground-truth neighbor lists: for each query, `k` reference identifiers in
/// similarity order (nearest first). Stored contiguously like [`VectorSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundTruth {
    k: usize,
    ids: Vec<u32>,
}

impl GroundTruth {
    /// Build ground truth from uniform-length rows of at least one
    /// identifier each.
    pub fn from_rows(rows: &[Vec<u32>]) -> Result<Self> {
        let k = rows.first().map(Vec::len).unwrap_or(0);
        if k == 0 {
            return Err(HarnessError::DimensionMismatch {
                subject: "ground truth neighbors per query",
                expected: 1,
                actual: 0,
            });
        }
        let mut ids = Vec::with_capacity(rows.len() * k);
        for row in rows {
            if row.len() != k {
                return Err(HarnessError::DimensionMismatch {
                    subject: "ground truth row length",
                    expected: k,
                    actual: row.len(),
                });
            }
            ids.extend_from_slice(row);
        }
        Ok(Self { k, ids })
    }

    /// Neighbors recorded per query.
    pub fn neighbors_per_query(&self) -> usize {
        self.k
    }

    /// Number of queries covered.
    pub fn len(&self) -> usize {
        self.ids.len() / self.k
    }

    /// Whether no queries are covered.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Borrow the neighbor list for query `i`, nearest first.
    ///
    /// # Panics
    /// Panics if `i >= len()`.
    pub fn row(&self, i: usize) -> &[u32] {
        &self.ids[i * self.k..(i + 1) * self.k]
    }

    /// Iterate neighbor lists in query order.
    pub fn iter(&self) -> impl Iterator<Item = &[u32]> {
        self.ids.chunks_exact(self.k)
    }
}

/// Framing of a vecs file, as reported by [`probe_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    /// Per-record payload dimension.
    pub dimension: usize,
    /// Number of records.
    pub records: usize,
    /// Total file size in bytes.
    pub bytes: u64,
}

impl FileInfo {
    /// Bytes per record, header included.
    pub fn stride(&self) -> usize {
        (self.dimension + 1) * 4
    }
}

/// Validate a file's framing without decoding its payload.
///
/// Checks that the file opens, is non-empty, declares a dimension within
/// the sane bound, and is an exact multiple of the record stride.
pub fn probe_file(path: impl AsRef<Path>) -> Result<FileInfo> {
    let path = path.as_ref();
    let file =
        File::open(path).map_err(|e| HarnessError::format(path, format!("cannot open: {e}")))?;
    let bytes = file
        .metadata()
        .map_err(|e| HarnessError::format(path, format!("cannot stat: {e}")))?
        .len();
    if bytes == 0 {
        return Err(HarnessError::format(path, "empty file"));
    }

    let mut reader = BufReader::new(file);
    let dim = reader
        .read_i32::<LittleEndian>()
        .map_err(|e| HarnessError::format(path, format!("cannot read dimension header: {e}")))?;
    if dim <= 0 || dim as usize > MAX_DIMENSION {
        return Err(HarnessError::format(
            path,
            format!("unreasonable dimension {dim}"),
        ));
    }
    let dimension = dim as usize;

    let stride = ((dimension + 1) * 4) as u64;
    if bytes % stride != 0 {
        return Err(HarnessError::format(
            path,
            format!("size {bytes} is not a multiple of the {stride}-byte record stride"),
        ));
    }

    Ok(FileInfo {
        dimension,
        records: (bytes / stride) as usize,
        bytes,
    })
}

/// Decode an fvecs file into a dense [`VectorSet`].
pub fn read_fvecs(path: impl AsRef<Path>) -> Result<VectorSet> {
    read_fvecs_limited(path, usize::MAX)
}

/// Decode at most `limit` records of an fvecs file.
///
/// The whole file is still validated against the record stride; the limit
/// only bounds how much is materialized in memory.
pub fn read_fvecs_limited(path: impl AsRef<Path>, limit: usize) -> Result<VectorSet> {
    let path = path.as_ref();
    let info = probe_file(path)?;
    let take = info.records.min(limit);

    let mut reader = open_validated(path)?;
    let mut data = vec![0.0f32; take * info.dimension];
    for row in 0..take {
        expect_header(&mut reader, path, row, info.dimension)?;
        reader
            .read_f32_into::<LittleEndian>(
                &mut data[row * info.dimension..(row + 1) * info.dimension],
            )
            .map_err(|e| {
                HarnessError::format(path, format!("truncated payload in record {row}: {e}"))
            })?;
    }

    Ok(VectorSet {
        dim: info.dimension,
        data,
    })
}

/// Decode an ivecs file into a [`GroundTruth`].
pub fn read_ivecs(path: impl AsRef<Path>) -> Result<GroundTruth> {
    read_ivecs_limited(path, usize::MAX)
}

/// Decode at most `limit` records of an ivecs file.
pub fn read_ivecs_limited(path: impl AsRef<Path>, limit: usize) -> Result<GroundTruth> {
    let path = path.as_ref();
    let info = probe_file(path)?;
    let take = info.records.min(limit);

    let mut reader = open_validated(path)?;
    let mut ids = Vec::with_capacity(take * info.dimension);
    let mut row_buf = vec![0i32; info.dimension];
    for row in 0..take {
        expect_header(&mut reader, path, row, info.dimension)?;
        reader
            .read_i32_into::<LittleEndian>(&mut row_buf)
            .map_err(|e| {
                HarnessError::format(path, format!("truncated payload in record {row}: {e}"))
            })?;
        for &id in &row_buf {
            if id < 0 {
                return Err(HarnessError::format(
                    path,
                    format!("negative identifier {id} in record {row}"),
                ));
            }
            ids.push(id as u32);
        }
    }

    Ok(GroundTruth {
        k: info.dimension,
        ids,
    })
}

/// Encode a [`VectorSet`] with the standard per-record framing.
pub fn write_fvecs(path: impl AsRef<Path>, set: &VectorSet) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for row in set.iter() {
        writer.write_i32::<LittleEndian>(set.dimension() as i32)?;
        for &v in row {
            writer.write_f32::<LittleEndian>(v)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Encode a [`GroundTruth`] with the standard per-record framing.
pub fn write_ivecs(path: impl AsRef<Path>, gt: &GroundTruth) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for row in gt.iter() {
        writer.write_i32::<LittleEndian>(gt.neighbors_per_query() as i32)?;
        for &id in row {
            writer.write_i32::<LittleEndian>(id as i32)?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn open_validated(path: &Path) -> Result<BufReader<File>> {
    let file =
        File::open(path).map_err(|e| HarnessError::format(path, format!("cannot open: {e}")))?;
    Ok(BufReader::new(file))
}

/// Read one record's dimension header and require it to match the first
/// record's. Mixed headers mean the stride arithmetic was a lie.
fn expect_header(reader: &mut BufReader<File>, path: &Path, row: usize, dim: usize) -> Result<()> {
    let header = reader
        .read_i32::<LittleEndian>()
        .map_err(|e| HarnessError::format(path, format!("truncated header in record {row}: {e}")))?;
    if header as usize != dim {
        return Err(HarnessError::format(
            path,
            format!("record {row} declares dimension {header}, expected {dim}"),
        ));
    }
    Ok(())
}
