//! Exact nearest-neighbour search over fragment vectors.
//!
//! [`FlatL2Index`] keeps every vector as a sparse row and answers queries
//! with a linear scan by squared Euclidean distance. Corpus sizes are small,
//! so an exhaustive scan is exact and fast enough. TF-IDF rows touch only a
//! handful of the vocabulary's columns, so storage and the encoded artifact
//! grow with the number of non-zero weights, not with `count × dims`.
//!
//! The index owns no fragment text: row `i` corresponds to the fragment at
//! position `i` of the fragment list persisted next to it.
//!
//! # Binary Format
//!
//! All integers and floats are little-endian:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | magic `LCIX` |
//! | 4 | 4 | format version (`u32`) |
//! | 8 | 4 | dimensionality (`u32`) |
//! | 12 | 4 | row count (`u32`) |
//! | 16 | … | `count` rows |
//!
//! Each row is a `u32` entry count followed by that many `(u32 column,
//! f32 weight)` pairs in strictly increasing column order.

use thiserror::Error;

use crate::vectorize::SparseVector;

/// Current index format version.
pub const INDEX_FORMAT_VERSION: u32 = 2;

/// Magic bytes identifying an index artifact.
const MAGIC_BYTES: &[u8; 4] = b"LCIX";

const HEADER_SIZE: usize = 16;

const U32_SIZE: usize = 4;

/// One `(column, weight)` pair on disk.
const ENTRY_SIZE: usize = 8;

/// Errors raised by index construction, search, and decoding.
#[derive(Error, Debug, PartialEq)]
pub enum IndexError {
    #[error("Column {column} out of range for an index of {dims} dimensions")]
    ColumnOutOfRange { column: usize, dims: usize },

    #[error("Invalid index format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported index format version {actual} (expected {expected})")]
    VersionMismatch { expected: u32, actual: u32 },
}

/// One search hit: the row position and its squared L2 distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// Capability of answering exact nearest-neighbour queries over a fixed set
/// of vectors living in one column space.
pub trait NearestNeighborIndex {
    /// Dimensionality fixed at construction.
    fn dims(&self) -> usize;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Up to `k` nearest rows to `query`, closest first. Equal distances
    /// resolve to the lower position.
    fn search(&self, query: &SparseVector, k: usize) -> Result<Vec<Neighbor>, IndexError>;
}

/// Flat, exhaustive squared-L2 index over sparse rows.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatL2Index {
    dims: usize,
    rows: Vec<SparseVector>,
}

impl FlatL2Index {
    /// Create an empty index of `dims` dimensions.
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            rows: Vec::new(),
        }
    }

    /// Build an index whose rows all lie within `dims` columns.
    pub fn from_rows(dims: usize, rows: &[SparseVector]) -> Result<Self, IndexError> {
        let mut index = Self::new(dims);
        index.rows.reserve(rows.len());
        for row in rows {
            index.add(row.clone())?;
        }
        Ok(index)
    }

    /// Append one vector.
    pub fn add(&mut self, vector: SparseVector) -> Result<(), IndexError> {
        self.check_columns(&vector)?;
        self.rows.push(vector);
        Ok(())
    }

    /// Stored vector at `position`.
    pub fn vector(&self, position: usize) -> Option<&SparseVector> {
        self.rows.get(position)
    }

    /// Serialize into the binary format described in the module docs.
    ///
    /// Fails if the dimensionality, row count, or a row's entry count does
    /// not fit the format's `u32` fields.
    pub fn to_bytes(&self) -> Result<Vec<u8>, IndexError> {
        let payload: usize = self
            .rows
            .iter()
            .map(|r| U32_SIZE + r.entries().len() * ENTRY_SIZE)
            .sum();
        let mut bytes = Vec::with_capacity(HEADER_SIZE + payload);
        bytes.extend_from_slice(MAGIC_BYTES);
        bytes.extend_from_slice(&INDEX_FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&to_u32(self.dims, "dimensionality")?.to_le_bytes());
        bytes.extend_from_slice(&to_u32(self.rows.len(), "row count")?.to_le_bytes());
        for row in &self.rows {
            bytes.extend_from_slice(&to_u32(row.entries().len(), "row entry count")?.to_le_bytes());
            for &(column, weight) in row.entries() {
                bytes.extend_from_slice(&to_u32(column, "column")?.to_le_bytes());
                bytes.extend_from_slice(&weight.to_le_bytes());
            }
        }
        Ok(bytes)
    }

    /// Decode an index written by [`to_bytes`](Self::to_bytes).
    ///
    /// Rejects wrong magic, unknown versions, truncated or oversized
    /// payloads, and rows whose columns are unsorted or out of range.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IndexError> {
        if bytes.len() < HEADER_SIZE {
            return Err(IndexError::InvalidFormat(
                "File too small to contain header".to_string(),
            ));
        }
        if &bytes[0..4] != MAGIC_BYTES {
            return Err(IndexError::InvalidFormat("Invalid magic bytes".to_string()));
        }

        let version = read_u32(&bytes[4..8]);
        if version != INDEX_FORMAT_VERSION {
            return Err(IndexError::VersionMismatch {
                expected: INDEX_FORMAT_VERSION,
                actual: version,
            });
        }

        let dims = read_u32(&bytes[8..12]) as usize;
        let count = read_u32(&bytes[12..16]) as usize;

        let mut cursor = Cursor {
            bytes,
            offset: HEADER_SIZE,
        };
        // A corrupt count must not drive the allocation.
        let mut rows = Vec::with_capacity(count.min(bytes.len() / U32_SIZE));
        for position in 0..count {
            let entry_count = read_u32(cursor.take(U32_SIZE, position)?) as usize;
            let raw = cursor.take_entries(entry_count, position)?;

            let mut entries: Vec<(usize, f32)> = Vec::with_capacity(entry_count);
            for pair in raw.chunks_exact(ENTRY_SIZE) {
                let column = read_u32(&pair[0..4]) as usize;
                let weight = f32::from_le_bytes([pair[4], pair[5], pair[6], pair[7]]);
                if column >= dims {
                    return Err(IndexError::ColumnOutOfRange { column, dims });
                }
                if let Some(&(previous, _)) = entries.last() {
                    if column <= previous {
                        return Err(IndexError::InvalidFormat(format!(
                            "Row {} columns are not strictly increasing",
                            position
                        )));
                    }
                }
                entries.push((column, weight));
            }
            rows.push(SparseVector::from_entries(entries));
        }

        if cursor.offset != bytes.len() {
            return Err(IndexError::InvalidFormat(format!(
                "{} trailing bytes after {} rows",
                bytes.len() - cursor.offset,
                count
            )));
        }

        Ok(Self { dims, rows })
    }

    fn check_columns(&self, vector: &SparseVector) -> Result<(), IndexError> {
        // Entries are sorted, so the last column is the largest.
        match vector.entries().last() {
            Some(&(column, _)) if column >= self.dims => Err(IndexError::ColumnOutOfRange {
                column,
                dims: self.dims,
            }),
            _ => Ok(()),
        }
    }
}

impl NearestNeighborIndex for FlatL2Index {
    fn dims(&self) -> usize {
        self.dims
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn search(&self, query: &SparseVector, k: usize) -> Result<Vec<Neighbor>, IndexError> {
        self.check_columns(query)?;

        let mut hits: Vec<Neighbor> = self
            .rows
            .iter()
            .enumerate()
            .map(|(position, row)| Neighbor {
                position,
                distance: row.squared_distance(query),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.position.cmp(&b.position))
        });
        hits.truncate(k);
        Ok(hits)
    }
}

/// Sequential reader over the row payload.
struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize, row: usize) -> Result<&'a [u8], IndexError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| IndexError::InvalidFormat(format!("Row {} is truncated", row)))?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn take_entries(&mut self, entry_count: usize, row: usize) -> Result<&'a [u8], IndexError> {
        let len = entry_count
            .checked_mul(ENTRY_SIZE)
            .ok_or_else(|| IndexError::InvalidFormat(format!("Row {} size overflows", row)))?;
        self.take(len, row)
    }
}

fn to_u32(value: usize, field: &str) -> Result<u32, IndexError> {
    u32::try_from(value).map_err(|_| {
        IndexError::InvalidFormat(format!("{} {} does not fit in u32", field, value))
    })
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
