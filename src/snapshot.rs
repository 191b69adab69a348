//! .wvs Model Snapshot Format
//!
//! The native on-disk container for a word-vector model, designed to be
//! memory-mapped and read without parsing the vector data.
//!
//! # File Structure
//!
//! ```text
//! Offset   Size    Type        Description
//! ─────────────────────────────────────────────────
//! 0x00     8       [u8; 8]     Magic: "WVSNAP01"
//! 0x08     4       u32 LE      Version (1)
//! 0x0C     4       u32 LE      N: Number of vectors
//! 0x10     4       u32 LE      D: Dimensions
//! 0x14     4       [u8; 4]     Reserved / padding
//! 0x18     8       u64 LE      Vocabulary section offset
//! 0x20     8       u64 LE      Vector section offset
//! 0x28     24      [u8; 24]    Reserved
//! ─────────────────────────────────────────────────
//! TOTAL: 64 bytes
//! ```
//!
//! The vocabulary section is an entry table followed by a packed UTF-8
//! string pool:
//!
//! ```text
//! [entry_count: u32]
//! [string_pool_offset: u32]            (relative to section start)
//! [entries: (offset u32, len u16, pad u16) × entry_count]
//! [string_pool: packed UTF-8 tokens]
//! ```
//!
//! The vector section holds N×D f32 values (Little Endian) and starts at a
//! 64-byte-aligned offset so rows can be handed out as `&[f32]` slices
//! straight from the mapping.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use memmap2::Mmap;
use thiserror::Error;

use crate::model::{ModelError, WordVectors};

/// Magic bytes identifying a .wvs snapshot: "WVSNAP01"
pub const MAGIC: [u8; 8] = *b"WVSNAP01";

/// Snapshot header size in bytes
pub const HEADER_SIZE: usize = 64;

/// On-wire size of one vocabulary entry: offset (4) + len (2) + pad (2)
const VOCAB_ENTRY_SIZE: usize = 8;

/// Vocabulary section header size: entry_count (4) + string_pool_offset (4)
const VOCAB_HEADER_SIZE: usize = 8;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Invalid magic bytes: expected WVSNAP01")]
    InvalidMagic,

    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),

    #[error("Vector section misaligned: offset {offset} (expected alignment {alignment})")]
    Misaligned { offset: u64, alignment: u64 },

    #[error("Invalid snapshot: {0}")]
    Invalid(String),

    #[error("Index out of bounds: {index} >= {count}")]
    IndexOutOfBounds { index: usize, count: usize },

    #[error("Alignment error: byte slice not aligned to f32 (4 bytes)")]
    AlignmentError,

    #[error("Token too long for snapshot vocabulary: {0} bytes")]
    TokenTooLong(usize),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Parsed .wvs snapshot header
#[derive(Debug, Clone, Copy)]
pub struct SnapshotHeader {
    pub version: u32,
    pub count: u32,
    pub dimensions: u32,
    pub vocab_offset: u64,
    pub vectors_offset: u64,
}

impl SnapshotHeader {
    /// Parse header from raw bytes (first 64 bytes of file)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        if bytes.len() < HEADER_SIZE {
            return Err(SnapshotError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("File too small for header: {} < {}", bytes.len(), HEADER_SIZE),
            )));
        }

        if bytes[0..8] != MAGIC {
            return Err(SnapshotError::InvalidMagic);
        }

        let version = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
        if version != 1 {
            return Err(SnapshotError::UnsupportedVersion(version));
        }

        let count = u32::from_le_bytes(bytes[12..16].try_into().unwrap());
        let dimensions = u32::from_le_bytes(bytes[16..20].try_into().unwrap());
        let vocab_offset = u64::from_le_bytes(bytes[24..32].try_into().unwrap());
        let vectors_offset = u64::from_le_bytes(bytes[32..40].try_into().unwrap());

        if vectors_offset % 64 != 0 {
            return Err(SnapshotError::Misaligned {
                offset: vectors_offset,
                alignment: 64,
            });
        }

        Ok(Self {
            version,
            count,
            dimensions,
            vocab_offset,
            vectors_offset,
        })
    }

    /// Write header to bytes (exactly 64 bytes)
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..8].copy_from_slice(&MAGIC);
        buf[8..12].copy_from_slice(&self.version.to_le_bytes());
        buf[12..16].copy_from_slice(&self.count.to_le_bytes());
        buf[16..20].copy_from_slice(&self.dimensions.to_le_bytes());
        buf[24..32].copy_from_slice(&self.vocab_offset.to_le_bytes());
        buf[32..40].copy_from_slice(&self.vectors_offset.to_le_bytes());
        buf
    }

    /// Total size of the vector section in bytes, `None` if the declared
    /// geometry overflows
    pub fn vectors_size(&self) -> Option<u64> {
        (self.count as u64)
            .checked_mul(self.dimensions as u64)?
            .checked_mul(std::mem::size_of::<f32>() as u64)
    }
}

/// Write a model to `path` as a .wvs snapshot
pub fn write<P: AsRef<Path>>(model: &WordVectors, path: P) -> Result<(), SnapshotError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    // Build the vocabulary entry table and string pool up front so the
    // vector section offset is known before anything is written.
    let mut entries: Vec<(u32, u16)> = Vec::with_capacity(model.len());
    let mut pool: Vec<u8> = Vec::new();
    for token in model.tokens() {
        if token.len() > u16::MAX as usize {
            return Err(SnapshotError::TokenTooLong(token.len()));
        }
        let offset = pool.len() as u32;
        pool.extend_from_slice(token.as_bytes());
        entries.push((offset, token.len() as u16));
    }

    let vocab_size = VOCAB_HEADER_SIZE + entries.len() * VOCAB_ENTRY_SIZE + pool.len();
    let vocab_offset = HEADER_SIZE as u64;
    let vectors_offset = align64(vocab_offset + vocab_size as u64);

    let header = SnapshotHeader {
        version: 1,
        count: model.len() as u32,
        dimensions: model.dim() as u32,
        vocab_offset,
        vectors_offset,
    };
    writer.write_all(&header.to_bytes())?;

    // Vocabulary section
    let string_pool_offset = (VOCAB_HEADER_SIZE + entries.len() * VOCAB_ENTRY_SIZE) as u32;
    writer.write_all(&(entries.len() as u32).to_le_bytes())?;
    writer.write_all(&string_pool_offset.to_le_bytes())?;
    for (offset, len) in &entries {
        writer.write_all(&offset.to_le_bytes())?;
        writer.write_all(&len.to_le_bytes())?;
        writer.write_all(&0u16.to_le_bytes())?;
    }
    writer.write_all(&pool)?;

    // Padding up to the aligned vector section
    let pad = vectors_offset - (vocab_offset + vocab_size as u64);
    writer.write_all(&vec![0u8; pad as usize])?;

    // Vector section, f32 LE
    for i in 0..model.len() {
        for &val in model.row(i) {
            writer.write_all(&val.to_le_bytes())?;
        }
    }

    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| SnapshotError::Io(e.into_error()))?
        .sync_all()?;
    Ok(())
}

fn align64(offset: u64) -> u64 {
    (offset + 63) & !63
}

/// Memory-mapped snapshot reader providing zero-copy access to vectors
///
/// The file should not be modified while the store is open; truncation
/// under a live mapping can SIGBUS. Byte-to-float conversion goes through
/// `bytemuck::try_cast_slice`, which checks alignment.
pub struct SnapshotStore {
    mmap: Mmap,
    header: SnapshotHeader,
    /// Absolute offset of the vocabulary string pool
    pool_offset: usize,
}

impl SnapshotStore {
    /// Open a .wvs file for reading
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        let header = SnapshotHeader::from_bytes(&mmap)?;

        // All size arithmetic is checked: a crafted header must not be able
        // to wrap the expected file size past the truncation check below.
        let vectors_end = header
            .vectors_size()
            .and_then(|size| header.vectors_offset.checked_add(size))
            .ok_or_else(|| {
                SnapshotError::Invalid(format!(
                    "vector section size overflows: {} x {} at offset {}",
                    header.count, header.dimensions, header.vectors_offset
                ))
            })?;
        if (mmap.len() as u64) < vectors_end {
            return Err(SnapshotError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("File truncated: expected {} bytes, got {}", vectors_end, mmap.len()),
            )));
        }

        // Validate the vocabulary section header against the file header
        let vocab_start = header.vocab_offset as usize;
        if vocab_start + VOCAB_HEADER_SIZE > mmap.len() {
            return Err(SnapshotError::Invalid(
                "Vocabulary section out of bounds".to_string(),
            ));
        }
        let entry_count =
            u32::from_le_bytes(mmap[vocab_start..vocab_start + 4].try_into().unwrap()) as usize;
        if entry_count != header.count as usize {
            return Err(SnapshotError::Invalid(format!(
                "Vocabulary entry count {} does not match header count {}",
                entry_count, header.count
            )));
        }
        let pool_rel =
            u32::from_le_bytes(mmap[vocab_start + 4..vocab_start + 8].try_into().unwrap()) as usize;
        let pool_offset = vocab_start + pool_rel;
        if pool_rel < VOCAB_HEADER_SIZE + entry_count * VOCAB_ENTRY_SIZE
            || pool_offset > header.vectors_offset as usize
        {
            return Err(SnapshotError::Invalid(format!(
                "String pool offset {} out of bounds",
                pool_rel
            )));
        }

        Ok(Self {
            mmap,
            header,
            pool_offset,
        })
    }

    /// Number of vectors in the snapshot
    pub fn len(&self) -> usize {
        self.header.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.header.count == 0
    }

    /// Vector dimensionality
    pub fn dim(&self) -> usize {
        self.header.dimensions as usize
    }

    /// Total size of the mapped file
    pub fn file_bytes(&self) -> usize {
        self.mmap.len()
    }

    /// Get the vector at `index` with zero-copy access
    pub fn vector(&self, index: usize) -> Result<&[f32], SnapshotError> {
        if index >= self.len() {
            return Err(SnapshotError::IndexOutOfBounds {
                index,
                count: self.len(),
            });
        }

        let row_size = self.dim() * std::mem::size_of::<f32>();
        let start = self.header.vectors_offset as usize + index * row_size;
        let bytes = &self.mmap[start..start + row_size];

        bytemuck::try_cast_slice(bytes).map_err(|_| SnapshotError::AlignmentError)
    }

    /// Get the token at `index`
    pub fn token(&self, index: usize) -> Result<&str, SnapshotError> {
        if index >= self.len() {
            return Err(SnapshotError::IndexOutOfBounds {
                index,
                count: self.len(),
            });
        }

        let entry_start =
            self.header.vocab_offset as usize + VOCAB_HEADER_SIZE + index * VOCAB_ENTRY_SIZE;
        let entry = &self.mmap[entry_start..entry_start + VOCAB_ENTRY_SIZE];
        let offset = u32::from_le_bytes(entry[0..4].try_into().unwrap()) as usize;
        let len = u16::from_le_bytes(entry[4..6].try_into().unwrap()) as usize;

        let pool = &self.mmap[self.pool_offset..self.header.vectors_offset as usize];
        if offset + len > pool.len() {
            return Err(SnapshotError::Invalid(format!(
                "Token out of bounds: offset={} len={} pool_size={}",
                offset,
                len,
                pool.len()
            )));
        }

        std::str::from_utf8(&pool[offset..offset + len])
            .map_err(|e| SnapshotError::Invalid(format!("Invalid UTF-8 in token: {}", e)))
    }

    /// Materialize the snapshot (or its first `limit` rows) as a `WordVectors`
    pub fn to_word_vectors(&self, limit: Option<usize>) -> Result<WordVectors, SnapshotError> {
        let take = limit.map_or(self.len(), |l| l.min(self.len()));
        let mut model = WordVectors::with_capacity(self.dim(), take);
        for i in 0..take {
            model.push(self.token(i)?, self.vector(i)?)?;
        }
        Ok(model)
    }
}
