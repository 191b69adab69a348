//! Model format detection and dispatch
//!
//! Three on-disk serializations are supported:
//!
//! - `Snapshot` — the native mmap container (`.wvs`, also `.model`)
//! - `Word2vecBinary` — classic word2vec binary (`.bin`)
//! - `Word2vecText` — plain-text word-vector format (`.vec`, `.txt`)
//!
//! Formats are resolved from the file extension, with a magic-byte sniff as
//! fallback for snapshot files with unusual names. `load`/`save` dispatch to
//! the per-format codecs, so adding an encoding means adding one codec
//! module and one enum arm.

pub mod binary;
pub mod text;

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::model::{ModelError, WordVectors};
use crate::snapshot::{self, SnapshotError, SnapshotStore};

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Cannot determine model format for {0:?}: unknown extension and no recognizable magic")]
    UnknownFormat(PathBuf),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Malformed record for vector #{index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    #[error("Truncated model file: expected {expected} vectors, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl FormatError {
    /// True if the underlying cause is a filesystem permission error
    pub fn is_permission_denied(&self) -> bool {
        match self {
            FormatError::Io(e) => e.kind() == io::ErrorKind::PermissionDenied,
            FormatError::Snapshot(SnapshotError::Io(e)) => {
                e.kind() == io::ErrorKind::PermissionDenied
            }
            _ => false,
        }
    }
}

/// On-disk model serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Native mmap snapshot container (.wvs)
    Snapshot,
    /// word2vec binary format (.bin)
    Word2vecBinary,
    /// word2vec plain-text format (.vec, .txt)
    Word2vecText,
}

impl Format {
    /// Resolve a format from a file extension
    pub fn from_extension(path: &Path) -> Option<Format> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("wvs") | Some("model") => Some(Format::Snapshot),
            Some("bin") => Some(Format::Word2vecBinary),
            Some("vec") | Some("txt") => Some(Format::Word2vecText),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Snapshot => "snapshot",
            Format::Word2vecBinary => "word2vec-bin",
            Format::Word2vecText => "word2vec-text",
        };
        f.write_str(name)
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "snapshot" | "wvs" => Ok(Format::Snapshot),
            "word2vec-bin" | "bin" | "binary" => Ok(Format::Word2vecBinary),
            "word2vec-text" | "text" | "vec" | "txt" => Ok(Format::Word2vecText),
            _ => Err(format!(
                "unknown format {:?} (expected snapshot, word2vec-bin, or word2vec-text)",
                s
            )),
        }
    }
}

/// Detect the format of an existing file: extension first, then magic bytes
pub fn detect(path: &Path) -> Result<Format, FormatError> {
    if let Some(format) = Format::from_extension(path) {
        return Ok(format);
    }

    let mut magic = [0u8; 8];
    let mut file = File::open(path)?;
    if file.read_exact(&mut magic).is_ok() && magic == snapshot::MAGIC {
        return Ok(Format::Snapshot);
    }

    Err(FormatError::UnknownFormat(path.to_path_buf()))
}

/// Options applied when loading a model
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Read at most this many vectors from the source
    pub limit: Option<usize>,
}

/// Load a model from `path` in the given format
pub fn load(path: &Path, format: Format, options: &LoadOptions) -> Result<WordVectors, FormatError> {
    match format {
        Format::Snapshot => {
            let store = SnapshotStore::open(path)?;
            Ok(store.to_word_vectors(options.limit)?)
        }
        Format::Word2vecBinary => binary::read(path, options),
        Format::Word2vecText => text::read(path, options),
    }
}

/// Save a model to `path` in the given format
pub fn save(model: &WordVectors, path: &Path, format: Format) -> Result<(), FormatError> {
    match format {
        Format::Snapshot => Ok(snapshot::write(model, path)?),
        Format::Word2vecBinary => binary::write(model, path),
        Format::Word2vecText => text::write(model, path),
    }
}

/// Summary of a model file, readable without materializing the vectors
#[derive(Debug, Clone, Copy)]
pub struct ModelInfo {
    pub vocab: usize,
    pub dims: usize,
    pub file_bytes: u64,
}

/// Read vocabulary size and dimensionality from a model file's header
pub fn describe(path: &Path, format: Format) -> Result<ModelInfo, FormatError> {
    let file_bytes = std::fs::metadata(path)?.len();
    let (vocab, dims) = match format {
        Format::Snapshot => {
            let store = SnapshotStore::open(path)?;
            (store.len(), store.dim())
        }
        Format::Word2vecBinary => binary::read_header(path)?,
        Format::Word2vecText => text::read_header(path)?,
    };
    Ok(ModelInfo {
        vocab,
        dims,
        file_bytes,
    })
}

/// Parse a `<vocab> <dims>` header line shared by the word2vec formats
pub(crate) fn parse_header(line: &str) -> Result<(usize, usize), FormatError> {
    let mut fields = line.split_ascii_whitespace();
    let count = fields
        .next()
        .and_then(|f| f.parse::<usize>().ok())
        .ok_or_else(|| FormatError::InvalidHeader(format!("bad vocabulary count in {:?}", line)))?;
    let dims = fields
        .next()
        .and_then(|f| f.parse::<usize>().ok())
        .ok_or_else(|| FormatError::InvalidHeader(format!("bad dimensionality in {:?}", line)))?;
    if fields.next().is_some() {
        return Err(FormatError::InvalidHeader(format!(
            "expected exactly two header fields, got {:?}",
            line
        )));
    }
    Ok((count, dims))
}
