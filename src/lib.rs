//! vecport: word-vector model format converter
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     convert(src, dst)                       │
//! │                 load in one format, save in another         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │            formats: detection + codec dispatch              │
//! │        snapshot (.wvs) · word2vec .bin · word2vec .vec      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              WordVectors (in-memory model)                  │
//! │         token → f32 vector, insertion-ordered               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Snapshot files are read zero-copy through an mmap (`SnapshotStore`);
//! the word2vec binary reader also walks a mapping rather than streaming
//! the whole file through a buffer.

pub mod convert;
pub mod formats;
pub mod model;
pub mod snapshot;

pub use convert::{convert, ConvertError, ConvertOptions, ConvertReport};
pub use formats::{Format, LoadOptions};
pub use model::WordVectors;
pub use snapshot::SnapshotStore;
