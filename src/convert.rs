//! Model format conversion
//!
//! The converter is a linear two-step sequence: load the source model in
//! its format, save it to the destination in the target format. Errors are
//! surfaced immediately; there is no retry and no partial-write recovery.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::formats::{self, Format, FormatError, LoadOptions};

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Source file not found: {0:?}")]
    SourceNotFound(PathBuf),

    #[error("Destination not writable: {path:?}")]
    DestinationNotWritable {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Options for a single conversion
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    /// Source format; detected from the path when omitted
    pub from: Option<Format>,
    /// Destination format; inferred from the destination extension when omitted
    pub to: Option<Format>,
    /// Read at most this many vectors from the source
    pub limit: Option<usize>,
}

/// What a completed conversion produced
#[derive(Debug, Clone, Copy)]
pub struct ConvertReport {
    pub vocab: usize,
    pub dims: usize,
    pub from: Format,
    pub to: Format,
}

/// Convert the model at `source` into `dest`
///
/// A missing source fails before anything is written. An unwritable
/// destination fails at file creation, leaving any pre-existing file at
/// that path untouched.
pub fn convert(
    source: &Path,
    dest: &Path,
    options: &ConvertOptions,
) -> Result<ConvertReport, ConvertError> {
    if !source.exists() {
        return Err(ConvertError::SourceNotFound(source.to_path_buf()));
    }

    let from = match options.from {
        Some(format) => format,
        None => formats::detect(source)?,
    };
    let to = match options.to {
        Some(format) => format,
        None => Format::from_extension(dest)
            .ok_or_else(|| FormatError::UnknownFormat(dest.to_path_buf()))?,
    };

    tracing::info!("Loading {} model from {:?}", from, source);
    let model = formats::load(source, from, &LoadOptions { limit: options.limit })?;
    tracing::info!("Loaded {} vectors of dimension {}", model.len(), model.dim());

    tracing::info!("Writing {} model to {:?}", to, dest);
    formats::save(&model, dest, to).map_err(|e| {
        if e.is_permission_denied() {
            ConvertError::DestinationNotWritable {
                path: dest.to_path_buf(),
                source: e,
            }
        } else {
            ConvertError::Format(e)
        }
    })?;

    Ok(ConvertReport {
        vocab: model.len(),
        dims: model.dim(),
        from,
        to,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WordVectors;
    use tempfile::tempdir;

    #[test]
    fn test_convert_snapshot_to_text() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("model.wvs");
        let dest = dir.path().join("model.vec");

        let mut model = WordVectors::new(2);
        model.push("cat", &[1.0, 2.0]).unwrap();
        model.push("dog", &[3.0, 4.0]).unwrap();
        crate::snapshot::write(&model, &source).unwrap();

        let report = convert(&source, &dest, &ConvertOptions::default()).unwrap();
        assert_eq!(report.vocab, 2);
        assert_eq!(report.dims, 2);
        assert_eq!(report.from, Format::Snapshot);
        assert_eq!(report.to, Format::Word2vecText);

        let content = std::fs::read_to_string(&dest).unwrap();
        assert_eq!(content, "2 2\ncat 1 2\ndog 3 4\n");
    }

    #[test]
    fn test_missing_source_produces_no_output() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("nope.wvs");
        let dest = dir.path().join("out.vec");

        let result = convert(&source, &dest, &ConvertOptions::default());
        assert!(matches!(result, Err(ConvertError::SourceNotFound(_))));
        assert!(!dest.exists());
    }

    #[test]
    fn test_unknown_destination_format() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("model.wvs");
        let dest = dir.path().join("out.mystery");

        let mut model = WordVectors::new(1);
        model.push("cat", &[1.0]).unwrap();
        crate::snapshot::write(&model, &source).unwrap();

        let result = convert(&source, &dest, &ConvertOptions::default());
        assert!(matches!(
            result,
            Err(ConvertError::Format(FormatError::UnknownFormat(_)))
        ));
        assert!(!dest.exists());
    }

    #[test]
    fn test_explicit_formats_override_extensions() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("input.dat");
        let dest = dir.path().join("output.dat");

        std::fs::write(&source, "1 2\ncat 1 2\n").unwrap();

        let report = convert(
            &source,
            &dest,
            &ConvertOptions {
                from: Some(Format::Word2vecText),
                to: Some(Format::Word2vecBinary),
                limit: None,
            },
        )
        .unwrap();
        assert_eq!(report.vocab, 1);

        let reloaded =
            formats::load(&dest, Format::Word2vecBinary, &LoadOptions::default()).unwrap();
        assert_eq!(reloaded.get("cat"), Some(&[1.0, 2.0][..]));
    }

    #[test]
    fn test_limit_caps_conversion() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("input.vec");
        let dest = dir.path().join("output.bin");

        std::fs::write(&source, "3 1\na 1\nb 2\nc 3\n").unwrap();

        let report = convert(
            &source,
            &dest,
            &ConvertOptions {
                from: None,
                to: None,
                limit: Some(2),
            },
        )
        .unwrap();
        assert_eq!(report.vocab, 2);
    }
}
