//! word2vec plain-text format
//!
//! ```text
//! <vocab_size> <dimensions>
//! <token> <v1> <v2> ... <vN>
//! ...
//! ```
//!
//! One line per token, fields separated by single spaces. Floats are written
//! with `f32`'s `Display` (the shortest representation that round-trips), so
//! writing the same model twice produces byte-identical files.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use super::{parse_header, FormatError, LoadOptions};
use crate::model::WordVectors;

/// Read a plain-text model file
pub fn read<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<WordVectors, FormatError> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut reader = BufReader::new(file);

    let mut line = String::new();
    reader.read_line(&mut line)?;
    let (count, dims) = parse_header(line.trim_end_matches(['\r', '\n']))?;

    let take = options.limit.map_or(count, |l| l.min(count));

    // The declared geometry must fit in the file before it sizes any
    // allocation: a text row holds a token, `dims` components of at least
    // two bytes each, and a newline.
    let fits = dims
        .checked_mul(2)
        .and_then(|row| row.checked_add(2))
        .and_then(|row| row.checked_mul(take))
        .map_or(false, |total| total as u64 <= file_len);
    if take > 0 && !fits {
        return Err(FormatError::InvalidHeader(format!(
            "declared size {} x {} exceeds file size of {} bytes",
            count, dims, file_len
        )));
    }

    let mut model = WordVectors::with_capacity(dims, take);
    if take == 0 {
        return Ok(model);
    }
    let mut vector = Vec::with_capacity(dims);

    for index in 0..take {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(FormatError::Truncated {
                expected: take,
                actual: index,
            });
        }

        let row = line.trim_end_matches(['\r', '\n']);
        let mut fields = row.split(' ');
        let token = fields.next().ok_or_else(|| FormatError::MalformedRecord {
            index,
            reason: "empty line".to_string(),
        })?;

        vector.clear();
        for field in fields {
            let value = field.parse::<f32>().map_err(|e| FormatError::MalformedRecord {
                index,
                reason: format!("bad float {:?}: {}", field, e),
            })?;
            vector.push(value);
        }
        if vector.len() != dims {
            return Err(FormatError::MalformedRecord {
                index,
                reason: format!("expected {} components, got {}", dims, vector.len()),
            });
        }

        model.push(token, &vector)?;
    }

    Ok(model)
}

/// Read only the `<vocab> <dims>` header line
pub fn read_header<P: AsRef<Path>>(path: P) -> Result<(usize, usize), FormatError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut line = String::new();
    reader.read_line(&mut line)?;
    parse_header(line.trim_end_matches(['\r', '\n']))
}

/// Write a model as a plain-text file
pub fn write<P: AsRef<Path>>(model: &WordVectors, path: P) -> Result<(), FormatError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{} {}", model.len(), model.dim())?;
    for (token, row) in model.iter() {
        writer.write_all(token.as_bytes())?;
        for &val in row {
            write!(writer, " {}", val)?;
        }
        writer.write_all(b"\n")?;
    }

    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| FormatError::Io(e.into_error()))?
        .sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vectors.vec");

        let mut model = WordVectors::new(2);
        model.push("cat", &[1.0, 2.0]).unwrap();
        model.push("dog", &[3.0, 4.0]).unwrap();
        write(&model, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines, vec!["2 2", "cat 1 2", "dog 3 4"]);
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vectors.vec");

        let mut model = WordVectors::new(3);
        model.push("alpha", &[0.5, -1.25, 3.0]).unwrap();
        model.push("beta", &[1e-7, 2.5e10, -0.0625]).unwrap();
        write(&model, &path).unwrap();

        let reloaded = read(&path, &LoadOptions::default()).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.dim(), 3);
        assert_eq!(reloaded.get("alpha"), Some(&[0.5, -1.25, 3.0][..]));
        assert_eq!(reloaded.get("beta"), Some(&[1e-7, 2.5e10, -0.0625][..]));
    }

    #[test]
    fn test_read_rejects_bad_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.vec");
        std::fs::write(&path, "hello world file\n").unwrap();

        assert!(matches!(
            read(&path, &LoadOptions::default()),
            Err(FormatError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_read_rejects_wrong_arity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.vec");
        std::fs::write(&path, "1 3\ncat 1 2\n").unwrap();

        let result = read(&path, &LoadOptions::default());
        assert!(matches!(
            result,
            Err(FormatError::MalformedRecord { index: 0, .. })
        ));
    }

    #[test]
    fn test_read_rejects_missing_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.vec");
        std::fs::write(&path, "3 2\nsomelongertoken 1 2\nanotherlongtoken 3 4\n").unwrap();

        assert!(matches!(
            read(&path, &LoadOptions::default()),
            Err(FormatError::Truncated {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_read_rejects_oversized_dimensionality() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hostile.vec");
        std::fs::write(&path, "1 4611686018427387904\ncat 1\n").unwrap();

        assert!(matches!(
            read(&path, &LoadOptions::default()),
            Err(FormatError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_read_rejects_oversized_vocabulary_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hostile.vec");
        std::fs::write(&path, "4611686018427387904 2\ncat 1 2\n").unwrap();

        assert!(matches!(
            read(&path, &LoadOptions::default()),
            Err(FormatError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_read_empty_model() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.vec");
        std::fs::write(&path, "0 300\n").unwrap();

        let model = read(&path, &LoadOptions::default()).unwrap();
        assert!(model.is_empty());
        assert_eq!(model.dim(), 300);
    }

    #[test]
    fn test_read_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vectors.vec");
        std::fs::write(&path, "3 1\na 1\nb 2\nc 3\n").unwrap();

        let model = read(&path, &LoadOptions { limit: Some(2) }).unwrap();
        assert_eq!(model.len(), 2);
        assert_eq!(model.tokens(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_read_header_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vectors.vec");
        std::fs::write(&path, "42 300\n").unwrap();

        assert_eq!(read_header(&path).unwrap(), (42, 300));
    }
}
