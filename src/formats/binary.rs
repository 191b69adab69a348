//! word2vec binary format
//!
//! ```text
//! <vocab_size> <dimensions>\n          ASCII header
//! <token> <f32 × dimensions>\n         per record: token bytes, one space,
//! ...                                  dimensions little-endian f32 values
//! ```
//!
//! The read path memory-maps the file and walks the records in place; only
//! the requested rows are materialized. Newlines between records are
//! tolerated but not required, matching the variants of this format found
//! in the wild.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use memmap2::Mmap;

use super::{parse_header, FormatError, LoadOptions};
use crate::model::WordVectors;

/// Longest token accepted before a record is declared malformed
const MAX_TOKEN_BYTES: usize = 1 << 16;

/// Read a word2vec binary model file
pub fn read<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<WordVectors, FormatError> {
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };
    let bytes: &[u8] = &mmap;

    let header_end = bytes
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| FormatError::InvalidHeader("missing header line".to_string()))?;
    let header = std::str::from_utf8(&bytes[..header_end])
        .map_err(|_| FormatError::InvalidHeader("header is not ASCII".to_string()))?;
    let (count, dims) = parse_header(header)?;

    let take = options.limit.map_or(count, |l| l.min(count));
    let body_len = bytes.len() - (header_end + 1);

    // The declared geometry must fit in the file before it sizes any
    // allocation: a record holds at least a one-byte token, a space, and
    // `dims` little-endian f32 values.
    let fits = dims
        .checked_mul(std::mem::size_of::<f32>())
        .and_then(|row| row.checked_add(2))
        .and_then(|row| row.checked_mul(take))
        .map_or(false, |total| total <= body_len);
    if take > 0 && !fits {
        return Err(FormatError::InvalidHeader(format!(
            "declared size {} x {} exceeds file size of {} bytes",
            count,
            dims,
            bytes.len()
        )));
    }

    let mut model = WordVectors::with_capacity(dims, take);
    if take == 0 {
        return Ok(model);
    }
    let row_bytes = dims * std::mem::size_of::<f32>();
    let mut vector = Vec::with_capacity(dims);
    let mut pos = header_end + 1;

    for index in 0..take {
        // Skip record separators left by the writer
        while pos < bytes.len() && (bytes[pos] == b'\n' || bytes[pos] == b'\r') {
            pos += 1;
        }

        let token_start = pos;
        while pos < bytes.len() && bytes[pos] != b' ' {
            if pos - token_start >= MAX_TOKEN_BYTES {
                return Err(FormatError::MalformedRecord {
                    index,
                    reason: "unterminated token".to_string(),
                });
            }
            pos += 1;
        }
        if pos >= bytes.len() {
            return Err(FormatError::Truncated {
                expected: take,
                actual: index,
            });
        }
        let token = std::str::from_utf8(&bytes[token_start..pos]).map_err(|e| {
            FormatError::MalformedRecord {
                index,
                reason: format!("token is not UTF-8: {}", e),
            }
        })?;
        pos += 1; // separating space

        if pos + row_bytes > bytes.len() {
            return Err(FormatError::Truncated {
                expected: take,
                actual: index,
            });
        }
        vector.clear();
        for chunk in bytes[pos..pos + row_bytes].chunks_exact(4) {
            vector.push(f32::from_le_bytes(chunk.try_into().unwrap()));
        }
        pos += row_bytes;

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

/// Write a model as a word2vec binary file
pub fn write<P: AsRef<Path>>(model: &WordVectors, path: P) -> Result<(), FormatError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{} {}", model.len(), model.dim())?;
    for (token, row) in model.iter() {
        writer.write_all(token.as_bytes())?;
        writer.write_all(b" ")?;
        for &val in row {
            writer.write_all(&val.to_le_bytes())?;
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
