//! In-memory word-vector model
//!
//! A `WordVectors` maps vocabulary tokens to fixed-length f32 embeddings.
//! Vectors are stored in one contiguous row-major buffer; tokens keep their
//! insertion order, and every writer emits rows in that order, so a
//! load/save cycle preserves row order exactly.

use std::collections::HashMap;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Duplicate token: {0:?}")]
    DuplicateToken(String),

    #[error("Invalid token (empty or contains whitespace): {0:?}")]
    InvalidToken(String),
}

/// A vocabulary of tokens with one fixed-length vector per token.
///
/// Tokens must be non-empty and free of whitespace so that every on-disk
/// format (all of which delimit tokens with spaces and newlines) can
/// serialize the model without escaping.
pub struct WordVectors {
    dim: usize,
    tokens: Vec<String>,
    index: HashMap<String, usize>,
    data: Vec<f32>,
}

impl WordVectors {
    /// Create an empty model with the given dimensionality
    pub fn new(dim: usize) -> Self {
        Self::with_capacity(dim, 0)
    }

    /// Create an empty model with room for `capacity` vectors
    pub fn with_capacity(dim: usize, capacity: usize) -> Self {
        Self {
            dim,
            tokens: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            data: Vec::with_capacity(capacity * dim),
        }
    }

    /// Append a token and its vector
    pub fn push(&mut self, token: &str, vector: &[f32]) -> Result<(), ModelError> {
        if vector.len() != self.dim {
            return Err(ModelError::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        if token.is_empty() || token.contains([' ', '\t', '\n', '\r']) {
            return Err(ModelError::InvalidToken(token.to_string()));
        }
        if self.index.contains_key(token) {
            return Err(ModelError::DuplicateToken(token.to_string()));
        }

        self.index.insert(token.to_string(), self.tokens.len());
        self.tokens.push(token.to_string());
        self.data.extend_from_slice(vector);
        Ok(())
    }

    /// Vocabulary size
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Vector dimensionality
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Look up a token's vector
    pub fn get(&self, token: &str) -> Option<&[f32]> {
        self.index.get(token).map(|&i| self.row(i))
    }

    /// Vector for the row at `index` (insertion order)
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn row(&self, index: usize) -> &[f32] {
        &self.data[index * self.dim..(index + 1) * self.dim]
    }

    /// Tokens in insertion order
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Iterate over `(token, vector)` pairs in insertion order
    pub fn iter(&self) -> EntryIter<'_> {
        EntryIter {
            model: self,
            index: 0,
        }
    }
}

/// Iterator over `(token, vector)` pairs
pub struct EntryIter<'a> {
    model: &'a WordVectors,
    index: usize,
}

impl<'a> Iterator for EntryIter<'a> {
    type Item = (&'a str, &'a [f32]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.model.len() {
            return None;
        }
        let token = self.model.tokens[self.index].as_str();
        let row = self.model.row(self.index);
        self.index += 1;
        Some((token, row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.model.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for EntryIter<'a> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_get() {
        let mut model = WordVectors::new(2);
        model.push("cat", &[1.0, 2.0]).unwrap();
        model.push("dog", &[3.0, 4.0]).unwrap();

        assert_eq!(model.len(), 2);
        assert_eq!(model.dim(), 2);
        assert_eq!(model.get("cat"), Some(&[1.0, 2.0][..]));
        assert_eq!(model.get("dog"), Some(&[3.0, 4.0][..]));
        assert_eq!(model.get("bird"), None);
    }

    #[test]
    fn test_iteration_order_is_insertion_order() {
        let mut model = WordVectors::new(1);
        for (i, token) in ["zebra", "apple", "mango"].iter().enumerate() {
            model.push(token, &[i as f32]).unwrap();
        }

        let tokens: Vec<_> = model.iter().map(|(t, _)| t).collect();
        assert_eq!(tokens, vec!["zebra", "apple", "mango"]);
        assert_eq!(model.iter().len(), 3);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut model = WordVectors::new(4);
        let result = model.push("cat", &[1.0, 2.0]);
        assert!(matches!(
            result,
            Err(ModelError::DimensionMismatch {
                expected: 4,
                actual: 2
            })
        ));
        assert!(model.is_empty());
    }

    #[test]
    fn test_duplicate_token_rejected() {
        let mut model = WordVectors::new(1);
        model.push("cat", &[1.0]).unwrap();
        let result = model.push("cat", &[2.0]);
        assert!(matches!(result, Err(ModelError::DuplicateToken(_))));
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn test_whitespace_token_rejected() {
        let mut model = WordVectors::new(1);
        assert!(matches!(
            model.push("two words", &[1.0]),
            Err(ModelError::InvalidToken(_))
        ));
        assert!(matches!(
            model.push("", &[1.0]),
            Err(ModelError::InvalidToken(_))
        ));
        assert!(matches!(
            model.push("line\nbreak", &[1.0]),
            Err(ModelError::InvalidToken(_))
        ));
    }
}
