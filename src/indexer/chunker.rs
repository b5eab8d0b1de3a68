use crate::error::{RagError, Result};

/// Splits text into overlapping fixed-size character windows.
///
/// Each chunk holds at most `chunk_size` characters and starts
/// `chunk_size - overlap` characters after the previous one, so consecutive
/// chunks share their boundary text and nothing is lost across a split. The
/// last chunk may be shorter. All slicing happens on char boundaries.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 || overlap == 0 {
            return Err(RagError::InvalidConfiguration(format!(
                "chunk size and overlap must be positive (got size={chunk_size}, overlap={overlap})"
            )));
        }
        if overlap >= chunk_size {
            return Err(RagError::InvalidConfiguration(format!(
                "overlap ({overlap}) must be smaller than chunk size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    /// Lazily iterate over the chunks of `text`. Calling `split` again
    /// restarts from the beginning. Empty input yields no chunks.
    pub fn split<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            text,
            chunk_chars: self.chunk_size,
            stride_chars: self.chunk_size - self.overlap,
            start: 0,
            done: false,
        }
    }
}

pub struct Chunks<'a> {
    text: &'a str,
    chunk_chars: usize,
    stride_chars: usize,
    start: usize,
    done: bool,
}

/// Byte offset of the `chars`-th character of `s`, or `s.len()` if `s` is
/// shorter than that.
fn char_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map(|(i, _)| i).unwrap_or(s.len())
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.done || self.start >= self.text.len() {
            return None;
        }
        let rest = &self.text[self.start..];
        let end = char_offset(rest, self.chunk_chars);
        if end == rest.len() {
            // This window reaches the end of the input; it is the last chunk.
            self.done = true;
        } else {
            self.start += char_offset(rest, self.stride_chars);
        }
        Some(&rest[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(text: &str, size: usize, overlap: usize) -> Vec<String> {
        Chunker::new(size, overlap)
            .unwrap()
            .split(text)
            .map(str::to_string)
            .collect()
    }

    /// Dropping each later chunk's leading overlap chars and concatenating
    /// must reproduce the input exactly.
    fn reconstruct(chunks: &[String], overlap: usize) -> String {
        let mut out = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                out.push_str(chunk);
            } else {
                out.extend(chunk.chars().skip(overlap));
            }
        }
        out
    }

    #[test]
    fn chunking_is_lossless() {
        let text: String = (0..997).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        for (size, overlap) in [(800, 150), (100, 30), (7, 3), (4, 2)] {
            let chunks = collect(&text, size, overlap);
            assert_eq!(reconstruct(&chunks, overlap), text, "size={size} overlap={overlap}");
            for chunk in &chunks {
                assert!(chunk.chars().count() <= size);
            }
        }
    }

    #[test]
    fn short_input_yields_single_chunk() {
        let chunks = collect("short", 100, 10);
        assert_eq!(chunks, vec!["short".to_string()]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(collect("", 100, 10).is_empty());
    }

    #[test]
    fn stride_is_size_minus_overlap() {
        let text: String = ('a'..='z').collect();
        let chunks = collect(&text, 10, 4);
        // Starts at 0, 6, 12, 18; the final window is short.
        assert_eq!(chunks, vec!["abcdefghij", "ghijklmnop", "mnopqrstuv", "stuvwxyz"]);
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let text = "すべてのチャンクは文字境界で切られることを確認するテスト文章です。";
        let chunks = collect(text, 10, 3);
        assert!(!chunks.is_empty());
        assert_eq!(reconstruct(&chunks, 3), text);
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        assert!(matches!(Chunker::new(100, 100), Err(RagError::InvalidConfiguration(_))));
        assert!(matches!(Chunker::new(100, 150), Err(RagError::InvalidConfiguration(_))));
    }

    #[test]
    fn zero_parameters_are_rejected() {
        assert!(matches!(Chunker::new(0, 10), Err(RagError::InvalidConfiguration(_))));
        assert!(matches!(Chunker::new(100, 0), Err(RagError::InvalidConfiguration(_))));
    }

    #[test]
    fn split_is_restartable() {
        let chunker = Chunker::new(10, 3).unwrap();
        let text = "the quick brown fox jumps over the lazy dog";
        let first: Vec<_> = chunker.split(text).collect();
        let second: Vec<_> = chunker.split(text).collect();
        assert_eq!(first, second);
    }
}
