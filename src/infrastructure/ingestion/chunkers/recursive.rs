//! Recursive character chunking strategy

use std::collections::VecDeque;

use crate::domain::ingestion::{Chunk, ChunkingConfig, ChunkingStrategy, Document};
use crate::domain::RagError;

/// Separators tried in priority order: paragraph, line, word, character
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Chunking strategy that recursively splits text on a separator hierarchy
///
/// The first separator present in the text is used to cut it into pieces,
/// each piece keeping the separator that preceded it. Small pieces are merged
/// greedily into windows of at most `chunk_size` characters, retaining up to
/// `chunk_overlap` characters of trailing pieces between windows. Pieces that
/// are too long on their own are split again with the remaining separators.
/// Lengths are measured in `char`s.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    separators: Vec<String>,
}

impl RecursiveChunker {
    /// Create a new recursive chunker with the default separators
    pub fn new() -> Self {
        Self::with_separators(DEFAULT_SEPARATORS)
    }

    pub fn with_separators<I, S>(separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            separators: separators.into_iter().map(Into::into).collect(),
        }
    }

    fn split_text(&self, text: &str, separators: &[String], config: &ChunkingConfig) -> Vec<String> {
        let (separator, remaining) = select_separator(text, separators);

        let mut chunks = Vec::new();
        let mut good_splits: Vec<&str> = Vec::new();

        for split in split_keeping_separator(text, separator) {
            if char_len(split) < config.chunk_size {
                good_splits.push(split);
                continue;
            }

            if !good_splits.is_empty() {
                chunks.extend(merge_splits(&good_splits, config));
                good_splits.clear();
            }

            if remaining.is_empty() {
                chunks.push(split.to_string());
            } else {
                chunks.extend(self.split_text(split, remaining, config));
            }
        }

        if !good_splits.is_empty() {
            chunks.extend(merge_splits(&good_splits, config));
        }

        chunks
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkingStrategy for RecursiveChunker {
    fn chunk(&self, document: &Document, config: &ChunkingConfig) -> Result<Vec<Chunk>, RagError> {
        config.validate()?;

        let text = document.text();
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        if char_len(text) <= config.chunk_size {
            return Ok(vec![Chunk::from_document(document, text, 0)]);
        }

        let pieces: Vec<String> = self
            .split_text(text, &self.separators, config)
            .into_iter()
            .filter(|piece| !piece.trim().is_empty())
            .collect();

        let chunks: Vec<Chunk> = with_offsets(text, pieces, config.chunk_overlap)
            .into_iter()
            .map(|(piece, offset)| Chunk::from_document(document, piece, offset))
            .collect();

        tracing::debug!(
            source = document.source(),
            chunk_count = chunks.len(),
            "Chunked document"
        );

        Ok(chunks)
    }

    fn name(&self) -> &'static str {
        "recursive"
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// First separator that occurs in `text`, plus the finer separators after it
fn select_separator<'a>(text: &str, separators: &'a [String]) -> (&'a str, &'a [String]) {
    for (i, separator) in separators.iter().enumerate() {
        if separator.is_empty() {
            return ("", &[]);
        }

        if text.contains(separator.as_str()) {
            return (separator, &separators[i + 1..]);
        }
    }

    (separators.last().map(String::as_str).unwrap_or(""), &[])
}

/// Split `text` before every occurrence of `separator`, dropping empty pieces
///
/// An empty separator splits into single characters.
fn split_keeping_separator<'t>(text: &'t str, separator: &str) -> Vec<&'t str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;

    for (position, _) in text.match_indices(separator) {
        if position > start {
            pieces.push(&text[start..position]);
        }
        start = position;
    }

    pieces.push(&text[start..]);
    pieces.retain(|piece| !piece.is_empty());
    pieces
}

/// Greedily merge pieces shorter than `chunk_size` into windows
fn merge_splits(splits: &[&str], config: &ChunkingConfig) -> Vec<String> {
    let mut windows = Vec::new();
    let mut current: VecDeque<(&str, usize)> = VecDeque::new();
    let mut total = 0;

    for &split in splits {
        let len = char_len(split);

        if total + len > config.chunk_size && !current.is_empty() {
            if let Some(window) = join_window(&current) {
                windows.push(window);
            }

            while total > config.chunk_overlap || (total + len > config.chunk_size && total > 0) {
                let Some((_, dropped)) = current.pop_front() else {
                    break;
                };
                total -= dropped;
            }
        }

        current.push_back((split, len));
        total += len;
    }

    if let Some(window) = join_window(&current) {
        windows.push(window);
    }

    windows
}

fn join_window(pieces: &VecDeque<(&str, usize)>) -> Option<String> {
    let joined: String = pieces.iter().map(|(piece, _)| *piece).collect();
    let trimmed = joined.trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Pair each chunk with its character offset in `text`
///
/// Each search starts `overlap` characters before the end of the previous
/// chunk so repeated passages resolve to the right occurrence.
fn with_offsets(text: &str, pieces: Vec<String>, overlap: usize) -> Vec<(String, usize)> {
    let mut index: usize = 0;
    let mut previous_len: usize = 0;

    pieces
        .into_iter()
        .map(|piece| {
            let start = (index + previous_len).saturating_sub(overlap);
            index = find_from(text, &piece, start)
                .or_else(|| find_from(text, &piece, 0))
                .unwrap_or(start);
            previous_len = char_len(&piece);
            (piece, index)
        })
        .collect()
}

/// Character index of the first occurrence of `needle` at or after `char_start`
fn find_from(text: &str, needle: &str, char_start: usize) -> Option<usize> {
    let byte_start = text
        .char_indices()
        .nth(char_start)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len());

    text[byte_start..]
        .find(needle)
        .map(|byte| char_start + char_len(&text[byte_start..byte_start + byte]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<Chunk> {
        RecursiveChunker::new()
            .chunk(
                &Document::plain(text, "doc.txt"),
                &ChunkingConfig::new(size, overlap),
            )
            .unwrap()
    }

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text()).collect()
    }

    #[test]
    fn test_short_document_yields_single_verbatim_chunk() {
        let chunks = chunk_text("Promtior was founded in May 2023.", 1000, 200);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text(), "Promtior was founded in May 2023.");
        assert_eq!(chunks[0].offset(), 0);
        assert_eq!(chunks[0].source(), "doc.txt");
    }

    #[test]
    fn test_blank_document_yields_no_chunks() {
        assert!(chunk_text("   \n\n  ", 10, 2).is_empty());
        assert!(chunk_text("", 10, 2).is_empty());
    }

    #[test]
    fn test_word_windows_with_overlap() {
        let chunks = chunk_text("aaaa bbbb cccc dddd eeee", 10, 5);

        assert_eq!(
            texts(&chunks),
            vec!["aaaa bbbb", "bbbb cccc", "cccc dddd", "dddd eeee"]
        );
        let offsets: Vec<usize> = chunks.iter().map(|c| c.offset()).collect();
        assert_eq!(offsets, vec![0, 5, 10, 15]);
    }

    #[test]
    fn test_paragraphs_are_preferred_split_points() {
        let text = "First paragraph here.\n\nSecond paragraph here.";
        let chunks = chunk_text(text, 25, 0);

        assert_eq!(
            texts(&chunks),
            vec!["First paragraph here.", "Second paragraph here."]
        );
        assert_eq!(chunks[1].offset(), 23);
    }

    #[test]
    fn test_long_word_is_split_by_characters() {
        let chunks = chunk_text("abcdefghij", 4, 1);

        assert!(chunks.iter().all(|c| c.char_len() <= 4));
        assert_eq!(texts(&chunks), vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn test_multibyte_text_is_measured_in_chars() {
        let text = "ñandú ñandú ñandú";
        let chunks = chunk_text(text, 11, 0);

        assert_eq!(texts(&chunks), vec!["ñandú ñandú", "ñandú"]);
        assert_eq!(chunks[1].offset(), 12);
    }

    #[test]
    fn test_split_keeping_separator_attaches_to_following_piece() {
        assert_eq!(
            split_keeping_separator("a\n\n\n\nb", "\n\n"),
            vec!["a", "\n\n", "\n\nb"]
        );
        assert_eq!(split_keeping_separator("ab", ""), vec!["a", "b"]);
    }

    #[test]
    fn test_select_separator_falls_through_to_characters() {
        let separators: Vec<String> = DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect();

        let (separator, remaining) = select_separator("one two", &separators);
        assert_eq!(separator, " ");
        assert_eq!(remaining, &separators[3..]);

        let (separator, remaining) = select_separator("word", &separators);
        assert_eq!(separator, "");
        assert!(remaining.is_empty());
    }

    #[test]
    fn test_chunks_inherit_pdf_page_format() {
        let document = Document::pdf_page("one two three four", "about.pdf", 3);
        let chunks = RecursiveChunker::new()
            .chunk(&document, &ChunkingConfig::new(8, 0))
            .unwrap();

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.format() == document.format()));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = RecursiveChunker::new().chunk(
            &Document::plain("text", "doc.txt"),
            &ChunkingConfig::new(10, 10),
        );

        assert!(matches!(result, Err(RagError::Configuration { .. })));
    }

    proptest! {
        #[test]
        fn prop_chunks_respect_size_and_overlap_deterministically(
            text in "[a-z \n]{0,400}",
            size in 1usize..80,
            overlap_ratio in 0.0f64..1.0,
        ) {
            let overlap = (size as f64 * overlap_ratio) as usize;
            let first = chunk_text(&text, size, overlap);
            let second = chunk_text(&text, size, overlap);

            prop_assert_eq!(&first, &second);

            for chunk in &first {
                prop_assert!(chunk.char_len() <= size);
                prop_assert!(!chunk.text().trim().is_empty());

                let at_offset: String = text
                    .chars()
                    .skip(chunk.offset())
                    .take(chunk.char_len())
                    .collect();
                prop_assert_eq!(at_offset.as_str(), chunk.text());
            }

            for pair in first.windows(2) {
                let previous_end = pair[0].offset() + pair[0].char_len();
                if pair[1].offset() < previous_end {
                    prop_assert!(previous_end - pair[1].offset() <= overlap);
                }
            }
        }
    }
}
