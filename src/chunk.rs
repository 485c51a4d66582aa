//! Fixed-size sliding-window text chunker.
//!
//! Splits document text into [`Chunk`]s of `chunk_size` characters, each
//! starting `chunk_size - overlap` characters after the previous one. The
//! final window may be shorter. Windows that are empty or whitespace-only
//! are dropped, but surviving chunks keep their true start offset.
//!
//! Sizes and offsets count Unicode scalar values, never bytes, so a window
//! never splits a UTF-8 sequence.
//!
//! Each chunk maps to a content-addressed record id (see [`record_id`]) so
//! re-ingesting an unchanged document overwrites its records in place.

use sha2::{Digest, Sha256};

use crate::models::Chunk;

/// Split `text` into overlapping windows and return the non-blank ones.
///
/// `overlap` must be smaller than `chunk_size`; configuration loading
/// enforces this, and a degenerate step is clamped to 1 here.
pub fn chunk_text(source: &str, text: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    windows(text, chunk_size, overlap)
        .into_iter()
        .filter(|(_, window)| !window.trim().is_empty())
        .map(|(start_offset, window)| Chunk {
            text: window.to_string(),
            source: source.to_string(),
            start_offset,
        })
        .collect()
}

/// The raw window sequence as `(char_offset, slice)` pairs, blank windows included.
pub fn windows(text: &str, chunk_size: usize, overlap: usize) -> Vec<(usize, &str)> {
    if chunk_size == 0 {
        return Vec::new();
    }
    let step = chunk_size.saturating_sub(overlap).max(1);

    // Byte offset of every char boundary, plus the end of the string.
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = boundaries.len() - 1;

    let mut out = Vec::with_capacity(char_len / step + 1);
    let mut start = 0;
    while start < char_len {
        let end = (start + chunk_size).min(char_len);
        out.push((start, &text[boundaries[start]..boundaries[end]]));
        start += step;
    }
    out
}

/// Stable id for a chunk: SHA-256 over its document path, offset, and text.
///
/// `doc_path` should be the path relative to the ingestion root so that
/// same-named files in different folders do not collide.
pub fn record_id(doc_path: &str, chunk: &Chunk) -> String {
    let mut hasher = Sha256::new();
    hasher.update(doc_path.as_bytes());
    hasher.update([0u8]);
    hasher.update((chunk.start_offset as u64).to_le_bytes());
    hasher.update(chunk.text.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("doc_{}", &digest[..32])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: usize) -> String {
        (0..len)
            .map(|i| (b'a' + (i % 26) as u8) as char)
            .collect()
    }

    #[test]
    fn test_2500_chars_gives_four_windows() {
        let text = sample(2500);
        let chunks = chunk_text("resume.txt", &text, 1000, 200);
        let starts: Vec<usize> = chunks.iter().map(|c| c.start_offset).collect();
        assert_eq!(starts, vec![0, 800, 1600, 2400]);
        assert_eq!(chunks[0].text.chars().count(), 1000);
        assert_eq!(chunks[2].text.chars().count(), 900);
        assert_eq!(chunks[3].text.chars().count(), 100);
        assert!(chunks.iter().all(|c| c.source == "resume.txt"));
    }

    #[test]
    fn test_window_starts_are_multiples_of_step() {
        let text = sample(5123);
        let w = windows(&text, 300, 50);
        for (i, (start, slice)) in w.iter().enumerate() {
            assert_eq!(*start, i * 250);
            if i + 1 < w.len() {
                assert_eq!(slice.chars().count(), 300, "window {} is short", i);
            }
        }
    }

    #[test]
    fn test_deoverlap_reconstructs_text() {
        let text = sample(3333);
        let (size, overlap) = (1000, 200);
        let w = windows(&text, size, overlap);
        let mut rebuilt = String::new();
        for (i, (_, slice)) in w.iter().enumerate() {
            if i == 0 {
                rebuilt.push_str(slice);
            } else {
                rebuilt.extend(slice.chars().skip(overlap));
            }
        }
        assert!(rebuilt.starts_with(&text));
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("a.md", "Hello, world!", 1000, 200);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_offset, 0);
        assert_eq!(chunks[0].text, "Hello, world!");
    }

    #[test]
    fn test_empty_text_no_chunks() {
        assert!(chunk_text("a.md", "", 1000, 200).is_empty());
    }

    #[test]
    fn test_whitespace_windows_dropped_offsets_kept() {
        // Second window (offset 8) is entirely blank.
        let text = format!("{}{}{}", "abcdefgh", " ".repeat(10), "ijklmnop");
        let chunks = chunk_text("a.txt", &text, 10, 2);
        assert!(chunks.iter().all(|c| !c.text.trim().is_empty()));
        let starts: Vec<usize> = chunks.iter().map(|c| c.start_offset).collect();
        assert_eq!(starts, vec![0, 16, 24]);
    }

    #[test]
    fn test_multibyte_text_splits_on_char_boundaries() {
        let text = "é".repeat(25);
        let chunks = chunk_text("cv.md", &text, 10, 3);
        assert_eq!(chunks[0].text.chars().count(), 10);
        assert_eq!(chunks[1].start_offset, 7);
        assert!(chunks.iter().all(|c| c.text.chars().all(|ch| ch == 'é')));
    }

    #[test]
    fn test_record_id_is_stable_and_content_addressed() {
        let chunks = chunk_text("a.md", &sample(1500), 1000, 200);
        let id1 = record_id("notes/a.md", &chunks[0]);
        let id2 = record_id("notes/a.md", &chunks[0]);
        assert_eq!(id1, id2);
        assert!(id1.starts_with("doc_"));
        assert_eq!(id1.len(), 4 + 32);
        assert_ne!(id1, record_id("notes/a.md", &chunks[1]));
        assert_ne!(id1, record_id("other/a.md", &chunks[0]));
    }
}
