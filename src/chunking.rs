//! Fixed-window text chunking.

/// Splits `text` into overlapping windows of at most `chunk_size` characters.
///
/// The input is trimmed first; empty or whitespace-only input produces no
/// windows. Consecutive windows share exactly `overlap` characters and the
/// final window always ends at the end of the trimmed input. Windows are
/// counted in characters rather than bytes so multi-byte text never splits
/// inside a code point.
///
/// Callers must guarantee `overlap < chunk_size`; configuration validation
/// rejects anything else before the pipeline runs, since an overlap that
/// large would stop the window from advancing.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    debug_assert!(chunk_size > 0 && overlap < chunk_size);

    let chars: Vec<char> = text.trim().chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let total = chars.len();
    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = usize::min(start + chunk_size, total);
        chunks.push(chars[start..end].iter().collect());
        if end == total {
            break;
        }
        start = end - overlap;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Rebuilds the original text by trimming the shared prefix from every
    /// window after the first.
    fn reconstruct(chunks: &[String], overlap: usize) -> String {
        let mut rebuilt = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                rebuilt.push_str(chunk);
            } else {
                rebuilt.extend(chunk.chars().skip(overlap));
            }
        }
        rebuilt
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_text("", 100, 10).is_empty());
    }

    #[test]
    fn whitespace_only_input_yields_no_chunks() {
        assert!(chunk_text("   \n\t  ", 100, 10).is_empty());
    }

    #[test]
    fn short_input_is_a_single_window() {
        let chunks = chunk_text("hello world", 100, 10);
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn windows_reconstruct_the_input() {
        let text = "abcdefghijklmnopqrstuvwxyz0123456789";
        for (size, overlap) in [(4, 2), (5, 1), (7, 3), (10, 0), (36, 5), (50, 10)] {
            let chunks = chunk_text(text, size, overlap);
            assert_eq!(
                reconstruct(&chunks, overlap),
                text,
                "size={size} overlap={overlap}"
            );
        }
    }

    #[test]
    fn last_window_ends_at_input_end() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        for (size, overlap) in [(4, 2), (5, 0), (9, 4)] {
            let chunks = chunk_text(text, size, overlap);
            assert!(text.ends_with(chunks.last().unwrap().as_str()));
        }
    }

    #[test]
    fn consecutive_windows_share_exactly_the_overlap() {
        let text = "abcdefghijklmnop";
        let chunks = chunk_text(text, 6, 2);
        for pair in chunks.windows(2) {
            let len = pair[0].chars().count();
            let tail: String = pair[0].chars().skip(len - 2).collect();
            let head: String = pair[1].chars().take(2).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn multibyte_text_never_splits_code_points() {
        let text = "жёлтый кристалл кремния и ещё немного текста для окон";
        let chunks = chunk_text(text, 10, 3);
        assert_eq!(reconstruct(&chunks, 3), text);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 10);
        }
    }

    #[test]
    fn input_is_trimmed_before_windowing() {
        let chunks = chunk_text("  padded  ", 100, 10);
        assert_eq!(chunks, vec!["padded".to_string()]);
    }
}
