//! Word-boundary splitting of replies under the platform's length limit.
//!
//! Lengths are counted in characters, not bytes.

/// Split `content` into segments of at most `max_len` characters.
///
/// Greedy: each segment is the longest prefix that ends right before the
/// last space inside the window. Without a usable space the window is cut
/// hard at `max_len`, possibly mid-word. Whitespace around a cut is dropped,
/// and empty segments are never produced.
pub fn chunk_message(content: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();
    let mut rest = content;

    while !rest.is_empty() {
        if rest.chars().count() <= max_len {
            chunks.push(rest.to_string());
            break;
        }

        // Byte offset of the first character past the window.
        let window_end = rest
            .char_indices()
            .nth(max_len)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());

        let split_at = match rest[..window_end].rfind(' ') {
            Some(idx) if idx > 0 => idx,
            _ => window_end,
        };

        chunks.push(rest[..split_at].to_string());
        rest = rest[split_at..].trim();
    }

    chunks
}
