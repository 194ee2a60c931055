//! Sentence-aware text splitting for per-call length limits.

/// Iterator over chunks of at most `max_length` characters.
///
/// Each chunk ends at the last `.` inside the window when there is one, otherwise the
/// window is cut hard at `max_length`. Chunks are trimmed of surrounding whitespace.
/// The final chunk is whatever remains, so the iterator always yields at least one
/// item (an empty string for empty input).
#[derive(Debug, Clone)]
pub struct TextChunks<'a> {
    rest: Option<&'a str>,
    max_length: usize,
}

/// Split `text` into chunks no longer than `max_length` characters.
///
/// A `max_length` of zero is treated as one.
pub fn chunk_text(text: &str, max_length: usize) -> TextChunks<'_> {
    TextChunks {
        rest: Some(text),
        max_length: max_length.max(1),
    }
}

impl<'a> Iterator for TextChunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest?;

        // Byte offset just past the first `max_length` characters, if the text is longer.
        let window_end = match rest.char_indices().nth(self.max_length) {
            Some((offset, _)) => offset,
            None => {
                self.rest = None;
                return Some(rest.trim());
            }
        };

        let split = match rest[..window_end].rfind('.') {
            Some(dot) => dot + 1,
            None => window_end,
        };

        self.rest = Some(&rest[split..]);
        Some(rest[..split].trim())
    }
}
