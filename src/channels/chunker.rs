//! Splits long replies into pieces a platform accepts in one message.

/// Split `message` into pieces of at most `max_chars` characters.
///
/// A piece ends after the last newline that fits. A line longer than the
/// limit is cut at a character boundary.
pub fn chunk_message(message: &str, max_chars: usize) -> Vec<String> {
    if max_chars == 0 {
        return Vec::new();
    }

    let mut pieces = Vec::new();
    let mut rest = message;
    while !rest.is_empty() {
        let (piece, tail) = rest.split_at(cut_point(rest, max_chars));
        pieces.push(piece.to_string());
        rest = tail;
    }
    pieces
}

/// Byte offset at which the next piece of `text` ends.
fn cut_point(text: &str, max_chars: usize) -> usize {
    let Some((limit, _)) = text.char_indices().nth(max_chars) else {
        return text.len();
    };
    text[..limit].rfind('\n').map_or(limit, |newline| newline + 1)
}
