//! Text hygiene for everything the engine hands out.
//!
//! Applications sprinkle U+FFFC (object replacement) markers for embedded
//! images and widgets into their accessible text, and other code points
//! of the Specials block (U+FFF0..=U+FFFF) show up occasionally. Both
//! break narrow console encodings on the receiving side, so they are
//! stripped before text leaves the engine.

/// Embedded non-text object marker.
const OBJECT_REPLACEMENT: char = '\u{FFFC}';

fn is_hazardous(c: char) -> bool {
    c == OBJECT_REPLACEMENT || ('\u{FFF0}'..='\u{FFFF}').contains(&c)
}

/// Remove object-replacement markers and every code point in the
/// Specials block. Everything else is kept in order.
pub fn sanitize(text: &str) -> String {
    text.chars().filter(|&c| !is_hazardous(c)).collect()
}

/// The last `max_chars` characters of `text`.
pub fn tail(text: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return "";
    }
    match text.char_indices().rev().nth(max_chars - 1) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

/// The first `max_chars` characters of `text`.
pub fn head(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
