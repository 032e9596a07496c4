//! Plate title bounding.

/// Longest engravable title; a fixed physical constraint of the smallest
/// plate.
pub const MAX_TITLE_LEN: usize = 18;

/// The subset of a glyph face the title path needs: can a code point be
/// engraved at all. Implemented by the engraving layer's font faces.
pub trait GlyphFace {
    fn has_glyph(&self, ch: char) -> bool;
}

/// Bound a title to what the plate and face can carry: uppercase, drop
/// code points the face cannot engrave, cut at [`MAX_TITLE_LEN`] glyphs.
///
/// Idempotent and pure.
#[must_use]
pub fn bound_title(face: &impl GlyphFace, title: &str) -> String {
    let mut bounded = String::new();
    let mut glyphs = 0;
    for ch in title.to_uppercase().chars() {
        if !face.has_glyph(ch) {
            continue;
        }
        bounded.push(ch);
        glyphs += 1;
        if glyphs == MAX_TITLE_LEN {
            break;
        }
    }
    bounded
}
