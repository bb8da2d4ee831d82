//! Text measurement and word-wrap for text elements.
//!
//! There is no font rasterizer in this crate. Widths come from a fixed
//! per-character advance table scaled by font size, which is deterministic
//! and identical on every participant, so wrapped line breaks and hit boxes
//! agree everywhere the same element is laid out.

#[cfg(test)]
#[path = "text_test.rs"]
mod text_test;

use crate::consts::{BASE_WIDTH, FONT_SCALE, LINE_HEIGHT_FACTOR, TEXT_PADDING};
use crate::doc::Point;

/// Advance width of `ch` as a fraction of the font size.
fn advance(ch: char) -> f64 {
    match ch {
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '!' | '|' | '\'' | '`' => 0.28,
        ' ' | 'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '-' => 0.34,
        'm' | 'w' | 'M' | 'W' | '@' => 0.86,
        '0'..='9' => 0.56,
        c if c.is_ascii_uppercase() => 0.68,
        c if c.is_ascii() => 0.52,
        _ => 1.0,
    }
}

/// Advance width of `ch` at `font_size`.
#[must_use]
pub fn char_width(ch: char, font_size: f64) -> f64 {
    advance(ch) * font_size
}

/// Font size used for a text element drawn with `stroke_width`.
#[must_use]
pub fn font_size(stroke_width: f64) -> f64 {
    stroke_width * FONT_SCALE
}

/// Rendered width of `text` on one line at `font_size`.
#[must_use]
pub fn measure_text(text: &str, font_size: f64) -> f64 {
    text.chars().map(advance).sum::<f64>() * font_size
}

/// Break `text` into lines no wider than `max_width`.
///
/// Newlines force a break. Words are packed greedily; a word wider than
/// `max_width` on its own is split between characters. Every line holds at
/// least one character, so a non-positive width still terminates.
#[must_use]
pub fn wrap_text(text: &str, max_width: f64, font_size: f64) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() { word.to_owned() } else { format!("{line} {word}") };
            if measure_text(&candidate, font_size) <= max_width {
                line = candidate;
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if measure_text(word, font_size) <= max_width {
                line.push_str(word);
                continue;
            }
            for ch in word.chars() {
                let width = measure_text(&line, font_size) + char_width(ch, font_size);
                if width > max_width && !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                line.push(ch);
            }
        }
        lines.push(line);
    }
    lines
}

/// Wrapped layout of one text element.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub origin: Point,
    pub lines: Vec<String>,
    pub font_size: f64,
    pub line_height: f64,
}

impl TextLayout {
    /// Lay out `text` with its top-left corner at `origin`, wrapping against
    /// the right edge of the logical canvas.
    #[must_use]
    pub fn new(origin: Point, text: &str, stroke_width: f64) -> Self {
        let font_size = font_size(stroke_width);
        let max_width = BASE_WIDTH - origin.x - TEXT_PADDING;
        Self {
            origin,
            lines: wrap_text(text, max_width, font_size),
            font_size,
            line_height: font_size * LINE_HEIGHT_FACTOR,
        }
    }

    /// Width of the widest line.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.lines
            .iter()
            .map(|l| measure_text(l, self.font_size))
            .fold(0.0, f64::max)
    }

    /// Total height of all lines.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.lines.len() as f64 * self.line_height
    }

    /// One `(top_left, width, height)` box per line.
    #[must_use]
    pub fn line_boxes(&self) -> Vec<(Point, f64, f64)> {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let top = self.origin.offset(0.0, i as f64 * self.line_height);
                (top, measure_text(line, self.font_size), self.line_height)
            })
            .collect()
    }
}
