//! Numeric text input used for the minimum-volume filter.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Single-line input that accepts an unsigned decimal number.
///
/// Content is ASCII only, so byte and character positions coincide.
#[derive(Clone, Debug, Default)]
pub struct TextInput {
    content: String,
    cursor: usize,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the content and moves the cursor to the end.
    pub fn set(&mut self, text: &str) {
        self.content = text.chars().filter(|c| accepts(*c)).collect();
        self.cursor = self.content.len();
    }

    /// Inserts a character at the cursor; anything but digits and a single
    /// decimal point is ignored.
    pub fn insert(&mut self, c: char) {
        if !accepts(c) || (c == '.' && self.content.contains('.')) {
            return;
        }
        self.content.insert(self.cursor, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.content.remove(self.cursor);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.content.len() {
            self.content.remove(self.cursor);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.content.len());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.content.len();
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    /// Parses the content as a volume floor. Empty input means no floor.
    pub fn parse_volume(&self) -> Result<Option<Decimal>, String> {
        let text = self.content.trim();
        if text.is_empty() {
            return Ok(None);
        }
        Decimal::from_str(text)
            .map(Some)
            .map_err(|e| format!("invalid volume '{text}': {e}"))
    }
}

fn accepts(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}
