//! Key tokens and key sequences.
//!
//! A [`KeySequence`] is an ordered chord of [`KeyToken`]s pressed together
//! (modifiers first), e.g. `Ctrl+Shift+Z`.  Sequences are what the input
//! emission collaborator receives; this crate never touches the OS.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a key combination string cannot be parsed.
#[derive(Debug, Error, PartialEq)]
pub enum KeyParseError {
    #[error("empty key combination")]
    Empty,
    #[error("unrecognized key token: {0:?}")]
    UnknownToken(String),
}

/// A single key in a chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyToken {
    Ctrl,
    Shift,
    Alt,
    /// macOS Command key.
    Cmd,
    Space,
    Delete,
    /// Function key F1..F12.
    Function(u8),
    /// A printable character key, e.g. `b`, `+`, `[`.
    Char(char),
}

impl KeyToken {
    /// Whether this token is a modifier (pressed before, released after the
    /// rest of the chord).
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            KeyToken::Ctrl | KeyToken::Shift | KeyToken::Alt | KeyToken::Cmd
        )
    }
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyToken::Ctrl => f.write_str("ctrl"),
            KeyToken::Shift => f.write_str("shift"),
            KeyToken::Alt => f.write_str("alt"),
            KeyToken::Cmd => f.write_str("cmd"),
            KeyToken::Space => f.write_str("space"),
            KeyToken::Delete => f.write_str("delete"),
            KeyToken::Function(n) => write!(f, "f{n}"),
            KeyToken::Char(c) => write!(f, "{c}"),
        }
    }
}

impl FromStr for KeyToken {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "ctrl" | "control" => Ok(KeyToken::Ctrl),
            "shift" => Ok(KeyToken::Shift),
            "alt" | "meta" => Ok(KeyToken::Alt),
            "cmd" | "command" => Ok(KeyToken::Cmd),
            "space" => Ok(KeyToken::Space),
            "delete" | "del" => Ok(KeyToken::Delete),
            _ => {
                if let Some(num) = lower.strip_prefix('f') {
                    if let Ok(n) = num.parse::<u8>() {
                        if (1..=12).contains(&n) {
                            return Ok(KeyToken::Function(n));
                        }
                    }
                }
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(KeyToken::Char(c)),
                    _ => Err(KeyParseError::UnknownToken(s.to_string())),
                }
            }
        }
    }
}

/// An ordered chord of keys pressed together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySequence(Vec<KeyToken>);

impl KeySequence {
    pub fn new(tokens: Vec<KeyToken>) -> Self {
        Self(tokens)
    }

    /// Convenience constructor for a single key press.
    pub fn single(token: KeyToken) -> Self {
        Self(vec![token])
    }

    pub fn tokens(&self) -> &[KeyToken] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses combination strings like `"Ctrl+Shift+Z"`, `"Ctrl++"` (the
    /// trailing `+` is the plus key itself) or `"Space"`.
    ///
    /// This is the format Krita writes in `kritashortcutsrc`.
    pub fn parse_combo(combo: &str) -> Result<Self, KeyParseError> {
        let trimmed = combo.trim();
        if trimmed.is_empty() {
            return Err(KeyParseError::Empty);
        }

        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut chars = trimmed.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '+' {
                if current.is_empty() {
                    // "Ctrl++": separator followed by a literal plus key.
                    tokens.push(KeyToken::Char('+'));
                    // Skip a possible duplicated separator.
                    if chars.peek() == Some(&'+') {
                        chars.next();
                    }
                } else {
                    tokens.push(current.parse()?);
                    current.clear();
                }
            } else {
                current.push(c);
            }
        }
        if !current.is_empty() {
            tokens.push(current.parse()?);
        }
        if tokens.is_empty() {
            return Err(KeyParseError::Empty);
        }
        Ok(Self(tokens))
    }
}

impl fmt::Display for KeySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

impl From<Vec<KeyToken>> for KeySequence {
    fn from(tokens: Vec<KeyToken>) -> Self {
        Self(tokens)
    }
}

/// Shorthand for building sequences in the built-in tables.
#[macro_export]
macro_rules! keyseq {
    ($($token:expr),+ $(,)?) => {
        $crate::domain::keys::KeySequence::new(vec![$($token),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_combo_with_modifiers() {
        // Arrange / Act
        let seq = KeySequence::parse_combo("Ctrl+Shift+Z").unwrap();

        // Assert
        assert_eq!(
            seq.tokens(),
            &[KeyToken::Ctrl, KeyToken::Shift, KeyToken::Char('z')]
        );
    }

    #[test]
    fn test_parse_combo_literal_plus_key() {
        // "Ctrl++" is Krita's encoding of Ctrl plus the `+` key.
        let seq = KeySequence::parse_combo("Ctrl++").unwrap();
        assert_eq!(seq.tokens(), &[KeyToken::Ctrl, KeyToken::Char('+')]);
    }

    #[test]
    fn test_parse_combo_single_named_key() {
        let seq = KeySequence::parse_combo("Space").unwrap();
        assert_eq!(seq.tokens(), &[KeyToken::Space]);
    }

    #[test]
    fn test_parse_combo_function_key() {
        let seq = KeySequence::parse_combo("F5").unwrap();
        assert_eq!(seq.tokens(), &[KeyToken::Function(5)]);
    }

    #[test]
    fn test_parse_combo_rejects_garbage() {
        assert_eq!(
            KeySequence::parse_combo("Ctrl+NotAKey"),
            Err(KeyParseError::UnknownToken("NotAKey".to_string()))
        );
        assert_eq!(KeySequence::parse_combo("   "), Err(KeyParseError::Empty));
    }

    #[test]
    fn test_display_joins_with_plus() {
        let seq = keyseq![KeyToken::Ctrl, KeyToken::Shift, KeyToken::Char('n')];
        assert_eq!(seq.to_string(), "ctrl+shift+n");
    }

    #[test]
    fn test_function_key_out_of_range_is_char_error() {
        // F13 is outside the twelve-slot range; it is not a function token
        // and "f13" is not a single character either.
        assert!(KeySequence::parse_combo("F13").is_err());
    }
}
