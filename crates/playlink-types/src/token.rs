//! Pairing tokens.
//!
//! A [`Token`] is an opaque, case-sensitive string shared between one
//! player and its remotes. Tokens are compared by exact equality; the
//! relay never normalizes them. Freshly issued tokens use
//! [`TOKEN_CHARSET`] and a fixed length, but tokens arriving on request
//! paths are accepted as-is so that existence is the only check.

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Alphabet used for freshly issued tokens.
pub const TOKEN_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Opaque pairing identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct Token(String);

impl Token {
    /// Wrap a string as a token without validation.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the token has exactly `length` characters, all drawn from
    /// [`TOKEN_CHARSET`].
    pub fn is_well_formed(&self, length: usize) -> bool {
        self.0.len() == length && self.0.bytes().all(|b| TOKEN_CHARSET.contains(&b))
    }
}

impl core::fmt::Display for Token {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Token {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Response body of the pairing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TokenResponse {
    /// The freshly issued, currently unused token.
    pub token: Token,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_tokens() {
        assert!(Token::new("AB12CD34").is_well_formed(8));
        assert!(!Token::new("ab12cd34").is_well_formed(8));
        assert!(!Token::new("AB12CD3").is_well_formed(8));
        assert!(!Token::new("AB12-D34").is_well_formed(8));
    }

    #[test]
    fn tokens_are_case_sensitive() {
        assert_ne!(Token::new("ABCD1234"), Token::new("abcd1234"));
    }

    #[test]
    fn token_serializes_as_plain_string() {
        let response = TokenResponse {
            token: Token::new("Q7Z2M0XK"),
        };
        let json = serde_json::to_string(&response).unwrap_or_default();
        assert_eq!(json, r#"{"token":"Q7Z2M0XK"}"#);
    }
}
