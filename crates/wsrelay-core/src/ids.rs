//! Branded string identifiers.
//!
//! Freshly minted IDs embed a `UUIDv7`, so they are unique and sort in
//! creation order. IDs received from the outside (URL paths) are wrapped
//! verbatim with `from_raw` and never validated: an unknown token is simply
//! absent from the binding table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident, $prefix:expr) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Mint a new, unique ID.
            pub fn new() -> Self {
                Self(format!("{}_{}", $prefix, Uuid::now_v7().simple()))
            }

            /// Wrap an existing string without validation.
            pub fn from_raw(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Borrow the underlying string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_owned()))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

branded_id!(
    /// Opaque relay token binding a producer's sends to one consumer channel.
    Token,
    "tok"
);
branded_id!(
    /// Identifies one accepted WebSocket connection in logs.
    ConnectionId,
    "conn"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_has_prefix() {
        let token = Token::new();
        assert!(token.as_str().starts_with("tok_"), "got: {token}");
    }

    #[test]
    fn connection_id_has_prefix() {
        let id = ConnectionId::new();
        assert!(id.as_str().starts_with("conn_"), "got: {id}");
    }

    #[test]
    fn tokens_are_unique() {
        let a = Token::new();
        let b = Token::new();
        assert_ne!(a, b);
    }

    #[test]
    fn tokens_sort_by_creation() {
        let tokens: Vec<Token> = (0..100).map(|_| Token::new()).collect();
        for w in tokens.windows(2) {
            assert!(w[0] < w[1], "not monotonic: {} >= {}", w[0], w[1]);
        }
    }

    #[test]
    fn token_is_url_safe() {
        let token = Token::new();
        assert!(
            token
                .as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_'),
            "got: {token}"
        );
    }

    #[test]
    fn from_raw_preserves_value() {
        let token = Token::from_raw("01HZX-custom");
        assert_eq!(token.as_str(), "01HZX-custom");
    }

    #[test]
    fn serializes_as_plain_string() {
        let token = Token::from_raw("tok_abc");
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, r#""tok_abc""#);
    }
}
