use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use std::fmt;
use thiserror::Error as ThisError;

///
/// CursorError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CursorError {
    #[error("invalid cursor encoding: {0}")]
    InvalidEncoding(String),
}

///
/// Cursor
///
/// Opaque query position returned by the backend. Only the backend
/// interprets the bytes.
///

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Cursor(Vec<u8>);

impl Cursor {
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    #[must_use]
    pub fn to_websafe(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.0)
    }

    pub fn from_websafe(encoded: &str) -> Result<Self, CursorError> {
        URL_SAFE_NO_PAD
            .decode(encoded.trim_end_matches('='))
            .map(Self)
            .map_err(|err| CursorError::InvalidEncoding(err.to_string()))
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_websafe())
    }
}
