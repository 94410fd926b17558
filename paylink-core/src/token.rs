//! Client link tokens
//!
//! A link token is 32 bytes from the operating system's CSPRNG, hex-encoded
//! into a 64-character URL-safe string. Tokens are opaque: nothing about the
//! client or the expiry can be recovered from one.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;

use crate::{Error, Result};

/// Number of random bytes behind each token
pub const TOKEN_BYTES: usize = 32;

/// Length of the encoded token
pub const TOKEN_LEN: usize = TOKEN_BYTES * 2;

/// How long a freshly issued link stays usable
pub const LINK_TTL_HOURS: i64 = 24;

/// An opaque client link token
/// Only built by [`LinkToken::generate`] or a successful [`LinkToken::parse`].
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LinkToken(String);

impl LinkToken {
    /// Generate a new random token
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Parse a token presented by a caller
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() != TOKEN_LEN || !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(Error::InvalidToken);
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix that is safe to write to logs
    pub fn prefix(&self) -> &str {
        &self.0[..8]
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

// Tokens are bearer credentials; keep them out of debug output.
impl fmt::Debug for LinkToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LinkToken({}…)", self.prefix())
    }
}

impl fmt::Display for LinkToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validity window of a client link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkWindow {
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl LinkWindow {
    /// Window for a link issued at `now`
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            expires_at: now + Duration::hours(LINK_TTL_HOURS),
        }
    }
}

/// Whether a link with the given state may be used at `now`.
///
/// Expiry is strict: a link expiring exactly at `now` is no longer usable.
pub fn is_link_usable(active: bool, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    active && expires_at > now
}

/// Build the public URL for a link token
pub fn link_url(base_url: &str, token: &str) -> String {
    format!("{}/payment/{}", base_url.trim_end_matches('/'), token)
}
