//! Payment reference ids
//!
//! Format: `PAY-<yyyy>-<XXXXXX>` where the suffix is six characters drawn
//! uniformly from `[0-9A-Z]`. Uniqueness is enforced by the store; with
//! 36^6 suffixes per year a collision is possible but rare.

use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use serde::Serialize;

const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SUFFIX_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ReferenceId(String);

impl ReferenceId {
    /// Generate a reference id for a payment registered at `now`
    pub fn generate(now: DateTime<Utc>) -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();
        Self(format!("PAY-{:04}-{}", now.year(), suffix))
    }

    /// Accept a string only if it has the shape of a generated id
    pub fn parse(s: &str) -> Option<Self> {
        let (year, suffix) = s.strip_prefix("PAY-")?.split_once('-')?;
        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if suffix.len() != SUFFIX_LEN || !suffix.bytes().all(|b| BASE36.contains(&b)) {
            return None;
        }
        Some(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    #[test]
    fn test_generated_format() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        for _ in 0..100 {
            let id = ReferenceId::generate(now);
            assert!(id.as_str().starts_with("PAY-2026-"));
            assert_eq!(id.as_str().len(), "PAY-2026-".len() + 6);
            assert!(ReferenceId::parse(id.as_str()).is_some());
        }
    }

    #[test]
    fn test_generated_ids_rarely_collide() {
        let now = Utc::now();
        let ids: HashSet<String> = (0..1000)
            .map(|_| ReferenceId::generate(now).as_str().to_string())
            .collect();
        assert!(ids.len() >= 999);
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        for bad in ["PAY-26-ABCDEF", "PAY-2026-abcdef", "PAY-2026-ABCDE", "INV-2026-ABCDEF", "PAY2026ABCDEF"] {
            assert!(ReferenceId::parse(bad).is_none(), "{} accepted", bad);
        }
    }
}
