//! Client link lifecycle tests
//!
//! Covers the rules a link passes through from issue to expiry:
//! - Token shape and uniqueness
//! - The 24 hour window
//! - Strict expiry and the active flag

use chrono::{Duration, TimeZone, Utc};
use paylink_core::token::{is_link_usable, link_url, LINK_TTL_HOURS, TOKEN_LEN};
use paylink_core::{Error, LinkToken, LinkWindow};
use std::collections::HashSet;

// =============================================================================
// Tokens
// =============================================================================

mod tokens {
    use super::*;

    #[test]
    fn test_tokens_are_lowercase_hex() {
        for _ in 0..50 {
            let token = LinkToken::generate();
            assert_eq!(token.as_str().len(), TOKEN_LEN);
            assert!(token
                .as_str()
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
        }
    }

    #[test]
    fn test_many_tokens_distinct() {
        let tokens: HashSet<String> = (0..500).map(|_| LinkToken::generate().into_string()).collect();
        assert_eq!(tokens.len(), 500);
    }

    #[test]
    fn test_parse_round_trip() {
        let token = LinkToken::generate();
        let parsed = LinkToken::parse(&token.to_string()).unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn test_url_embeds_token_as_path_segment() {
        let token = LinkToken::generate();
        let url = link_url("https://pay.example.com", token.as_str());
        assert_eq!(url.rsplit('/').next().unwrap(), token.as_str());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let token = LinkToken::generate();
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json, serde_json::Value::String(token.to_string()));
    }
}

// =============================================================================
// Expiry
// =============================================================================

mod expiry {
    use super::*;

    #[test]
    fn test_usable_through_window() {
        let issued = Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap();
        let window = LinkWindow::starting_at(issued);

        assert!(is_link_usable(true, window.expires_at, issued));
        assert!(is_link_usable(
            true,
            window.expires_at,
            issued + Duration::hours(LINK_TTL_HOURS) - Duration::seconds(1)
        ));
    }

    #[test]
    fn test_unusable_at_and_after_expiry() {
        let issued = Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap();
        let window = LinkWindow::starting_at(issued);

        assert!(!is_link_usable(true, window.expires_at, window.expires_at));
        assert!(!is_link_usable(
            true,
            window.expires_at,
            window.expires_at + Duration::days(30)
        ));
    }

    #[test]
    fn test_deactivated_link_unusable_inside_window() {
        let issued = Utc::now();
        let window = LinkWindow::starting_at(issued);
        assert!(!is_link_usable(false, window.expires_at, issued));
    }
}

// =============================================================================
// Malformed input
// =============================================================================

#[test]
fn test_malformed_tokens_rejected() {
    let wrong_alphabet = "z".repeat(TOKEN_LEN);
    for bad in ["", "short", "PAY-2026-ABCDEF", wrong_alphabet.as_str()] {
        assert!(matches!(LinkToken::parse(bad), Err(Error::InvalidToken)), "{} accepted", bad);
    }
}
