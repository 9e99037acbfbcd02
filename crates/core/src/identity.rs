//! Opaque identifiers for origin URLs.
//!
//! An identifier is the namespace tag followed by the unpadded base64url
//! encoding of the URL. Identifiers are capped at [`MAX_IDENTIFIER_LEN`];
//! an over-long encoding is cut and flagged with [`TRUNCATION_MARKER`] right
//! after the tag, so a truncated id always fails to decode instead of
//! decoding to a different URL.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use thiserror::Error;

/// Tag that marks identifiers minted by this addon.
pub const NAMESPACE: &str = "ala_";

/// Upper bound on the length of an identifier, tag included.
pub const MAX_IDENTIFIER_LEN: usize = 512;

/// Not part of the base64url alphabet.
pub const TRUNCATION_MARKER: char = '~';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(&'static str),
}

/// Longest URL (in bytes) that still round-trips through [`encode`]/[`decode`].
pub const fn max_encodable_len() -> usize {
    (MAX_IDENTIFIER_LEN - NAMESPACE.len()) / 4 * 3
}

pub fn encode(origin_url: &str) -> String {
    let payload = URL_SAFE_NO_PAD.encode(origin_url.as_bytes());
    if NAMESPACE.len() + payload.len() <= MAX_IDENTIFIER_LEN {
        return format!("{NAMESPACE}{payload}");
    }

    // base64url output is ASCII, byte slicing is safe.
    let keep = MAX_IDENTIFIER_LEN - NAMESPACE.len() - TRUNCATION_MARKER.len_utf8();
    format!("{NAMESPACE}{TRUNCATION_MARKER}{}", &payload[..keep])
}

pub fn decode(identifier: &str) -> Result<String, IdentityError> {
    let payload = identifier
        .strip_prefix(NAMESPACE)
        .ok_or(IdentityError::InvalidIdentifier("missing namespace tag"))?;

    if payload.starts_with(TRUNCATION_MARKER) {
        return Err(IdentityError::InvalidIdentifier("identifier was truncated"));
    }
    if payload.is_empty() {
        return Err(IdentityError::InvalidIdentifier("empty payload"));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| IdentityError::InvalidIdentifier("payload is not base64url"))?;

    String::from_utf8(bytes).map_err(|_| IdentityError::InvalidIdentifier("payload is not utf-8"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_typical_urls() {
        let urls = [
            "https://asialiveaction.com/series/queen-of-tears/",
            "https://asialiveaction.com/peliculas/parasite-2019/",
            "https://asialiveaction.com/?p=12345",
            "https://asialiveaction.com/series/amor-en-sel%C3%BA/",
            "https://asialiveaction.com/series/cañón-del-río/",
        ];
        for url in urls {
            let id = encode(url);
            assert!(id.starts_with(NAMESPACE));
            assert_eq!(decode(&id).unwrap(), url);
        }
    }

    #[test]
    fn encode_is_deterministic_and_url_safe() {
        let url = "https://asialiveaction.com/series/a-b?c=d&e=f/";
        let a = encode(url);
        let b = encode(url);
        assert_eq!(a, b);
        assert!(
            a.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        );
    }

    #[test]
    fn round_trips_at_the_length_bound() {
        let base = "https://asialiveaction.com/";
        let url = format!("{base}{}", "a".repeat(max_encodable_len() - base.len()));
        assert_eq!(url.len(), max_encodable_len());
        let id = encode(&url);
        assert!(id.len() <= MAX_IDENTIFIER_LEN);
        assert_eq!(decode(&id).unwrap(), url);
    }

    #[test]
    fn long_urls_are_truncated_and_refuse_to_decode() {
        let url = format!("https://asialiveaction.com/{}", "x".repeat(1000));
        let id = encode(&url);
        assert_eq!(id.len(), MAX_IDENTIFIER_LEN);
        assert_eq!(
            decode(&id),
            Err(IdentityError::InvalidIdentifier("identifier was truncated"))
        );
    }

    #[test]
    fn rejects_foreign_and_malformed_identifiers() {
        assert!(decode("tt1234567").is_err());
        assert!(decode("ala_").is_err());
        assert!(decode("ala_!!!notbase64").is_err());
        assert!(decode("ala_a").is_err());
        // valid base64url of invalid utf-8 (0xff 0xee)
        assert!(decode("ala__-4").is_err());
    }
}
