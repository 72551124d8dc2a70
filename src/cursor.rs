//! Opaque wire encoding for page cursors.
//!
//! HTTP and CLI clients see a base64 token; the structured form
//! ([`PageCursor`]) never leaks, so clients cannot grow dependencies on the
//! offset-vs-document distinction.

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::DateTime;

use jobless_core::query::PageCursor;
use jobless_core::store::DocPosition;

pub fn encode(cursor: &PageCursor) -> String {
    let raw = match cursor {
        PageCursor::Doc(pos) => {
            format!("d:{}:{}", pos.posted_at.timestamp_micros(), pos.id)
        }
        PageCursor::Offset(n) => format!("o:{}", n),
    };
    URL_SAFE_NO_PAD.encode(raw.as_bytes())
}

pub fn decode(token: &str) -> Result<PageCursor> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .context("invalid cursor: not valid base64")?;
    let raw = String::from_utf8(bytes).context("invalid cursor: not valid utf-8")?;

    if let Some(offset) = raw.strip_prefix("o:") {
        let n: usize = offset.parse().context("invalid cursor: bad offset")?;
        return Ok(PageCursor::Offset(n));
    }

    if let Some(rest) = raw.strip_prefix("d:") {
        let (micros_str, id) = rest
            .split_once(':')
            .context("invalid cursor: missing document id")?;
        let micros: i64 = micros_str.parse().context("invalid cursor: bad timestamp")?;
        let posted_at = DateTime::from_timestamp_micros(micros)
            .context("invalid cursor: timestamp out of range")?;
        if id.is_empty() {
            bail!("invalid cursor: empty document id");
        }
        return Ok(PageCursor::Doc(DocPosition {
            posted_at,
            id: id.to_string(),
        }));
    }

    bail!("invalid cursor: unknown format")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_offset_round_trip() {
        let cursor = PageCursor::Offset(42);
        let token = encode(&cursor);
        assert_eq!(decode(&token).unwrap(), cursor);
    }

    #[test]
    fn test_doc_round_trip() {
        // Micros precision survives the trip; finer precision would not.
        let posted_at = DateTime::from_timestamp_micros(Utc::now().timestamp_micros()).unwrap();
        let cursor = PageCursor::Doc(DocPosition {
            posted_at,
            id: "5f0c54e0-bd66-4a23-9c3f-0f4702f2a4f3".into(),
        });
        let token = encode(&cursor);
        assert_eq!(decode(&token).unwrap(), cursor);
    }

    #[test]
    fn test_malformed_tokens_are_errors_not_panics() {
        for bad in ["", "!!!", "bm9wZQ", "bzpOYU4"] {
            assert!(decode(bad).is_err(), "expected error for {bad:?}");
        }
    }
}
