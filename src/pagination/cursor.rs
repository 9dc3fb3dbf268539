use base64::engine::general_purpose::STANDARD as BASE64_ENGINE;
use base64::Engine;

use crate::cypher::Expr;
use crate::translator::errors::TranslateError;

/// Prefix of the decoded cursor text.
pub const CURSOR_PREFIX: &str = "arrayconnection:";

/// Opaque cursor for the row at `offset`.
pub fn encode(offset: u64) -> String {
    BASE64_ENGINE.encode(format!("{}{}", CURSOR_PREFIX, offset))
}

/// Offset of the row a cursor points at.
pub fn decode(cursor: &str) -> Result<u64, TranslateError> {
    let invalid = || TranslateError::InvalidCursor {
        cursor: cursor.to_string(),
    };
    let bytes = BASE64_ENGINE.decode(cursor).map_err(|_| invalid())?;
    let text = String::from_utf8(bytes).map_err(|_| invalid())?;
    text.strip_prefix(CURSOR_PREFIX)
        .and_then(|offset| offset.parse::<u64>().ok())
        .ok_or_else(invalid)
}

/// Offset of the first row after `after`.
pub fn offset_after(after: Option<&str>) -> Result<u64, TranslateError> {
    match after {
        Some(cursor) => decode(cursor)?
            .checked_add(1)
            .filter(|offset| i64::try_from(*offset).is_ok())
            .ok_or_else(|| TranslateError::InvalidCursor {
                cursor: cursor.to_string(),
            }),
        None => Ok(0),
    }
}

/// Cypher expression computing the cursor of the row at `position` in the
/// database, matching [`encode`].
pub fn cursor_expr(position: Expr) -> Expr {
    Expr::call(
        "apoc.text.base64Encode",
        vec![Expr::binary(
            crate::cypher::Operator::Addition,
            Expr::string(CURSOR_PREFIX),
            Expr::call("toString", vec![position]),
        )],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_round_trip_and_known_value() {
        assert_eq!(encode(0), "YXJyYXljb25uZWN0aW9uOjA=");
        assert_eq!(decode(&encode(41)).unwrap(), 41);
        assert_eq!(offset_after(Some(&encode(4))).unwrap(), 5);
        assert_eq!(offset_after(None).unwrap(), 0);
    }

    #[test]
    fn test_cursor_past_the_last_offset_is_invalid() {
        for offset in [u64::MAX, i64::MAX as u64] {
            assert!(matches!(
                offset_after(Some(&encode(offset))),
                Err(TranslateError::InvalidCursor { .. })
            ));
        }
        assert_eq!(offset_after(Some(&encode(i64::MAX as u64 - 1))).unwrap(), i64::MAX as u64);
    }

    #[test]
    fn test_invalid_cursors() {
        for cursor in ["not base64!", "aGVsbG8=", "YXJyYXljb25uZWN0aW9uOi0x"] {
            assert!(matches!(
                decode(cursor),
                Err(TranslateError::InvalidCursor { .. })
            ));
        }
    }
}
