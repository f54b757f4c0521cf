//! Text repair for mis-encoded archive strings
//!
//! Archive exports write every free-text field as UTF-8 bytes that were
//! each decoded as a single Latin-1 character. "café" (`63 61 66 C3 A9`)
//! arrives as `"cafÃ©"`. Repair reverses that: each code point is taken
//! as a byte and the resulting byte string is decoded as UTF-8 again.
//!
//! Repair never fails. A string holding any code point above U+00FF was
//! not produced by this corruption and is returned as-is, and so is a
//! string whose bytes do not form valid UTF-8.

use serde_json::Value;
use std::borrow::Cow;

/// Repair a single string.
pub fn repair(s: &str) -> String {
    repair_cow(s).into_owned()
}

/// Repair a string, borrowing when nothing changes.
pub fn repair_cow(s: &str) -> Cow<'_, str> {
    if s.is_ascii() {
        return Cow::Borrowed(s);
    }

    let mut bytes = Vec::with_capacity(s.len());
    for ch in s.chars() {
        match u8::try_from(u32::from(ch)) {
            Ok(byte) => bytes.push(byte),
            Err(_) => return Cow::Borrowed(s),
        }
    }

    match String::from_utf8(bytes) {
        Ok(repaired) => Cow::Owned(repaired),
        Err(_) => {
            tracing::trace!(input = s, "Text is not mis-encoded UTF-8, keeping as-is");
            Cow::Borrowed(s)
        }
    }
}

/// Repair every string inside a decoded JSON tree, in place.
///
/// Object keys are left alone; they are schema field names, not user text.
pub fn repair_value(value: &mut Value) {
    match value {
        Value::String(s) => {
            let repaired = match repair_cow(s) {
                Cow::Owned(repaired) => Some(repaired),
                Cow::Borrowed(_) => None,
            };
            if let Some(repaired) = repaired {
                *s = repaired;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(repair_value),
        Value::Object(map) => map.values_mut().for_each(repair_value),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Encode text the way the archive does: UTF-8 bytes read as Latin-1.
    fn corrupt(s: &str) -> String {
        s.bytes().map(char::from).collect()
    }

    #[test]
    fn test_repair_cafe() {
        let input = "caf\u{00C3}\u{00A9}";
        assert_eq!(input, corrupt("café"));
        assert_eq!(repair(input), "café");
    }

    #[test]
    fn test_repair_emoji_and_cjk() {
        assert_eq!(repair(&corrupt("😂")), "😂");
        assert_eq!(repair(&corrupt("你好 👍")), "你好 👍");
    }

    #[test]
    fn test_ascii_is_untouched() {
        let s = "plain ascii text 123";
        assert!(matches!(repair_cow(s), Cow::Borrowed(_)));
        assert_eq!(repair(s), s);
        assert_eq!(repair(&repair(s)), repair(s));
    }

    #[test]
    fn test_high_code_points_pass_through() {
        // Already-correct text outside Latin-1 means the string was never corrupted
        assert_eq!(repair("你好"), "你好");
        assert_eq!(repair("Zoë 👋"), "Zoë 👋");
    }

    #[test]
    fn test_invalid_utf8_returns_input() {
        // Correct Latin-1 "é" is byte E9, which alone is not valid UTF-8
        assert_eq!(repair("café"), "café");
        assert_eq!(repair("\u{00C3}"), "\u{00C3}");
    }

    #[test]
    fn test_repair_value_recursive() {
        let mut value = json!({
            "title": corrupt("Émile"),
            "participants": [{ "name": corrupt("Zoë") }, { "name": "Bob" }],
            "messages": [{
                "content": corrupt("ça va?"),
                "timestamp_ms": 1,
                "reactions": [{ "reaction": corrupt("❤"), "actor": "Bob" }]
            }]
        });

        repair_value(&mut value);

        assert_eq!(value["title"], "Émile");
        assert_eq!(value["participants"][0]["name"], "Zoë");
        assert_eq!(value["participants"][1]["name"], "Bob");
        assert_eq!(value["messages"][0]["content"], "ça va?");
        assert_eq!(value["messages"][0]["timestamp_ms"], 1);
        assert_eq!(value["messages"][0]["reactions"][0]["reaction"], "❤");
    }
}
