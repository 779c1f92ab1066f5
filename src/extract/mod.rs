//! Flat JSON field extraction.
//!
//! These helpers read a single `"name": value` pair out of a request body by
//! textual search. They are not a JSON parser: the first occurrence of the
//! quoted key wins wherever it appears, nesting and arrays are not
//! understood, and escaped quotes inside string values are not honoured.
//! Bodies that a strict parser would reject still yield whatever the search
//! finds.
//!
//! ```
//! use userbox::extract::{int_field, str_field};
//!
//! let body = r#"{"newuser": 42, "name": "Al"}"#;
//! assert_eq!(int_field(body, "newuser"), 42);
//! assert_eq!(str_field(body, "name"), "Al");
//!
//! assert_eq!(int_field("{}", "newuser"), 0);
//! assert_eq!(str_field("{}", "name"), "");
//! ```

/// String values of this many bytes or more are discarded.
pub const MAX_STR_FIELD_LEN: usize = 255;

/// Returns the integer following `"name":`, or 0 if absent or non-numeric.
///
/// Parsing follows C `atoi`: an optional sign, then as many digits as are
/// present. Out-of-range values saturate at the `i32` bounds.
pub fn int_field(body: &str, name: &str) -> i32 {
    value_after_key(body, name).map_or(0, leading_int)
}

/// Returns the quoted string following `"name":`, or an empty string.
///
/// The value must start with `"` and runs to the next `"`. A missing
/// closing quote, or a value of [`MAX_STR_FIELD_LEN`] bytes or more, also
/// yields an empty string.
pub fn str_field(body: &str, name: &str) -> String {
    let Some(value) = value_after_key(body, name) else {
        return String::new();
    };
    let Some(rest) = value.strip_prefix('"') else {
        return String::new();
    };
    match rest.find('"') {
        Some(end) if end < MAX_STR_FIELD_LEN => rest[..end].to_owned(),
        _ => String::new(),
    }
}

// Text after the first `"name":`, with spaces and tabs skipped.
fn value_after_key<'a>(body: &'a str, name: &str) -> Option<&'a str> {
    let key = format!("\"{name}\":");
    let start = body.find(&key)? + key.len();
    Some(body[start..].trim_start_matches([' ', '\t']))
}

fn leading_int(text: &str) -> i32 {
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let mut value: i64 = 0;
    for digit in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value * 10 + i64::from(digit - b'0');
        if value > i64::from(i32::MAX) + 1 {
            break;
        }
    }
    let value = if negative { -value } else { value };
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
