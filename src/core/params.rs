//! Decoder for the compact report-parameter syntax stored with each job:
//! `name = value, name = value`, with optional `"quoted"` strings and
//! `{a, b, c}` multi-select sets.
//!
//! Type inference for a value is attempted in a fixed order and always
//! succeeds; anything that is not recognised as a richer type stays a string.
use std::collections::HashMap;

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::types::ParamValue;

/// Decoded parameters of one report run, keyed by parameter name.
pub type Parameters = HashMap<String, ParamValue>;

/// Decode a full parameter string into named, typed values.
///
/// Entries are separated by commas; commas inside a value that is wholly
/// quoted or wholly braced belong to the value. An entry without `=` is
/// rejected with [`Error::MalformedParameter`]. A blank string decodes to no
/// parameters.
pub fn decode(raw: &str) -> Result<Parameters> {
    let mut parameters = Parameters::new();
    if raw.trim().is_empty() {
        return Ok(parameters);
    }

    let mut entries = split_entries(raw);
    while entries.last().is_some_and(|e| e.trim().is_empty()) {
        entries.pop();
    }

    for entry in entries {
        let Some((name, value)) = entry.split_once('=') else {
            return Err(Error::MalformedParameter {
                entry: entry.trim().to_string(),
            });
        };
        parameters.insert(name.trim().to_string(), decode_value(value));
    }

    Ok(parameters)
}

/// Infer the type of a single value.
///
/// Order: boolean, `{...}` set, quoted string, integer, float, `M/d/yyyy`
/// date, plain string. Set elements skip the boolean step.
pub fn decode_value(raw: &str) -> ParamValue {
    let value = raw.trim();

    if value.eq_ignore_ascii_case("true") {
        return ParamValue::Bool(true);
    }
    if value.eq_ignore_ascii_case("false") {
        return ParamValue::Bool(false);
    }

    if value.len() >= 2 && value.starts_with('{') && value.ends_with('}') {
        let interior = &value[1..value.len() - 1];
        if interior.trim().is_empty() {
            return ParamValue::List(Vec::new());
        }
        let elements = split_elements(interior).into_iter().map(decode_scalar);
        return ParamValue::List(elements.collect());
    }

    decode_scalar(value)
}

fn decode_scalar(raw: &str) -> ParamValue {
    let value = raw.trim();

    // Quotes win over every numeric reading: "42" stays the string 42.
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        return ParamValue::Str(value[1..value.len() - 1].to_string());
    }

    if let Ok(i) = value.parse::<i32>() {
        return ParamValue::Int(i);
    }

    if looks_numeric(value) {
        if let Ok(x) = value.parse::<f64>() {
            return ParamValue::Float(x);
        }
    }

    if let Some(date) = parse_us_date(value) {
        return ParamValue::Date(date);
    }

    ParamValue::Str(value.to_string())
}

/// Rejects the textual float forms (`inf`, `NaN`) so they remain strings.
fn looks_numeric(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_digit())
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
}

/// `month/day/year`, e.g. `3/14/2024` or `03/04/2024`.
fn parse_us_date(value: &str) -> Option<NaiveDate> {
    let mut parts = value.split('/');
    let (month, day, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if !(all_digits(month) && all_digits(day) && all_digits(year)) {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Split a parameter string into `name = value` entries.
///
/// A value is protected from splitting only when it opens with `"` or `{` and
/// its closing quote or brace is followed by a separator or the end of input.
/// Any other quote or brace is an ordinary character.
fn split_entries(s: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    loop {
        let rest = &s[start..];
        let end = match rest.find(['=', ',']) {
            Some(i) if rest[i..].starts_with('=') => value_end(s, start + i + 1, &[',']),
            Some(i) => start + i,
            None => s.len(),
        };
        pieces.push(&s[start..end]);
        if end >= s.len() {
            return pieces;
        }
        start = end + 1;
    }
}

/// Split the interior of a `{...}` set into its elements.
fn split_elements(s: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    loop {
        let end = value_end(s, start, &[',']);
        pieces.push(&s[start..end]);
        if end >= s.len() {
            return pieces;
        }
        start = end + 1;
    }
}

/// Index of the terminator that ends the value starting at `from`, or `s.len()`.
fn value_end(s: &str, from: usize, ends: &[char]) -> usize {
    let start = skip_whitespace(s, from);
    let enclosed = if s[start..].starts_with('"') {
        quoted_end(s, start, ends)
    } else if s[start..].starts_with('{') {
        set_end(s, start, ends)
    } else {
        None
    };
    enclosed.unwrap_or_else(|| s[from..].find(ends).map_or(s.len(), |i| from + i))
}

fn quoted_end(s: &str, open: usize, ends: &[char]) -> Option<usize> {
    s[open + 1..]
        .match_indices('"')
        .map(|(i, _)| skip_whitespace(s, open + 1 + i + 1))
        .find(|&after| closes_value(s, after, ends))
}

fn set_end(s: &str, open: usize, ends: &[char]) -> Option<usize> {
    let mut pos = open + 1;
    loop {
        let end = value_end(s, pos, &[',', '}']);
        match s[end..].chars().next()? {
            ',' => pos = end + 1,
            _ => {
                let after = skip_whitespace(s, end + 1);
                return closes_value(s, after, ends).then_some(after);
            }
        }
    }
}

fn closes_value(s: &str, at: usize, ends: &[char]) -> bool {
    at == s.len() || s[at..].starts_with(ends)
}

fn skip_whitespace(s: &str, from: usize) -> usize {
    s.len() - s[from..].trim_start().len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> ParamValue {
        ParamValue::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn decodes_each_kind() {
        let params = decode("a=1, b=2.5, c=true, d=\"x,y\", e=3/14/2024").unwrap();
        assert_eq!(params.len(), 5);
        assert_eq!(params["a"], ParamValue::Int(1));
        assert_eq!(params["b"], ParamValue::Float(2.5));
        assert_eq!(params["c"], ParamValue::Bool(true));
        assert_eq!(params["d"], ParamValue::Str("x,y".into()));
        assert_eq!(params["e"], date(2024, 3, 14));
    }

    #[test]
    fn entry_without_separator_is_malformed() {
        match decode("bad-entry") {
            Err(Error::MalformedParameter { entry }) => assert_eq!(entry, "bad-entry"),
            other => panic!("expected MalformedParameter, got {:?}", other),
        }
        assert!(decode("a=1, oops, b=2").is_err());
    }

    #[test]
    fn braces_produce_typed_lists() {
        let params = decode("s={1, 2, 3}").unwrap();
        assert_eq!(
            params["s"],
            ParamValue::List(vec![ParamValue::Int(1), ParamValue::Int(2), ParamValue::Int(3)])
        );

        let params = decode("m={\"A,1\", 2.5, 1/2/2023, plain}, n=7").unwrap();
        assert_eq!(
            params["m"],
            ParamValue::List(vec![
                ParamValue::Str("A,1".into()),
                ParamValue::Float(2.5),
                date(2023, 1, 2),
                ParamValue::Str("plain".into()),
            ])
        );
        assert_eq!(params["n"], ParamValue::Int(7));
        assert_eq!(decode_value("{}"), ParamValue::List(vec![]));
    }

    #[test]
    fn set_elements_skip_boolean_inference() {
        assert_eq!(
            decode_value("{true, 1}"),
            ParamValue::List(vec![ParamValue::Str("true".into()), ParamValue::Int(1)])
        );
    }

    #[test]
    fn inference_order_is_preserved() {
        assert_eq!(decode_value("TRUE"), ParamValue::Bool(true));
        assert_eq!(decode_value("\"42\""), ParamValue::Str("42".into()));
        assert_eq!(decode_value("-17"), ParamValue::Int(-17));
        assert_eq!(decode_value("3000000000"), ParamValue::Float(3_000_000_000.0));
        assert_eq!(decode_value("1e3"), ParamValue::Float(1000.0));
        assert_eq!(decode_value("12/31/1999"), date(1999, 12, 31));
        assert_eq!(decode_value("13/40/2024"), ParamValue::Str("13/40/2024".into()));
        assert_eq!(decode_value("NaN"), ParamValue::Str("NaN".into()));
        assert_eq!(decode_value("  hello world "), ParamValue::Str("hello world".into()));
        assert_eq!(decode_value("\""), ParamValue::Str("\"".into()));
    }

    #[test]
    fn names_and_values_are_trimmed() {
        let params = decode("  region =  EMEA  ,count= 3,").unwrap();
        assert_eq!(params["region"], ParamValue::Str("EMEA".into()));
        assert_eq!(params["count"], ParamValue::Int(3));
        assert!(decode("   ").unwrap().is_empty());
    }

    #[test]
    fn value_may_contain_equals_sign() {
        let params = decode("filter=\"a=b\"").unwrap();
        assert_eq!(params["filter"], ParamValue::Str("a=b".into()));
    }

    #[test]
    fn stray_quote_inside_value_does_not_swallow_later_entries() {
        let params = decode("label=12\" pipe, qty=3").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params["label"], ParamValue::Str("12\" pipe".into()));
        assert_eq!(params["qty"], ParamValue::Int(3));
    }

    #[test]
    fn stray_brace_inside_value_does_not_swallow_later_entries() {
        let params = decode("expr=x{y, n=2").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params["expr"], ParamValue::Str("x{y".into()));
        assert_eq!(params["n"], ParamValue::Int(2));
    }

    #[test]
    fn unclosed_quote_still_reports_malformed_entries() {
        match decode("a=\"x, bad") {
            Err(Error::MalformedParameter { entry }) => assert_eq!(entry, "bad"),
            other => panic!("expected MalformedParameter, got {:?}", other),
        }
    }

    #[test]
    fn unclosed_set_falls_back_to_plain_values() {
        let params = decode("ids={1, k=v").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params["ids"], ParamValue::Str("{1".into()));
        assert_eq!(params["k"], ParamValue::Str("v".into()));
        assert!(decode("ids={1, 2").is_err());
    }
}
