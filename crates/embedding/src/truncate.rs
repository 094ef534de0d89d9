//! Budget-driven truncation of text and records.

use serde_json::{Map, Value};

const ELLIPSIS: char = '…';
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Length in UTF-16 code units.
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Compact JSON text as `JSON.stringify` writes it.
///
/// Whole floats within the safe-integer range lose their fractional part,
/// so `10.0` is written as `10`.
pub fn to_json_string(value: &Value) -> String {
    serde_json::to_string(&js_numbers(value)).unwrap_or_default()
}

pub fn record_to_json_string(record: &Map<String, Value>) -> String {
    serde_json::to_string(&js_record(record)).unwrap_or_default()
}

fn js_record(record: &Map<String, Value>) -> Map<String, Value> {
    record.iter().map(|(k, v)| (k.clone(), js_numbers(v))).collect()
}

fn js_numbers(value: &Value) -> Value {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => {
                Value::from(f as i64)
            }
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(js_numbers).collect()),
        Value::Object(map) => Value::Object(js_record(map)),
        _ => value.clone(),
    }
}

/// Per-value length allowance for a record under `max_chars`.
///
/// Reserves room for braces, commas, quotes and colons plus every key,
/// splits the rest evenly, and never returns less than 100.
pub fn max_value_length(record: &Map<String, Value>, max_chars: usize) -> usize {
    const FLOOR: i64 = 100;

    let n = record.len() as i64;
    if n == 0 {
        return FLOOR as usize;
    }

    let syntax = 2 + (n - 1) + 4 * n;
    let keys: i64 = record.keys().map(|k| utf16_len(k) as i64).sum();
    let available = max_chars as i64 - syntax - keys;

    available.div_euclid(n).max(FLOOR) as usize
}

/// Cut `text` to at most `max_len` UTF-16 units, ending in `…` when cut.
///
/// A cut never splits a surrogate pair; the partial character is dropped.
/// With `max_len == 0` only the last unit is removed before the ellipsis.
pub fn truncate(text: &str, max_len: usize) -> String {
    let len = utf16_len(text);
    if len <= max_len {
        return text.to_string();
    }

    let keep = if max_len == 0 { len - 1 } else { max_len - 1 };
    let mut out = String::with_capacity(text.len().min(keep * 4) + ELLIPSIS.len_utf8());
    let mut used = 0;
    for ch in text.chars() {
        let width = ch.len_utf16();
        if used + width > keep {
            break;
        }
        out.push(ch);
        used += width;
    }
    out.push(ELLIPSIS);
    out
}

/// Shrink a record's values so its serialisation approaches `max_chars`.
///
/// Records that already fit are returned unchanged. Otherwise every value
/// is capped at [`max_value_length`]; string caps are additionally scaled
/// down in proportion when the capped total still exceeds the budget.
/// Non-string values too long to keep are replaced by their truncated
/// serialisation.
pub fn truncate_record(record: &Map<String, Value>, max_chars: usize) -> Map<String, Value> {
    if utf16_len(&record_to_json_string(record)) <= max_chars {
        return record.clone();
    }

    let mvl = max_value_length(record, max_chars);

    let lengths: Vec<usize> = record
        .values()
        .map(|value| match value {
            Value::String(s) => utf16_len(s),
            other => utf16_len(&to_json_string(other)),
        })
        .collect();

    let capped_total: usize = lengths.iter().map(|len| (*len).min(mvl)).sum();
    let reduction = if capped_total > max_chars {
        max_chars as f64 / capped_total as f64
    } else {
        1.0
    };

    record
        .iter()
        .zip(lengths)
        .map(|((key, value), len)| {
            let value = match value {
                Value::String(s) => {
                    let cap = (len.min(mvl) as f64 * reduction).floor() as usize;
                    Value::String(truncate(s, cap))
                }
                other => {
                    let text = to_json_string(other);
                    if utf16_len(&text) > mvl {
                        Value::String(truncate(&text, mvl))
                    } else {
                        other.clone()
                    }
                }
            };
            (key.clone(), value)
        })
        .collect()
}
