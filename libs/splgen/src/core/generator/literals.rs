// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! SPL identifier escaping and literal formatting.

use serde_json::Value;

use crate::core::error::{Result, SplError};
use crate::core::graph::{MetaType, Parameter};

use super::submission_time_value;

/// Map any string to a legal SPL identifier.
///
/// ASCII alphanumerics pass through, `_` doubles to `__`, every other UTF-16
/// code unit becomes `_u` plus at least four lowercase hex digits. Names that
/// are already legal identifiers are returned unchanged.
pub fn spl_compatible_name(name: &str) -> String {
    let legal = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if legal {
        return name.to_string();
    }

    let mut out = String::with_capacity(name.len() * 2);
    for unit in name.encode_utf16() {
        match u8::try_from(unit) {
            Ok(b) if b.is_ascii_alphanumeric() => out.push(char::from(b)),
            Ok(b'_') => out.push_str("__"),
            _ => out.push_str(&format!("_u{:04x}", unit)),
        }
    }
    out
}

/// Text after the last `.`, or the whole name.
pub fn basename(name: &str) -> &str {
    match name.rfind('.') {
        Some(i) => &name[i + 1..],
        None => name,
    }
}

/// SPL-legal basename of a dotted stream or port name.
pub fn spl_basename(name: &str) -> String {
    spl_compatible_name(basename(name))
}

/// Double-quoted SPL string literal.
pub fn string_literal(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Render a float the way the JVM's `Double.toString` does: plain decimal
/// with at least one fractional digit inside `[1e-3, 1e7)`, computerized
/// scientific notation (`1.0E-4`) outside it.
pub fn java_double(value: f64) -> String {
    java_floating(value, format!("{:e}", value.abs()))
}

/// `Float.toString` counterpart of [`java_double`].
pub fn java_float(value: f32) -> String {
    java_floating(f64::from(value), format!("{:e}", value.abs()))
}

fn java_floating(value: f64, shortest: String) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let sign = if value.is_sign_negative() { "-" } else { "" };
    if value == 0.0 {
        return format!("{}0.0", sign);
    }

    // `shortest` is `d[.ddd]e<exp>` holding the shortest round-trip digits.
    let (mantissa, exp) = shortest.split_once('e').unwrap_or((shortest.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exp: i32 = exp.parse().unwrap_or(0);

    let abs = value.abs();
    let body = if (1e-3..1e7).contains(&abs) {
        if exp >= 0 {
            let int_len = exp as usize + 1;
            if digits.len() > int_len {
                format!("{}.{}", &digits[..int_len], &digits[int_len..])
            } else {
                format!("{}{}.0", digits, "0".repeat(int_len - digits.len()))
            }
        } else {
            format!("0.{}{}", "0".repeat((-exp - 1) as usize), digits)
        }
    } else {
        let frac = if digits.len() > 1 { &digits[1..] } else { "0" };
        format!("{}.{}E{}", &digits[..1], frac, exp)
    };
    format!("{}{}", sign, body)
}

/// Suffix and signedness of each numeric meta type.
struct NumberFormat {
    suffix: &'static str,
    /// Bit width for integer types.
    bits: Option<u32>,
    unsigned: bool,
}

fn number_format(meta: MetaType) -> Option<NumberFormat> {
    let (suffix, bits, unsigned) = match meta {
        MetaType::Int8 => ("b", Some(8), false),
        MetaType::Int16 => ("h", Some(16), false),
        MetaType::Int32 => ("", Some(32), false),
        MetaType::Int64 => ("l", Some(64), false),
        MetaType::UInt8 => ("ub", Some(8), true),
        MetaType::UInt16 => ("uh", Some(16), true),
        MetaType::UInt32 => ("uw", Some(32), true),
        MetaType::UInt64 => ("ul", Some(64), true),
        MetaType::Float32 => ("w", None, false),
        MetaType::Float64 => ("", None, false),
        MetaType::Boolean | MetaType::RString | MetaType::UString => return None,
    };
    Some(NumberFormat {
        suffix,
        bits,
        unsigned,
    })
}

/// Raw 64-bit pattern of an integer JSON value (number or numeric string).
fn integer_bits(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(|v| v as u64)
            .or_else(|| n.as_u64())
            .or_else(|| n.as_f64().map(|f| f as i64 as u64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(|v| v as u64)
                .ok()
                .or_else(|| s.parse::<u64>().ok())
        }
        _ => None,
    }
}

fn float_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Numeric literal with the SPL suffix of `meta`.
///
/// Integers are truncated to the type's width; unsigned types print the
/// unsigned decimal of that bit pattern (`-1` as `UINT8` is `255ub`).
pub fn number_literal(value: &Value, meta: MetaType) -> Result<String> {
    let format = number_format(meta)
        .ok_or_else(|| SplError::UnmappedType(format!("{} is not a numeric type", meta)))?;
    let invalid = || SplError::UnmappedType(format!("{} is not a valid {} value", value, meta));

    let text = match format.bits {
        Some(bits) => {
            let raw = integer_bits(value).ok_or_else(invalid)?;
            let mask = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
            let masked = raw & mask;
            if format.unsigned {
                masked.to_string()
            } else {
                // Sign-extend back from the type's width.
                let shift = 64 - bits;
                (((masked << shift) as i64) >> shift).to_string()
            }
        }
        None if meta == MetaType::Float32 => java_float(float_value(value).ok_or_else(invalid)? as f32),
        None => java_double(float_value(value).ok_or_else(invalid)?),
    };
    Ok(format!("{}{}", text, format.suffix))
}

/// Literal with an explicit meta type.
pub fn typed_literal(meta: MetaType, value: &Value) -> Result<String> {
    match meta {
        MetaType::Boolean => match value {
            Value::Bool(b) => Ok(b.to_string()),
            Value::String(s) if s == "true" || s == "false" => Ok(s.clone()),
            other => Err(SplError::UnmappedType(format!(
                "{} is not a valid BOOLEAN value",
                other
            ))),
        },
        MetaType::RString => Ok(string_literal(&value_text(value))),
        MetaType::UString => Ok(format!("{}u", string_literal(&value_text(value)))),
        numeric => number_literal(value, numeric),
    }
}

/// Literal for an untyped JSON value. Arrays render as comma separated
/// element lists.
pub fn untyped_literal(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(string_literal(s)),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(i.to_string()),
            None => match n.as_u64() {
                Some(u) => Ok(u.to_string()),
                None => Ok(java_double(n.as_f64().unwrap_or(f64::NAN))),
            },
        },
        Value::Array(items) => {
            let parts = items
                .iter()
                .map(untyped_literal)
                .collect::<Result<Vec<_>>>()?;
            Ok(parts.join(", "))
        }
        Value::Null | Value::Object(_) => Err(SplError::UnmappedType(format!(
            "cannot render {} as an SPL literal",
            value
        ))),
    }
}

/// SPL text of a parameter value. Submission parameters render as a
/// reference to their composite parameter.
pub fn parameter_value(param: &Parameter) -> Result<String> {
    match param {
        Parameter::Literal(value) => untyped_literal(value),
        Parameter::Typed { meta_type, value } => typed_literal(*meta_type, value),
        Parameter::Enum(text)
        | Parameter::SplType(text)
        | Parameter::Attribute(text)
        | Parameter::Expression(text) => Ok(text.clone()),
        Parameter::Submission(sp) => Ok(submission_time_value::reference(&sp.name)),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
