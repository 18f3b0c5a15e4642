// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use serde_json::json;
use splgen::core::generator::literals::{number_literal, spl_compatible_name};
use splgen::core::graph::MetaType;

#[test]
fn test_unsigned_maximums_keep_full_range() {
    let cases = [
        (json!(255), MetaType::UInt8, "255ub"),
        (json!(65535), MetaType::UInt16, "65535uh"),
        (json!(4294967295u64), MetaType::UInt32, "4294967295uw"),
        (json!(18446744073709551615u64), MetaType::UInt64, "18446744073709551615ul"),
        (json!(-1), MetaType::UInt8, "255ub"),
        (json!(-1), MetaType::UInt64, "18446744073709551615ul"),
    ];
    for (value, meta, expected) in cases {
        assert_eq!(number_literal(&value, meta).unwrap(), expected, "{meta} {value}");
    }
}

#[test]
fn test_escaping_legal_identifiers_is_identity() {
    for name in ["a", "Src", "snk_1", "__spl_hash", "ABC123", "x__y"] {
        assert_eq!(spl_compatible_name(name), name);
        assert_eq!(spl_compatible_name(&spl_compatible_name(name)), name);
    }
}

#[test]
fn test_escaped_names_are_legal() {
    for name in ["a.b", "ü", "space here", "dash-name", "emoji😀"] {
        let escaped = spl_compatible_name(name);
        assert!(
            escaped.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_'),
            "{escaped}"
        );
        assert_eq!(spl_compatible_name(&escaped), escaped);
    }
}
