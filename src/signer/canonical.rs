/* This file is part of SAGE (https://github.com/sage-x-project/sage)
 *
 * Copyright (C) 2024-2026 SAGE-X-project contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Signature-base construction, spec.md §4.7: one line per covered
//! field, lowercase names, collapsed/trimmed header values, sorted
//! query params, a trailing `@signature-params` line.

use std::collections::BTreeMap;

/// The subset of a message the signer can commit to. `headers` is a
/// flat map so lookups are case-insensitive at the call site; callers
/// should lowercase keys before constructing this.
pub struct SignableMessage<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub query: &'a str,
    pub headers: &'a BTreeMap<String, String>,
}

/// Collapses internal whitespace to single spaces and trims the ends,
/// per spec.md §4.7's header-value canonicalisation rule.
fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn sorted_query(query: &str) -> String {
    if query.is_empty() {
        return String::new();
    }
    let mut pairs: Vec<&str> = query.split('&').collect();
    pairs.sort_unstable();
    pairs.join("&")
}

fn field_line(msg: &SignableMessage, field: &str) -> Option<String> {
    let lower = field.to_lowercase();
    match lower.as_str() {
        "@method" => Some(format!("\"@method\": {}", msg.method.to_lowercase())),
        "@path" => Some(format!("\"@path\": {}", msg.path)),
        "@query" => Some(format!("\"@query\": {}", sorted_query(msg.query))),
        header_name => msg
            .headers
            .iter()
            .find(|(k, _)| k.to_lowercase() == header_name)
            .map(|(_, v)| format!("\"{header_name}\": {}", collapse_whitespace(v))),
    }
}

/// Builds the full signature base: one line per covered field in the
/// order given, followed by the `@signature-params` trailer that
/// binds `created`, `keyid` and `alg` into what gets signed.
pub fn build_signature_base(
    msg: &SignableMessage,
    covered: &[String],
    created: u64,
    key_id: &str,
    alg: &str,
) -> String {
    let mut lines: Vec<String> = covered
        .iter()
        .filter_map(|field| field_line(msg, field))
        .collect();

    let covered_list = covered
        .iter()
        .map(|f| format!("\"{}\"", f.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" ");
    lines.push(format!(
        "\"@signature-params\": ({covered_list});created={created};keyid=\"{key_id}\";alg=\"{alg}\""
    ));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_values_are_collapsed_and_trimmed() {
        let mut headers = BTreeMap::new();
        headers.insert("date".to_string(), "  Mon,  01 Jan  2026 \t 00:00:00 GMT ".to_string());
        let msg = SignableMessage { method: "GET", path: "/x", query: "", headers: &headers };
        let base = build_signature_base(&msg, &["date".to_string()], 1000, "kid-1", "ed25519");
        assert!(base.contains("\"date\": Mon, 01 Jan 2026 00:00:00 GMT"));
    }

    #[test]
    fn query_params_are_sorted() {
        let headers = BTreeMap::new();
        let msg = SignableMessage { method: "GET", path: "/x", query: "b=2&a=1", headers: &headers };
        let base = build_signature_base(&msg, &["@query".to_string()], 1000, "kid-1", "ed25519");
        assert!(base.contains("\"@query\": a=1&b=2"));
    }

    #[test]
    fn omitting_a_covered_field_changes_the_base() {
        let mut headers = BTreeMap::new();
        headers.insert("date".to_string(), "d".to_string());
        let msg = SignableMessage { method: "GET", path: "/x", query: "", headers: &headers };
        let full = build_signature_base(
            &msg,
            &["@method".to_string(), "@path".to_string(), "date".to_string()],
            1000,
            "kid-1",
            "ed25519",
        );
        let lied = build_signature_base(
            &msg,
            &["@method".to_string(), "@path".to_string()],
            1000,
            "kid-1",
            "ed25519",
        );
        assert_ne!(full, lied);
    }
}
