//! Simple `{name}` URL template expansion (RFC 6570 level 1).

use std::collections::BTreeMap;

/// Replaces each `{name}` placeholder with the percent-encoded value of
/// `params[name]`. Undefined placeholders expand to the empty string and an
/// unterminated `{` is copied verbatim.
pub fn expand(template: &str, params: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                if let Some(value) = params.get(name) {
                    out.push_str(&urlencoding::encode(value));
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
