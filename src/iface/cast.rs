//! Native type tokens to protocol type keywords.

/// Map a native parameter or return type token to the protocol's type
/// vocabulary.
///
/// Exactly one remap is built in: `str` becomes `string`. Everything else
/// is reduced to its bare name (reference sigils and module path prefixes
/// stripped) and passed through verbatim. Unknown names are not an error;
/// the protocol layer rejects them later if it must, this is a best-effort
/// generator.
pub fn cast_type(typeof_: &str) -> String {
    let bare = typeof_.trim();
    let bare = bare.strip_prefix('&').unwrap_or(bare).trim_start();
    let bare = bare.strip_prefix("mut ").unwrap_or(bare).trim_start();
    let bare = bare.rsplit("::").next().unwrap_or(bare).trim();
    match bare {
        "str" => "string".to_string(),
        other => other.to_string(),
    }
}
