/// Canonicalize a free-form ticker into the symbol form the price providers accept.
///
/// Uppercases, trims and rewrites class-share notation (`BRK.B` -> `BRK-B`).
/// Blank input yields an empty string, which callers treat as "no ticker".
pub fn normalize_ticker(raw: &str) -> String {
    raw.trim().to_uppercase().replace('.', "-")
}

/// Like [`normalize_ticker`] but maps blank input to `None`.
pub fn normalized(raw: &str) -> Option<String> {
    let t = normalize_ticker(raw);
    if t.is_empty() {
        None
    } else {
        Some(t)
    }
}
