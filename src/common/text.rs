/// Replaces newlines and non-breaking spaces with plain spaces and trims.
pub fn fix_string(s: &str) -> String {
    s.replace(['\n', '\u{a0}'], " ").trim().to_string()
}

/// Collapses every whitespace run (including non-breaking spaces) into one space.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lower-cases and joins words with underscores: `"E-Learning"` -> `"e_learning"`.
pub fn snake_case(s: &str) -> String {
    s.to_lowercase().replace([' ', '-'], "_")
}
