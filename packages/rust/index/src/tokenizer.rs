//! Term extraction shared by indexing and querying.

/// Split on anything that is not alphanumeric and lowercase each piece.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}
