//! Tag normalization.

use serde::{Deserialize, Serialize};

/// Tags as submitted by a client: a list, or a single comma-separated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagInput {
    List(Vec<String>),
    Delimited(String),
}

impl TagInput {
    /// Lowercase and trim every entry, dropping empty ones.
    ///
    /// Order is kept and duplicates are not removed.
    pub fn normalize(self) -> Vec<String> {
        let entries: Vec<String> = match self {
            TagInput::List(items) => items,
            TagInput::Delimited(raw) => raw.split(',').map(str::to_owned).collect(),
        };

        entries
            .iter()
            .map(|tag| tag.trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn list(items: &[&str]) -> TagInput {
        TagInput::List(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_duplicates_are_preserved() {
        assert_eq!(list(&["Go", " rust ", "GO"]).normalize(), vec!["go", "rust", "go"]);
    }

    #[rstest]
    #[case("Rust, WebAssembly ,  ", vec!["rust", "webassembly"])]
    #[case("single", vec!["single"])]
    #[case(",,,", vec![])]
    #[case("", vec![])]
    fn test_delimited(#[case] raw: &str, #[case] expected: Vec<&str>) {
        assert_eq!(TagInput::Delimited(raw.to_string()).normalize(), expected);
    }

    #[test]
    fn test_list_drops_blank_entries() {
        assert_eq!(list(&["  ", "Async"]).normalize(), vec!["async"]);
    }

    #[test]
    fn test_deserializes_either_shape() {
        let from_list: TagInput = serde_json::from_str(r#"["A", "b"]"#).unwrap();
        let from_str: TagInput = serde_json::from_str(r#""a, b""#).unwrap();

        assert_eq!(from_list.normalize(), vec!["a", "b"]);
        assert_eq!(from_str.normalize(), vec!["a", "b"]);
    }
}
