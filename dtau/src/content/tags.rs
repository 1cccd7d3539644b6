//! Tag-list normalization.
//!
//! Technologies, genres and categories reach the service in several shapes: a
//! comma-separated form field, a repeated multi-value form field, a JSON array,
//! or a Postgres array literal (`{a,b}`) read back from a text column.
//! [`normalize`] folds all of them into one clean list that is trimmed,
//! free of empty entries, deduplicated and in first-seen order.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;

/// Raw tag input, either a single string or a list of strings.
///
/// Deserializes from a JSON string or a JSON array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum TagInput {
    Text(String),
    List(Vec<String>),
}

impl From<&str> for TagInput {
    fn from(value: &str) -> Self {
        TagInput::Text(value.to_string())
    }
}

impl From<String> for TagInput {
    fn from(value: String) -> Self {
        TagInput::Text(value)
    }
}

impl From<Vec<String>> for TagInput {
    fn from(value: Vec<String>) -> Self {
        TagInput::List(value)
    }
}

impl TagInput {
    pub fn normalize(&self) -> Vec<String> {
        normalize(Some(self))
    }
}

/// Normalize heterogeneous tag input into a clean tag list.
///
/// - `None` gives an empty list.
/// - A string is split on `,`; surrounding `{` `}` are stripped first.
/// - A list has each entry trimmed and empty entries dropped. If exactly one
///   entry survives and it contains a comma, that entry is split like a string
///   (a single text field posted where a multi-value field was expected).
///
/// Never fails.
pub fn normalize(input: Option<&TagInput>) -> Vec<String> {
    let tags = match input {
        None => return Vec::new(),
        Some(TagInput::Text(text)) => split_text(text),
        Some(TagInput::List(items)) => normalize_list(items),
    };
    dedup(tags)
}

/// Normalize a list of raw values, e.g. every value posted for one form field.
pub fn normalize_values<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    dedup(normalize_list(values))
}

fn normalize_list<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    let trimmed: Vec<&str> = items.iter().map(|s| s.as_ref().trim()).filter(|s| !s.is_empty()).collect();

    match trimmed.as_slice() {
        [single] if single.contains(',') => split_text(single),
        _ => trimmed.into_iter().map(str::to_string).collect(),
    }
}

fn split_text(text: &str) -> Vec<String> {
    let text = text.trim();

    // Postgres array literal: {a,b,"c d"}
    if let Some(body) = text.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
        return body
            .split(',')
            .map(|s| s.trim().trim_matches('"').trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }

    text.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

fn dedup(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(tags.len());
    tags.into_iter().filter(|tag| seen.insert(tag.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> TagInput {
        TagInput::List(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_none_and_empty() {
        assert!(normalize(None).is_empty());
        assert!(normalize(Some(&TagInput::from(""))).is_empty());
        assert!(normalize(Some(&TagInput::from("  , ,"))).is_empty());
        assert!(normalize(Some(&list(&[]))).is_empty());
        assert!(normalize(Some(&list(&["", "   "]))).is_empty());
    }

    #[test]
    fn test_comma_separated_string() {
        assert_eq!(normalize(Some(&TagInput::from("Python, React"))), vec!["Python", "React"]);
        assert_eq!(normalize(Some(&TagInput::from(" Rust ,,Go "))), vec!["Rust", "Go"]);
    }

    #[test]
    fn test_postgres_array_literal() {
        assert_eq!(normalize(Some(&TagInput::from("{x,y}"))), vec!["x", "y"]);
        assert_eq!(normalize(Some(&TagInput::from("{}"))), Vec::<String>::new());
        assert_eq!(normalize(Some(&TagInput::from(r#"{"Machine Learning",IoT}"#))), vec!["Machine Learning", "IoT"]);
    }

    #[test]
    fn test_single_list_entry_with_comma_is_resplit() {
        assert_eq!(normalize(Some(&list(&["a,b"]))), vec!["a", "b"]);
        assert_eq!(normalize(Some(&list(&["  a , b ", ""]))), vec!["a", "b"]);
    }

    #[test]
    fn test_multi_entry_list_is_not_resplit() {
        // Only a lone entry is treated as a comma-separated field
        assert_eq!(normalize(Some(&list(&["a, b", "c"]))), vec!["a, b", "c"]);
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        assert_eq!(normalize(Some(&TagInput::from("b, a, b, c, a"))), vec!["b", "a", "c"]);
        assert_eq!(normalize_values(&["x", " x ", "y"]), vec!["x", "y"]);
    }

    #[test]
    fn test_idempotent_on_clean_lists() {
        let inputs = [
            TagInput::from("Python, React, Python"),
            TagInput::from("{x,y}"),
            list(&["a,b"]),
            list(&["one", "two", "three"]),
        ];

        for input in inputs {
            let once = input.normalize();
            let twice = TagInput::List(once.clone()).normalize();
            assert_eq!(once, twice, "normalizing {input:?} twice changed the result");
        }
    }

    #[test]
    fn test_deserializes_from_string_or_array() {
        let text: TagInput = serde_json::from_str(r#""a, b""#).unwrap();
        assert_eq!(text.normalize(), vec!["a", "b"]);

        let array: TagInput = serde_json::from_str(r#"["a", " b "]"#).unwrap();
        assert_eq!(array.normalize(), vec!["a", "b"]);
    }
}
