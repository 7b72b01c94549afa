use crate::score::parser::parse_score;
use crate::selection::Selection;
use std::fmt::Display;

/// `[a, b, c]`, each value in its `Display` form.
pub fn format_list<T: Display>(values: &[T]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

pub fn assert_eq_selection(input: &str, query: fn(&Selection) -> Selection, expected: &str) {
    let root = parse_score(input).expect("Failed to parse input");
    let result = query(&Selection::from(root));
    assert_eq!(
        result.to_string(),
        expected,
        "selection mismatch for input {:?}, items={:?}",
        input,
        result,
    );
}
