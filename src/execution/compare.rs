/// Post-trim byte equality; case, inner whitespace and number formatting count.
pub fn matches(actual: &str, expected: &str) -> bool {
    actual.trim() == expected.trim()
}
