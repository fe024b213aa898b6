use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DOUBLE_QUOTED: Regex = Regex::new(r#""소분류"\s*:\s*"([^"]*)""#).unwrap();
    static ref SINGLE_QUOTED: Regex = Regex::new(r#"'소분류'\s*:\s*'([^']*)'"#).unwrap();
}

/// Extract the keyword list from a classifier cell such as
/// `{"대분류": "Telco", "소분류": "5G, 위성"}`. Cells without a quoted
/// `소분류` entry yield an empty string.
pub fn parse_subcat(cell: &str) -> String {
    let value = cell.trim().replace(['\u{201c}', '\u{201d}'], "\"");
    if value.is_empty() {
        return String::new();
    }

    if let Some(caps) = DOUBLE_QUOTED.captures(&value) {
        return caps[1].trim().to_string();
    }
    if let Some(caps) = SINGLE_QUOTED.captures(&value) {
        return caps[1].trim().to_string();
    }

    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_quoted() {
        assert_eq!(parse_subcat(r#"{"대분류": "Telco", "소분류" : " 5G, 위성 "}"#), "5G, 위성");
    }

    #[test]
    fn test_curly_quotes() {
        assert_eq!(parse_subcat("{“소분류”: “GPU, HBM”}"), "GPU, HBM");
    }

    #[test]
    fn test_single_quoted() {
        assert_eq!(parse_subcat("{'대분류': 'AI Infra', '소분류': 'NPU'}"), "NPU");
    }

    #[test]
    fn test_plain_lists_are_not_keywords() {
        assert_eq!(parse_subcat("  LLM, Agent "), "");
        assert_eq!(parse_subcat("AI: LLM, Agent"), "");
    }

    #[test]
    fn test_unparseable_blob_is_empty() {
        assert_eq!(parse_subcat(r#"{"대분류": "Telco"}"#), "");
        assert_eq!(parse_subcat("소분류 없음"), "");
        assert_eq!(parse_subcat("   "), "");
    }
}
