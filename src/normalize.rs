/// Remove the `**` emphasis markers the optimizer inserts into resume text.
///
/// Everything else, including newlines and single `*` bullets, is kept as-is.
pub fn strip_emphasis(text: &str) -> String {
    text.replace("**", "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_bold_markers() {
        assert_eq!(strip_emphasis("**bold**text"), "boldtext");
    }

    #[test]
    fn test_preserves_layout() {
        let text = "Jane Doe\n\n  * Led **three** teams\n\tShipped v2\n";
        assert_eq!(
            strip_emphasis(text),
            "Jane Doe\n\n  * Led three teams\n\tShipped v2\n"
        );
    }

    #[test]
    fn test_idempotent() {
        for text in ["**a** b", "***x***", "*****", "plain", "", "* list\n* item"] {
            let once = strip_emphasis(text);
            assert_eq!(strip_emphasis(&once), once, "input {:?}", text);
        }
    }

    #[test]
    fn test_empty() {
        assert_eq!(strip_emphasis(""), "");
    }
}
