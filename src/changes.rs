//! Splits the optimization backend's change summary into display cards.
//!
//! The summary looks like `* **Skills:** Added Python.* **Summary:** Rewritten.`
//! There is no formal grammar, so parsing never fails: anything that doesn't
//! fit falls back to the default title and description below.

const CATEGORY_MARKER: &str = "* **";
const TITLE_END: &str = ":**";
const BOLD: &str = "**";

pub const DEFAULT_TITLE: &str = "Changes";
pub const EMPTY_DESCRIPTION: &str = "No specific changes recorded.";
pub const NO_SUMMARY_PLACEHOLDER: &str =
    "Changes were made to optimize the resume for this position.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeCategory {
    pub index: usize, // render key only
    pub title: String,
    pub description: String,
}

/// Parse a change summary into ordered categories.
///
/// Empty input yields no categories; callers show [`NO_SUMMARY_PLACEHOLDER`].
/// A description containing a literal `:**` is split at the first one.
pub fn parse_changes(summary: &str) -> Vec<ChangeCategory> {
    if summary.is_empty() {
        return Vec::new();
    }

    summary
        .split(CATEGORY_MARKER)
        .enumerate()
        .filter(|(_, segment)| !segment.is_empty())
        .map(|(position, segment)| {
            // Segment 0 is whatever preceded the first marker.
            let opened_by_marker = position > 0;
            parse_segment(segment, opened_by_marker)
        })
        .enumerate()
        .map(|(index, (title, description))| ChangeCategory {
            index,
            title,
            description,
        })
        .collect()
}

fn parse_segment(segment: &str, opened_by_marker: bool) -> (String, String) {
    match segment.split_once(TITLE_END) {
        Some((title, raw)) => {
            let title = title.trim();
            let title = if title.is_empty() { DEFAULT_TITLE } else { title };
            (title.to_string(), clean_description(raw))
        }
        None => {
            // `* **Heading**` without a colon: the bold run is a label, not content.
            let raw = if opened_by_marker {
                segment
                    .split_once(BOLD)
                    .map_or(segment, |(_, after)| after)
            } else {
                segment
            };
            (DEFAULT_TITLE.to_string(), clean_description(raw))
        }
    }
}

fn clean_description(raw: &str) -> String {
    let stripped = raw.replace('*', "");
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        EMPTY_DESCRIPTION.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(summary: &str) -> Vec<(String, String)> {
        parse_changes(summary)
            .into_iter()
            .map(|c| (c.title, c.description))
            .collect()
    }

    #[test]
    fn test_two_categories() {
        assert_eq!(
            pairs("* **Skills:** Added Python.* **Summary:** Rewritten."),
            vec![
                ("Skills".to_string(), "Added Python.".to_string()),
                ("Summary".to_string(), "Rewritten.".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_summary_has_no_categories() {
        assert!(parse_changes("").is_empty());
    }

    #[test]
    fn test_plain_text_becomes_single_default_category() {
        assert_eq!(
            pairs("Tightened the *summary* and reordered experience"),
            vec![(
                "Changes".to_string(),
                "Tightened the summary and reordered experience".to_string()
            )]
        );
    }

    #[test]
    fn test_heading_without_colon() {
        assert_eq!(
            pairs("* **Formatting**"),
            vec![("Changes".to_string(), "No specific changes recorded.".to_string())]
        );
    }

    #[test]
    fn test_heading_without_colon_keeps_trailing_text() {
        assert_eq!(
            pairs("* **Layout** Moved education below experience."),
            vec![(
                "Changes".to_string(),
                "Moved education below experience.".to_string()
            )]
        );
    }

    #[test]
    fn test_empty_description_gets_default() {
        assert_eq!(
            pairs("* **Keywords:** ** *"),
            vec![("Keywords".to_string(), "No specific changes recorded.".to_string())]
        );
    }

    #[test]
    fn test_leading_text_is_kept_as_category() {
        let categories = parse_changes("Overview. * **Skills:** Added Go.");
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].title, "Changes");
        assert_eq!(categories[0].description, "Overview.");
        assert_eq!(categories[1].title, "Skills");
    }

    #[test]
    fn test_indices_follow_output_order() {
        let categories = parse_changes("* **A:** one* **B:** two* **C:** three");
        let indices: Vec<usize> = categories.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_multiline_summary() {
        let summary = "* **Skills:** Added Kubernetes.\n* **Experience:** Quantified *impact*.\n";
        assert_eq!(
            pairs(summary),
            vec![
                ("Skills".to_string(), "Added Kubernetes.".to_string()),
                ("Experience".to_string(), "Quantified impact.".to_string()),
            ]
        );
    }

    #[test]
    fn test_literal_title_end_in_description_splits_at_first() {
        let categories = parse_changes("* **Notes:** ratio 3:** kept");
        assert_eq!(categories[0].title, "Notes");
        assert_eq!(categories[0].description, "ratio 3: kept");
    }
}
