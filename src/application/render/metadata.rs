//! Splits exported-chat metadata lines (`**User:** … **Created:** …`) into
//! one hard-wrapped line per label.

const BOLD: &str = "**";
const LABELS: [&str; 4] = ["User:", "Created:", "Updated:", "Exported:"];
/// Two trailing spaces force a Markdown line break.
const HARD_BREAK: &str = "  ";

/// Whether `text` is a chat metadata line that should be split per label.
pub fn is_chat_metadata(text: &str) -> bool {
    text.contains("**User:**") && text.contains("**Created:**")
}

/// One output line per recognised label, each bold-wrapped and hard-broken.
///
/// Fragments that are empty after trimming are dropped.
pub fn split_metadata_line(text: &str) -> Vec<String> {
    let mut grouper = LabelGrouper::default();
    for fragment in text.split(BOLD) {
        grouper.feed(fragment);
    }

    grouper
        .finish()
        .iter()
        .map(|group| group.trim())
        .filter(|group| !group.is_empty())
        .map(|group| format!("{BOLD}{group}{HARD_BREAK}"))
        .collect()
}

/// Accumulates bold-delimited fragments; a label fragment closes the current
/// group and opens a new one.
#[derive(Default)]
struct LabelGrouper<'a> {
    current: Vec<&'a str>,
    groups: Vec<String>,
}

impl<'a> LabelGrouper<'a> {
    fn feed(&mut self, fragment: &'a str) {
        if LABELS.contains(&fragment) {
            self.flush();
        }
        self.current.push(fragment);
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.groups.push(self.current.join(BOLD));
            self.current.clear();
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_user_and_created() {
        assert_eq!(
            split_metadata_line("**User:** A **Created:** B"),
            vec!["**User:** A  ".to_string(), "**Created:** B  ".to_string()]
        );
    }

    #[test]
    fn splits_all_known_labels() {
        let lines = split_metadata_line(
            "**User:** alice **Created:** 2024-01-01 **Updated:** 2024-01-02 **Exported:** 2024-01-03",
        );
        assert_eq!(
            lines,
            vec![
                "**User:** alice  ",
                "**Created:** 2024-01-01  ",
                "**Updated:** 2024-01-02  ",
                "**Exported:** 2024-01-03  ",
            ]
        );
    }

    #[test]
    fn label_without_value_keeps_its_line() {
        assert_eq!(
            split_metadata_line("**User:** **Created:** B"),
            vec!["**User:**  ".to_string(), "**Created:** B  ".to_string()]
        );
    }

    #[test]
    fn unknown_bold_text_stays_with_its_label() {
        assert_eq!(
            split_metadata_line("**User:** **Bob** **Created:** B"),
            vec!["**User:** **Bob**  ".to_string(), "**Created:** B  ".to_string()]
        );
    }

    #[test]
    fn leading_text_becomes_its_own_line() {
        assert_eq!(
            split_metadata_line("Chat **User:** A **Created:** B"),
            vec!["**Chat  ", "**User:** A  ", "**Created:** B  "]
        );
    }

    #[test]
    fn detection_needs_both_markers() {
        assert!(is_chat_metadata("**User:** A **Created:** B"));
        assert!(!is_chat_metadata("**User:** A"));
        assert!(!is_chat_metadata("User: A Created: B"));
    }
}
