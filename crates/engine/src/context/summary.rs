//! Artifact previews computed once at ingest time.
//!
//! Large files keep their head (imports, declarations) and their tail,
//! with a marker line in between saying how much was cut.

/// Content longer than this many characters gets a preview.
pub const SUMMARY_THRESHOLD_CHARS: usize = 6000;
/// Lines kept from the top.
pub const HEAD_LINES: usize = 40;
/// Lines kept from the bottom.
pub const TAIL_LINES: usize = 20;

/// Number of lines as the pool reports it (`\n`-separated, so a trailing
/// newline counts as one extra empty line).
pub fn line_count(content: &str) -> usize {
    content.split('\n').count()
}

/// Derive the preview of `content`.
///
/// At or below the threshold the content is returned verbatim. Above it
/// the preview is the first 40 lines, `... [N lines hidden] ...` with
/// `N = total lines − 60`, then the last 20 lines. A preview that would
/// not be shorter than the content (few very long lines) falls back to
/// the content itself.
pub fn summarize(content: &str) -> String {
    if content.chars().count() <= SUMMARY_THRESHOLD_CHARS {
        return content.to_string();
    }

    let lines: Vec<&str> = content.split('\n').collect();
    let total = lines.len();
    if total <= HEAD_LINES + TAIL_LINES {
        return content.to_string();
    }

    let hidden = total - HEAD_LINES - TAIL_LINES;
    let summary = format!(
        "{}\n... [{} lines hidden] ...\n{}",
        lines[..HEAD_LINES].join("\n"),
        hidden,
        lines[total - TAIL_LINES..].join("\n"),
    );

    if summary.len() < content.len() {
        summary
    } else {
        content.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_lines(count: usize, width: usize) -> String {
        (1..=count)
            .map(|i| format!("{:0width$}", i, width = width))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn short_content_is_verbatim() {
        let text = "fn main() {}\n";
        assert_eq!(summarize(text), text);
    }

    #[test]
    fn exactly_threshold_is_verbatim() {
        let text = "x".repeat(SUMMARY_THRESHOLD_CHARS);
        assert_eq!(summarize(&text), text);
    }

    #[test]
    fn large_content_keeps_head_marker_tail() {
        // 500 lines of 20 chars → ~10500 chars
        let text = numbered_lines(500, 20);
        let summary = summarize(&text);
        let lines: Vec<&str> = summary.split('\n').collect();

        assert_eq!(lines.len(), HEAD_LINES + 1 + TAIL_LINES);
        assert_eq!(lines[0], format!("{:020}", 1));
        assert_eq!(lines[HEAD_LINES - 1], format!("{:020}", 40));
        assert_eq!(lines[HEAD_LINES], "... [440 lines hidden] ...");
        assert_eq!(lines[HEAD_LINES + 1], format!("{:020}", 481));
        assert_eq!(*lines.last().unwrap(), format!("{:020}", 500));
    }

    #[test]
    fn trailing_newline_counts_as_a_line() {
        let mut text = numbered_lines(300, 30);
        text.push('\n');
        assert_eq!(line_count(&text), 301);
        assert!(summarize(&text).contains("[241 lines hidden]"));
    }

    #[test]
    fn few_long_lines_fall_back_to_content() {
        let text = "y".repeat(7000);
        assert_eq!(summarize(&text), text);

        let text = format!("{}\n{}", "a".repeat(4000), "b".repeat(4000));
        assert_eq!(summarize(&text), text);
    }

    #[test]
    fn summary_never_longer_than_content() {
        // 61 lines where the hidden one is empty: the marker would add length
        let mut lines: Vec<String> = (0..61).map(|_| "z".repeat(110)).collect();
        lines[HEAD_LINES] = String::new();
        let text = lines.join("\n");
        assert!(text.chars().count() > SUMMARY_THRESHOLD_CHARS);
        assert!(summarize(&text).len() <= text.len());
    }

    #[test]
    fn line_count_of_plain_text() {
        assert_eq!(line_count(""), 1);
        assert_eq!(line_count("a\nb\nc"), 3);
    }
}
