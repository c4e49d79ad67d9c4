//! Markdown export of the conversation history.

use chrono::{DateTime, Local};
use cockpit_core::message::Message;
use std::path::{Path, PathBuf};

const STAMP_FORMAT: &str = "%Y-%m-%d_%H%M";

/// `session_<YYYY-MM-DD_HHMM>.md`
pub fn file_name(now: DateTime<Local>) -> String {
    format!("session_{}.md", now.format(STAMP_FORMAT))
}

/// Render the history as Markdown.
pub fn render(history: &[Message], now: DateTime<Local>) -> String {
    let mut out = format!("# Chat Session - {}\n\n", now.format(STAMP_FORMAT));
    for message in history {
        out.push_str(&format!(
            "## {}\n{}\n\n",
            message.role.as_str().to_uppercase(),
            message.content
        ));
    }
    out
}

/// Write the transcript into `dir` and return the file path.
pub async fn save(
    dir: &Path,
    history: &[Message],
    now: DateTime<Local>,
) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name(now));
    tokio::fs::write(&path, render(history, now)).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 5, 2, 12, 7, 0).unwrap()
    }

    #[test]
    fn file_name_format() {
        assert_eq!(file_name(noon()), "session_2026-05-02_1207.md");
    }

    #[test]
    fn renders_roles_in_upper_case() {
        let history = vec![Message::user("hi"), Message::assistant("hello\n\n[ABORTED]")];
        let md = render(&history, noon());
        assert_eq!(
            md,
            "# Chat Session - 2026-05-02_1207\n\n## USER\nhi\n\n## ASSISTANT\nhello\n\n[ABORTED]\n\n"
        );
    }

    #[test]
    fn empty_history_has_header_only() {
        assert_eq!(render(&[], noon()), "# Chat Session - 2026-05-02_1207\n\n");
    }

    #[tokio::test]
    async fn save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = save(&dir.path().join("out"), &[Message::user("q")], noon())
            .await
            .unwrap();
        assert!(path.ends_with("session_2026-05-02_1207.md"));
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("## USER\nq"));
    }
}
