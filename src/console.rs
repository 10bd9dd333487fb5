//! Human-readable narration for probe runs.

use std::io::{self, Write};
use std::time::Duration;

use crate::types::{Artifact, Message};

const RULE_WIDTH: usize = 60;

/// Cut `text` to at most `max` characters, appending `...` when cut.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Writes progress narration to any `Write` sink (stdout in the binary,
/// a buffer in tests).
pub struct Console<W: Write> {
    out: W,
}

impl Console<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn banner(&mut self, title: &str) -> io::Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(self.out, "\n{rule}\n{title}\n{rule}\n")
    }

    pub fn footer(&mut self, title: &str) -> io::Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(self.out, "\n{rule}\n{title}\n{rule}")
    }

    pub fn section(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.out, "\n--- {title} ---")
    }

    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")
    }

    pub fn ok(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "  \u{2713} {text}")
    }

    pub fn pass(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "\u{2713} {text}")
    }

    pub fn warn(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "\u{26a0} {text}")
    }

    pub fn fail(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "\n\u{2717} FAILED: {text}")
    }

    /// Announce a wait before polling begins.
    pub fn waiting_for(&mut self, what: &str, timeout: Duration) -> io::Result<()> {
        writeln!(self.out, "Waiting for {what} (timeout: {}s)...", timeout.as_secs())
    }

    /// Overwrite the current line with the elapsed wait time. Best effort:
    /// a failed progress write never interrupts polling.
    pub fn tick(&mut self, elapsed: Duration) {
        let _ = write!(self.out, "    ... waiting ({}s)\r", elapsed.as_secs());
        let _ = self.out.flush();
    }

    pub fn timed_out(&mut self, what: &str) -> io::Result<()> {
        writeln!(self.out, "  \u{2717} Timeout waiting for {what}")
    }

    pub fn sending(&mut self, content: &str) -> io::Result<()> {
        let head: String = content.chars().take(50).collect();
        writeln!(self.out, "Sending message: {head}...")
    }

    pub fn artifact(&mut self, artifact: &Artifact) -> io::Result<()> {
        writeln!(self.out, "  \u{2713} New artifact created: {}", artifact.id)?;
        writeln!(self.out, "    Type: {}", artifact.kind)?;
        writeln!(self.out, "    URL: {}", artifact.storage_url)?;
        if let Some(source) = &artifact.source_artifact_id {
            writeln!(self.out, "    Source artifact: {source}")?;
        }
        Ok(())
    }

    /// Print the conversation, one line per message.
    pub fn transcript(&mut self, messages: &[Message]) -> io::Result<()> {
        for msg in messages {
            let label = msg.role.as_ref().map(|r| r.label()).unwrap_or("TAILOR");
            writeln!(self.out, "  [{label}] {}", truncate(&msg.content, 80))?;
        }
        Ok(())
    }

    pub fn artifact_row(&mut self, artifact: &Artifact) -> io::Result<()> {
        let source = artifact.source_artifact_id.as_deref().unwrap_or("-");
        writeln!(
            self.out,
            "{}\t{}\t{}\t{}",
            artifact.id, artifact.kind, source, artifact.storage_url
        )
    }

    /// The service could not be reached at all.
    pub fn unreachable(&mut self, endpoint: &str) -> io::Result<()> {
        writeln!(self.out, "\n\u{2717} ERROR: Could not connect to {endpoint}")?;
        writeln!(self.out, "  Make sure the dev server is running: npm run dev")
    }

    pub fn error(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "\n\u{2717} ERROR: {text}")
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageRole;

    fn render(f: impl FnOnce(&mut Console<Vec<u8>>) -> io::Result<()>) -> String {
        let mut console = Console::new(Vec::new());
        f(&mut console).unwrap();
        String::from_utf8(console.into_inner()).unwrap()
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 80), "short");
        assert_eq!(truncate(&"x".repeat(80), 80), "x".repeat(80));
        assert_eq!(truncate(&"x".repeat(81), 80), format!("{}...", "x".repeat(80)));
        // multi-byte characters are never split
        assert_eq!(truncate("ééé", 2), "éé...");
    }

    #[test]
    fn test_tick_overwrites_line() {
        let out = render(|c| {
            c.tick(Duration::from_secs(4));
            Ok(())
        });
        assert_eq!(out, "    ... waiting (4s)\r");
    }

    #[test]
    fn test_sending_always_ends_with_ellipsis() {
        assert_eq!(render(|c| c.sending("hi")), "Sending message: hi...\n");
        let long = "z".repeat(60);
        assert_eq!(
            render(|c| c.sending(&long)),
            format!("Sending message: {}...\n", "z".repeat(50))
        );
    }

    #[test]
    fn test_artifact_details() {
        let a = Artifact {
            id: "a2".into(),
            kind: "image".into(),
            storage_url: "https://cdn/a2.png".into(),
            source_artifact_id: Some("a1".into()),
        };
        let out = render(|c| c.artifact(&a));
        assert!(out.contains("New artifact created: a2"));
        assert!(out.contains("Type: image"));
        assert!(out.contains("URL: https://cdn/a2.png"));
        assert!(out.contains("Source artifact: a1"));

        let plain = Artifact {
            source_artifact_id: None,
            ..a
        };
        assert!(!render(|c| c.artifact(&plain)).contains("Source artifact"));
    }

    #[test]
    fn test_transcript_labels() {
        let messages = vec![
            Message {
                id: "1".into(),
                role: Some(MessageRole::User),
                content: "create a circle".into(),
                author_name: None,
            },
            Message {
                id: "2".into(),
                role: Some(MessageRole::Assistant),
                content: "y".repeat(100),
                author_name: None,
            },
        ];
        let out = render(|c| c.transcript(&messages));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "  [USER] create a circle");
        assert_eq!(lines[1], format!("  [TAILOR] {}...", "y".repeat(80)));
    }
}
