//! Chat log and the feedback sink used by commands.
//!
//! Lines may contain bracket markers (`[#RRGGBB]`, `[14]`, `[]`) that the UI
//! turns into styling. They are stored and passed through verbatim.

use std::collections::VecDeque;

use crate::peer_id::PeerId;

/// Maximum length of a message sent over the lobby text channel.
pub const MAX_MESSAGE_LENGTH: usize = 128;
/// Number of lines the log keeps.
pub const MESSAGES_SHOWN: usize = 14;

pub const RED: &str = "#FF341C";
pub const GREEN: &str = "#32CD32";
pub const ORANGE: &str = "#FFA500";
pub const GREY: &str = "#BBBBBB";

/// Receives text lines produced by commands and session notices.
pub trait Feedback {
    fn receive(&mut self, line: &str);
}

impl Feedback for Vec<String> {
    fn receive(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

/// Wraps text in a color marker.
pub fn colored(hex: &str, text: &str) -> String {
    format!("[{hex}]{text}[]")
}

/// Bounded history of received lines, oldest first.
#[derive(Debug, Clone)]
pub struct ChatLog {
    lines: VecDeque<String>,
    max_lines: usize,
    /// Lines received since the last `take_unread`.
    unread: usize,
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new(MESSAGES_SHOWN)
    }
}

impl ChatLog {
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(max_lines),
            max_lines,
            unread: 0,
        }
    }

    /// Records a message sent by a lobby member.
    pub fn receive_from(&mut self, from: PeerId, name: &str, text: &str) {
        let text: String = text.chars().take(MAX_MESSAGE_LENGTH).collect();
        tracing::debug!(%from, "chat message");
        self.receive(&format!("[{ORANGE}]{name}[]: {text}"));
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|s| s.as_str())
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.unread = 0;
    }

    /// Lines that arrived since the last call, oldest first.
    pub fn take_unread(&mut self) -> Vec<String> {
        let skip = self.lines.len() - self.unread;
        self.unread = 0;
        self.lines.iter().skip(skip).cloned().collect()
    }
}

impl Feedback for ChatLog {
    fn receive(&mut self, line: &str) {
        if self.lines.len() == self.max_lines {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_string());
        self.unread = (self.unread + 1).min(self.max_lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_drops_oldest_lines() {
        let mut log = ChatLog::new(2);
        log.receive("a");
        log.receive("b");
        log.receive("c");
        assert_eq!(log.lines().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn member_messages_are_truncated() {
        let mut log = ChatLog::default();
        let long = "x".repeat(300);
        log.receive_from(PeerId::from_account_id(1), "V1", &long);
        let line = log.last().unwrap();
        assert!(line.starts_with("[#FFA500]V1[]: "));
        assert_eq!(line.matches('x').count(), MAX_MESSAGE_LENGTH);
    }

    #[test]
    fn unread_lines_are_taken_once() {
        let mut log = ChatLog::new(3);
        log.receive("a");
        assert_eq!(log.take_unread(), vec!["a"]);
        for line in ["b", "c", "d", "e"] {
            log.receive(line);
        }
        assert_eq!(log.take_unread(), vec!["c", "d", "e"]);
        assert!(log.take_unread().is_empty());
    }

    #[test]
    fn markers_pass_through() {
        let mut log = ChatLog::default();
        log.receive(&colored(RED, "error"));
        assert_eq!(log.last(), Some("[#FF341C]error[]"));
    }
}
