//! Clipboard capture: a bounded history of copied text plus a thin
//! system-clipboard wrapper. A refused clipboard read is a non-blocking
//! notice, never an error that escapes the shell.

use std::collections::VecDeque;

use tracing::debug;

use webdeck_common::PlatformError;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Most-recent-first history of captured copy events.
#[derive(Debug)]
pub struct ClipboardHistory {
    entries: VecDeque<String>,
    limit: usize,
}

impl Default for ClipboardHistory {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl ClipboardHistory {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Record a copy event. Empty text and an exact repeat of the most
    /// recent entry are ignored. Returns whether anything was recorded.
    pub fn capture(&mut self, text: &str) -> bool {
        if text.is_empty() || self.entries.front().is_some_and(|t| t == text) {
            return false;
        }
        self.entries.push_front(text.to_string());
        while self.entries.len() > self.limit {
            self.entries.pop_back();
        }
        debug!(len = self.entries.len(), "clipboard entry captured");
        true
    }

    /// Entries, most recent first.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

/// System clipboard backed by `arboard`.
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, PlatformError> {
        let inner = arboard::Clipboard::new()
            .map_err(|e| PlatformError::ClipboardDenied(e.to_string()))?;
        Ok(Self { inner })
    }

    pub fn get_text(&mut self) -> Result<String, PlatformError> {
        self.inner
            .get_text()
            .map_err(|e| PlatformError::ClipboardDenied(e.to_string()))
    }
}
