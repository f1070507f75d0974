//! Install-prompt gating.
//!
//! The hosting environment fires a "before install" prompt event ahead
//! of time; its default behavior is suppressed and the prompt is held
//! until the user explicitly asks to install, then replayed at most
//! once.

type DeferredPrompt = Box<dyn FnOnce() + Send>;

#[derive(Default)]
pub struct InstallPromptGate {
    deferred: Option<DeferredPrompt>,
}

impl InstallPromptGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture a deferred prompt. A newer capture replaces an older
    /// unreplayed one.
    pub fn capture(&mut self, prompt: DeferredPrompt) {
        self.deferred = Some(prompt);
    }

    /// Whether an install prompt is available to offer.
    pub fn available(&self) -> bool {
        self.deferred.is_some()
    }

    /// Replay the captured prompt on explicit user action. Returns
    /// whether a prompt fired; a second call is a no-op.
    pub fn replay(&mut self) -> bool {
        match self.deferred.take() {
            Some(prompt) => {
                prompt();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn replay_fires_captured_prompt_once() {
        let fired = Arc::new(AtomicU32::new(0));
        let mut gate = InstallPromptGate::new();

        let f = Arc::clone(&fired);
        gate.capture(Box::new(move || {
            f.fetch_add(1, Ordering::SeqCst);
        }));
        assert!(gate.available());

        assert!(gate.replay());
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        assert!(!gate.replay());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!gate.available());
    }

    #[test]
    fn replay_without_capture_is_noop() {
        let mut gate = InstallPromptGate::new();
        assert!(!gate.replay());
    }

    #[test]
    fn newer_capture_replaces_older() {
        let fired = Arc::new(AtomicU32::new(0));
        let mut gate = InstallPromptGate::new();

        let f1 = Arc::clone(&fired);
        gate.capture(Box::new(move || {
            f1.fetch_add(1, Ordering::SeqCst);
        }));
        let f2 = Arc::clone(&fired);
        gate.capture(Box::new(move || {
            f2.fetch_add(10, Ordering::SeqCst);
        }));

        gate.replay();
        assert_eq!(fired.load(Ordering::SeqCst), 10);
    }
}
