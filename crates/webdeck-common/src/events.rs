use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::id::AppId;

/// Events published by the shell for observers (panels, indicators).
///
/// `ReloadRequested` is also accepted from external emitters; the shell
/// is its sole consumer and interprets a missing id as "the active app".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ShellEvent {
    AppOpened(AppId),
    AppClosed(AppId),
    AppActivated(Option<AppId>),
    FrameLoaded(AppId),
    FrameBlocked(AppId),
    ReloadRequested { id: Option<AppId> },
    UpdateStaged,
    ClipboardCaptured,
    Shutdown,
    #[serde(other)]
    Unknown,
}

pub struct EventBus {
    sender: broadcast::Sender<ShellEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ShellEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: ShellEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}
