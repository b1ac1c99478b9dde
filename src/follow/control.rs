//! Follow on/off control.
//!
//! The collaborator owning the toggle holds a [`PollControl`]; the poll
//! loop only ever sees the read side, [`ControlFlag`].

use tokio::sync::watch;

/// Write side of the follow flag.
#[derive(Debug)]
pub struct PollControl {
    tx: watch::Sender<bool>,
}

impl PollControl {
    /// Create a control and its first read handle.
    pub fn new(active: bool) -> (Self, ControlFlag) {
        let (tx, rx) = watch::channel(active);
        (Self { tx }, ControlFlag { rx })
    }

    /// Turn following on or off.
    pub fn set_active(&self, active: bool) {
        self.tx.send_replace(active);
    }

    /// Current flag value.
    pub fn is_active(&self) -> bool {
        *self.tx.borrow()
    }

    /// Another read handle.
    pub fn flag(&self) -> ControlFlag {
        ControlFlag {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read side of the follow flag.
#[derive(Debug, Clone)]
pub struct ControlFlag {
    rx: watch::Receiver<bool>,
}

impl ControlFlag {
    /// Current flag value.
    pub fn is_active(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until the flag is on.
    ///
    /// Returns `false` if the [`PollControl`] was dropped while the flag
    /// was off, meaning it can never turn on again.
    pub async fn wait_active(&mut self) -> bool {
        self.rx.wait_for(|active| *active).await.is_ok()
    }
}
