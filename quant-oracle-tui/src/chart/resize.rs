//! Region width change notification.

use tokio::sync::watch;

/// Broadcasts the width of the chart region.
///
/// Listeners are deregistered by dropping them.
#[derive(Debug)]
pub struct ResizeSignal {
    tx: watch::Sender<u16>,
}

impl ResizeSignal {
    pub fn new(width: u16) -> Self {
        let (tx, _) = watch::channel(width);
        Self { tx }
    }

    /// Publish a width, notifying listeners only if it differs from the last one.
    pub fn notify(&self, width: u16) {
        self.tx.send_if_modified(|current| {
            if *current == width {
                return false;
            }
            *current = width;
            true
        });
    }

    /// Last published width.
    pub fn width(&self) -> u16 {
        *self.tx.borrow()
    }

    /// Register a listener. It only observes widths published after this call.
    pub fn listen(&self) -> ResizeListener {
        ResizeListener {
            rx: self.tx.subscribe(),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Registration on a [`ResizeSignal`].
#[derive(Debug)]
pub struct ResizeListener {
    rx: watch::Receiver<u16>,
}

impl ResizeListener {
    /// The new width if it changed since the last poll.
    pub fn poll(&mut self) -> Option<u16> {
        match self.rx.has_changed() {
            Ok(true) => Some(*self.rx.borrow_and_update()),
            _ => None,
        }
    }
}
