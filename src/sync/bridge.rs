//! Notifications from the controller to the UI thread.
//!
//! Redraw requests are coalesced: while one is waiting to be drained,
//! further requests are dropped. Other events are fire-and-forget; if the
//! UI falls behind and the channel fills, new events are discarded rather
//! than blocking the controller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::error::Severity;
use crate::model::EntityId;

/// Channel capacity for events (controller → UI).
const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// Something drawn changed
    RedrawRequested,

    /// The selected entity changed, `None` when cleared
    SelectionChanged(Option<EntityId>),

    /// A neuron glyph was picked in the 3D view
    NeuronPicked { population: EntityId, neuron: usize },

    /// Non-fatal problem or progress text for the status bar
    Status { severity: Severity, message: String },
}

/// Sending half, held by the controller
#[derive(Debug, Clone)]
pub struct ViewEventSender {
    tx: Sender<ViewEvent>,
    redraw_pending: Arc<AtomicBool>,
}

/// Receiving half, held by the UI
#[derive(Debug)]
pub struct ViewEventReceiver {
    rx: Receiver<ViewEvent>,
    redraw_pending: Arc<AtomicBool>,
}

/// Create a connected sender/receiver pair
pub fn view_channel() -> (ViewEventSender, ViewEventReceiver) {
    let (tx, rx) = bounded(EVENT_CHANNEL_CAPACITY);
    let redraw_pending = Arc::new(AtomicBool::new(false));
    (
        ViewEventSender {
            tx,
            redraw_pending: Arc::clone(&redraw_pending),
        },
        ViewEventReceiver { rx, redraw_pending },
    )
}

impl ViewEventSender {
    pub fn request_redraw(&self) {
        if self.redraw_pending.swap(true, Ordering::AcqRel) {
            return;
        }
        if !self.send(ViewEvent::RedrawRequested) {
            self.redraw_pending.store(false, Ordering::Release);
        }
    }

    /// Send without blocking, returns whether the event was queued
    pub fn send(&self, event: ViewEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(ev)) => {
                tracing::warn!("View event channel full, dropping {:?}", ev);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn status(&self, severity: Severity, message: impl Into<String>) {
        self.send(ViewEvent::Status {
            severity,
            message: message.into(),
        });
    }
}

impl ViewEventReceiver {
    /// Drain all pending events.
    pub fn drain(&self) -> Vec<ViewEvent> {
        let mut events = Vec::new();
        while let Ok(ev) = self.rx.try_recv() {
            if ev == ViewEvent::RedrawRequested {
                self.redraw_pending.store(false, Ordering::Release);
            }
            events.push(ev);
        }
        events
    }
}
