use crossbeam_channel::{unbounded, Receiver, Sender};
use graphedit_core::ElementId;
use std::fmt;

use crate::telemetry::new_correlation_id;
use crate::Action;

/// What a handler did, reported back through the envelope callback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub action: &'static str,
    pub correlation_id: String,
    pub created: Vec<ElementId>,
    pub touched: Vec<ElementId>,
}

pub type ActionCallback = Box<dyn FnOnce(&DispatchOutcome) + Send>;

pub struct ActionEnvelope {
    pub correlation_id: String,
    pub action: Action,
    pub callback: Option<ActionCallback>,
}

impl ActionEnvelope {
    pub fn new(action: Action) -> Self {
        Self {
            correlation_id: new_correlation_id(),
            action,
            callback: None,
        }
    }

    pub fn with_callback(mut self, callback: impl FnOnce(&DispatchOutcome) + Send + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }
}

impl From<Action> for ActionEnvelope {
    fn from(action: Action) -> Self {
        Self::new(action)
    }
}

impl fmt::Debug for ActionEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionEnvelope")
            .field("correlation_id", &self.correlation_id)
            .field("action", &self.action)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// FIFO buffer for actions that arrive before the document is ready.
#[derive(Clone)]
pub struct ActionQueue {
    tx: Sender<ActionEnvelope>,
    rx: Receiver<ActionEnvelope>,
}

impl Default for ActionQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<ActionEnvelope> {
        self.tx.clone()
    }

    pub fn push(&self, envelope: ActionEnvelope) {
        // Both ends live in `self`, so the channel cannot be disconnected here.
        let _ = self.tx.send(envelope);
    }

    pub fn pop(&self) -> Option<ActionEnvelope> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Drops everything still queued; returns how many envelopes were discarded.
    pub fn clear(&self) -> usize {
        self.rx.try_iter().count()
    }

    /// Hand at most `limit` pending envelopes to a listener, in order.
    /// Returns the number delivered.
    pub fn drain_to<L: ActionListener>(&self, listener: &mut L, limit: usize) -> usize {
        let mut delivered = 0;
        while delivered < limit {
            let Some(envelope) = self.pop() else {
                break;
            };
            listener.handle_action(envelope);
            delivered += 1;
        }
        delivered
    }
}

/// Trait for components that consume queued actions.
pub trait ActionListener {
    fn handle_action(&mut self, envelope: ActionEnvelope);
}
