//! Subscription trait and implementations to skip event kinds in the parser

use crate::types::EventKind;

/// Decides which event kinds the consumer wants to receive.
///
/// The parser still decodes everything it needs to advance through the
/// file; events of unwanted kinds are simply never yielded.
pub trait Subscription {
    fn wants(&self, _kind: EventKind) -> bool {
        true
    }
}

/// A subscription listing the wanted event kinds explicitly.
///
/// An empty list subscribes to everything.
#[derive(Default)]
pub struct Simple {
    kinds: Vec<EventKind>,
}

impl Simple {
    pub fn new() -> Simple {
        Simple { kinds: vec![] }
    }

    pub fn add_kind(&mut self, kind: EventKind) {
        self.kinds.push(kind);
    }
}

impl Subscription for Simple {
    fn wants(&self, kind: EventKind) -> bool {
        self.kinds.is_empty() || self.kinds.contains(&kind)
    }
}
