//! Two-phase optimistic value

use serde::Serialize;

/// A value with an optional unconfirmed local proposal layered on top.
///
/// The displayed value is the proposal while one is outstanding. Remote
/// confirmations replace the confirmed value and drop the proposal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Pending<T> {
    confirmed: T,
    pending: Option<T>,
}

impl<T: Copy> Pending<T> {
    pub const fn new(confirmed: T) -> Self {
        Self {
            confirmed,
            pending: None,
        }
    }

    /// The value to render.
    pub fn value(&self) -> T {
        self.pending.unwrap_or(self.confirmed)
    }

    pub const fn confirmed(&self) -> T {
        self.confirmed
    }

    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Record an optimistic local value ahead of a write.
    pub fn propose(&mut self, value: T) {
        self.pending = Some(value);
    }

    /// The write for the outstanding proposal succeeded.
    pub fn settle(&mut self) {
        if let Some(value) = self.pending.take() {
            self.confirmed = value;
        }
    }

    /// The store pushed an authoritative value.
    pub fn confirm(&mut self, value: T) {
        self.confirmed = value;
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_is_displayed_until_settled() {
        let mut hearts = Pending::new(2_u64);
        hearts.propose(3);
        assert_eq!(hearts.value(), 3);
        assert_eq!(hearts.confirmed(), 2);
        assert!(hearts.is_pending());

        hearts.settle();
        assert_eq!(hearts.confirmed(), 3);
        assert!(!hearts.is_pending());
    }

    #[test]
    fn push_overrides_outstanding_proposal() {
        let mut hearts = Pending::new(2_u64);
        hearts.propose(3);
        hearts.confirm(7);
        assert_eq!(hearts.value(), 7);
        assert!(!hearts.is_pending());
    }

    #[test]
    fn settle_without_proposal_is_noop() {
        let mut hearts = Pending::new(4_u64);
        hearts.settle();
        assert_eq!(hearts.value(), 4);
    }
}
