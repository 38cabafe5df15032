//! Pending-offline timers, at most one per user.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio_util::sync::CancellationToken;

use consulthub_core::types::UserId;

#[derive(Debug)]
struct PendingTimer {
    token: CancellationToken,
    generation: u64,
}

/// `userId → cancellable handle` for grace-period timers on this node.
///
/// The generation number lets a firing timer tell whether its entry is
/// still the current one or was cancelled and replaced meanwhile.
#[derive(Debug, Default)]
pub struct OfflineTimers {
    pending: DashMap<UserId, PendingTimer>,
    next_generation: AtomicU64,
}

/// A newly scheduled timer.
#[derive(Debug, Clone)]
pub struct ScheduledTimer {
    pub token: CancellationToken,
    pub generation: u64,
}

impl OfflineTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a timer for `user`.
    ///
    /// Returns `None` and leaves the existing entry alone if one is pending.
    pub fn schedule(&self, user: UserId) -> Option<ScheduledTimer> {
        match self.pending.entry(user) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                let token = CancellationToken::new();
                slot.insert(PendingTimer {
                    token: token.clone(),
                    generation,
                });
                Some(ScheduledTimer { token, generation })
            }
        }
    }

    /// Cancel `user`'s pending timer. No-op (returns false) when none is pending.
    pub fn cancel(&self, user: UserId) -> bool {
        match self.pending.remove(&user) {
            Some((_, timer)) => {
                timer.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Claim the entry for a timer that has just fired.
    ///
    /// Returns false if it was cancelled or replaced, in which case the
    /// timer must not act.
    pub fn complete(&self, user: UserId, generation: u64) -> bool {
        self.pending
            .remove_if(&user, |_, timer| timer.generation == generation)
            .is_some()
    }

    pub fn is_pending(&self, user: UserId) -> bool {
        self.pending.contains_key(&user)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Cancel everything; used at shutdown.
    pub fn cancel_all(&self) {
        self.pending.retain(|_, timer| {
            timer.token.cancel();
            false
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_keeps_existing() {
        let timers = OfflineTimers::new();
        let user = UserId::new();
        let first = timers.schedule(user).unwrap();
        assert!(timers.schedule(user).is_none());
        assert!(!first.token.is_cancelled());
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn test_cancel_is_noop_when_idle() {
        let timers = OfflineTimers::new();
        let user = UserId::new();
        assert!(!timers.cancel(user));

        let timer = timers.schedule(user).unwrap();
        assert!(timers.cancel(user));
        assert!(timer.token.is_cancelled());
        assert!(!timers.is_pending(user));
    }

    #[test]
    fn test_stale_generation_cannot_complete() {
        let timers = OfflineTimers::new();
        let user = UserId::new();
        let old = timers.schedule(user).unwrap();
        timers.cancel(user);
        let new = timers.schedule(user).unwrap();

        assert!(!timers.complete(user, old.generation));
        assert!(timers.is_pending(user));
        assert!(timers.complete(user, new.generation));
        assert!(timers.is_empty());
    }
}
