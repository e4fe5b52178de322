//! Shared radio session guard
//!
//! The radio is singular, so at most one device may be enabled at a time. Rather
//! than a hidden global, the application's composition root creates one
//! [`RadioSession`] and hands clones of it to every device it constructs. Claims go
//! through an atomic compare-and-swap, so racing `enable` calls elect exactly one
//! device.
//!
//! A claim is pending while bring-up runs. `release` clears pending claims as well
//! as committed ones, so a `disable` that lands mid bring-up wins: the pending
//! device's `commit` then fails and it must turn its stack back off.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const NO_DEVICE: u64 = 0;
const PENDING: u64 = 1 << 63;

// ----------------------------------------------------------------------------
// Device Identity
// ----------------------------------------------------------------------------

/// Identity of a device registered with a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(u64);

impl DeviceId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Outcome of an attempt to claim the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Claim {
    /// The caller now holds a pending claim and must commit or abandon it
    Acquired,
    /// Another device (or the caller itself) already holds the session
    Held(DeviceId),
}

// ----------------------------------------------------------------------------
// Session
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SessionState {
    active: AtomicU64,
    next_id: AtomicU64,
}

/// Handle to the process's radio session, cheap to clone
#[derive(Debug, Clone, Default)]
pub struct RadioSession {
    inner: Arc<SessionState>,
}

impl RadioSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an identity for a new device
    pub(crate) fn register(&self) -> DeviceId {
        DeviceId(self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// The device currently holding the session, once its bring-up completed
    pub fn active(&self) -> Option<DeviceId> {
        match self.inner.active.load(Ordering::Acquire) {
            NO_DEVICE => None,
            raw if raw & PENDING != 0 => None,
            raw => Some(DeviceId(raw)),
        }
    }

    pub fn is_active(&self, id: DeviceId) -> bool {
        self.active() == Some(id)
    }

    pub(crate) fn try_claim(&self, id: DeviceId) -> Claim {
        match self.inner.active.compare_exchange(
            NO_DEVICE,
            id.0 | PENDING,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => Claim::Acquired,
            Err(holder) => Claim::Held(DeviceId(holder & !PENDING)),
        }
    }

    /// Turn a pending claim into the active session
    ///
    /// Returns `false` if the claim was released in the meantime.
    pub(crate) fn commit(&self, id: DeviceId) -> bool {
        self.inner
            .active
            .compare_exchange(
                id.0 | PENDING,
                id.0,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Drop a pending claim after a failed bring-up
    pub(crate) fn abandon(&self, id: DeviceId) {
        let _ = self.inner.active.compare_exchange(
            id.0 | PENDING,
            NO_DEVICE,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Clear the session whoever holds it
    pub(crate) fn release(&self) {
        self.inner.active.store(NO_DEVICE, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_commit_release() {
        let session = RadioSession::new();
        let a = session.register();
        let b = session.register();
        assert_ne!(a, b);
        assert_eq!(session.active(), None);

        assert_eq!(session.try_claim(a), Claim::Acquired);
        // Pending claims are not yet visible as active
        assert_eq!(session.active(), None);
        assert_eq!(session.try_claim(b), Claim::Held(a));

        assert!(session.commit(a));
        assert!(session.is_active(a));
        assert_eq!(session.try_claim(b), Claim::Held(a));
        assert_eq!(session.try_claim(a), Claim::Held(a));

        session.release();
        assert_eq!(session.active(), None);
        assert_eq!(session.try_claim(b), Claim::Acquired);
    }

    #[test]
    fn test_release_fails_pending_claim() {
        let session = RadioSession::new();
        let a = session.register();
        let b = session.register();

        assert_eq!(session.try_claim(a), Claim::Acquired);
        session.release();
        assert!(!session.commit(a));
        assert_eq!(session.active(), None);

        // A claim taken by someone else in between is not overwritten
        assert_eq!(session.try_claim(a), Claim::Acquired);
        session.release();
        assert_eq!(session.try_claim(b), Claim::Acquired);
        assert!(!session.commit(a));
        assert!(session.commit(b));
        assert!(session.is_active(b));
    }

    #[test]
    fn test_abandon_only_drops_own_pending_claim() {
        let session = RadioSession::new();
        let a = session.register();
        let b = session.register();

        assert_eq!(session.try_claim(a), Claim::Acquired);
        session.abandon(b);
        assert_eq!(session.try_claim(b), Claim::Held(a));
        session.abandon(a);
        assert_eq!(session.try_claim(b), Claim::Acquired);
    }

    #[test]
    fn test_racing_claims_elect_one_device() {
        let session = RadioSession::new();
        let ids: Vec<_> = (0..8).map(|_| session.register()).collect();

        let winners: usize = std::thread::scope(|scope| {
            ids.iter()
                .map(|id| {
                    let session = session.clone();
                    let id = *id;
                    scope.spawn(move || session.try_claim(id) == Claim::Acquired)
                })
                .collect::<Vec<_>>()
                .into_iter()
                .map(|handle| handle.join().unwrap() as usize)
                .sum()
        });
        assert_eq!(winners, 1);
    }
}
