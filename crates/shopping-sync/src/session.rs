//! Session Tracker
//!
//! Remembers which identity the identity provider last reported.

use crate::model::Identity;

/// How an auth-state notification relates to the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    /// Same identity (or none again)
    Unchanged,
    SignedIn,
    SignedOut,
    /// A different identity replaced the previous one
    Switched,
}

impl SessionChange {
    pub fn is_change(self) -> bool {
        self != SessionChange::Unchanged
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    identity: Option<Identity>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }

    /// Record the provider's latest report
    pub fn update(&mut self, identity: Option<Identity>) -> SessionChange {
        let change = match (&self.identity, &identity) {
            (None, None) => SessionChange::Unchanged,
            (None, Some(_)) => SessionChange::SignedIn,
            (Some(_), None) => SessionChange::SignedOut,
            (Some(old), Some(new)) if old.uid == new.uid => SessionChange::Unchanged,
            (Some(_), Some(_)) => SessionChange::Switched,
        };
        self.identity = identity;
        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_transitions() {
        let mut tracker = SessionTracker::new();
        assert_eq!(tracker.update(None), SessionChange::Unchanged);
        assert_eq!(tracker.update(Some(Identity::new("a"))), SessionChange::SignedIn);
        assert_eq!(tracker.update(Some(Identity::new("a"))), SessionChange::Unchanged);
        assert_eq!(tracker.update(Some(Identity::new("b"))), SessionChange::Switched);
        assert_eq!(tracker.current().map(|i| i.uid.as_str()), Some("b"));
        assert_eq!(tracker.update(None), SessionChange::SignedOut);
        assert!(!tracker.is_signed_in());
    }

    #[test]
    fn profile_refresh_keeps_session() {
        let mut tracker = SessionTracker::new();
        tracker.update(Some(Identity::new("a")));
        let mut refreshed = Identity::new("a");
        refreshed.display_name = Some("Ana".into());
        assert_eq!(tracker.update(Some(refreshed)), SessionChange::Unchanged);
        assert_eq!(tracker.current().and_then(|i| i.display_name.as_deref()), Some("Ana"));
    }
}
