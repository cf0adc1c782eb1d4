//! # Single-slot subscriber registries.
//!
//! [`TargetRegistry`] maps a caller identity to exactly one target server.
//! The orchestrator keeps two independent instances:
//! - **delayed joins**: callers to connect once their target is ready;
//! - **notifications**: callers to tell the outcome, without connecting.
//!
//! ## Rules
//! - `set` replaces any previous target of the identity; re-registering the
//!   same target is reported as [`Placement::AlreadyQueued`] and changes nothing.
//! - `drain_targeting(S)` atomically removes and returns every identity targeting `S`;
//!   entries for other servers are untouched.
//! - All operations take the same internal lock, so they are atomic with respect
//!   to each other. No lock is ever held across an `.await`.

use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::Mutex;

/// Result of [`TargetRegistry::set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// The identity had no target before.
    Added,
    /// The identity targeted another server, which it no longer does.
    Replaced {
        /// Previous target.
        previous: String,
    },
    /// The identity already targeted this server.
    AlreadyQueued,
}

/// Identity → target server map, at most one target per identity.
#[derive(Debug)]
pub struct TargetRegistry<K> {
    entries: Mutex<HashMap<K, String>>,
}

impl<K> Default for TargetRegistry<K> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> TargetRegistry<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Points `identity` at `server`, replacing any previous target.
    pub fn set(&self, identity: K, server: &str) -> Placement {
        let mut entries = self.entries.lock();
        match entries.get(&identity) {
            Some(current) if current == server => Placement::AlreadyQueued,
            _ => match entries.insert(identity, server.to_owned()) {
                Some(previous) => Placement::Replaced { previous },
                None => Placement::Added,
            },
        }
    }

    /// Removes the entry of `identity`; returns the target it had, if any.
    pub fn cancel(&self, identity: &K) -> Option<String> {
        self.entries.lock().remove(identity)
    }

    /// Removes and returns every identity currently targeting `server`.
    pub fn drain_targeting(&self, server: &str) -> Vec<K> {
        let mut drained = Vec::new();
        self.entries.lock().retain(|identity, target| {
            if target == server {
                drained.push(identity.clone());
                false
            } else {
                true
            }
        });
        drained
    }

    /// Current target of `identity`.
    pub fn target_of(&self, identity: &K) -> Option<String> {
        self.entries.lock().get(identity).cloned()
    }

    /// Number of identities currently targeting `server`.
    pub fn count_targeting(&self, server: &str) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|target| target.as_str() == server)
            .count()
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True if no identity is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
