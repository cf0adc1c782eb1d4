//! # Boot admission: at most one attempt per server.
//!
//! [`BootRegistry`] is the set of server names with a boot attempt in flight.
//! A name is present iff an attempt for it is running.
//!
//! ## Rules
//! - `try_begin` is an atomic test-and-set: exactly one of N concurrent callers wins.
//! - `end` is unconditional and idempotent.
//! - `is_booting` is a point-in-time read; it may be stale by the time the caller acts on it.
//!
//! The orchestrator never calls `end` by hand: it holds a [`BootSlot`], an RAII
//! guard that releases the name exactly once when dropped. This covers every
//! exit path of an attempt, including a panicking continuation.
//!
//! ```text
//! try_begin(S) ──► BootSlot(S) ──► [launch / poll / resolve] ──► drop ──► end(S)
//!      │
//!      └─ false ──► AlreadyBooting
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

/// Set of servers with a boot attempt in flight.
#[derive(Debug, Default)]
pub struct BootRegistry {
    booting: Mutex<HashSet<String>>,
}

impl BootRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `server` as booting iff it was not already; returns whether this call won.
    pub fn try_begin(&self, server: &str) -> bool {
        let mut booting = self.booting.lock();
        if booting.contains(server) {
            return false;
        }
        booting.insert(server.to_owned())
    }

    /// Clears the booting mark of `server`. Returns whether a mark was present.
    pub fn end(&self, server: &str) -> bool {
        self.booting.lock().remove(server)
    }

    /// Returns true if an attempt for `server` is currently in flight.
    pub fn is_booting(&self, server: &str) -> bool {
        self.booting.lock().contains(server)
    }

    /// Returns a sorted list of servers currently booting.
    pub fn snapshot(&self) -> Vec<String> {
        let mut names: Vec<String> = self.booting.lock().iter().cloned().collect();
        names.sort_unstable();
        names
    }
}

/// Exclusive claim on a server's boot slot; released on drop.
#[derive(Debug)]
pub struct BootSlot {
    registry: Arc<BootRegistry>,
    server: String,
}

impl BootSlot {
    /// Claims the slot of `server`, or returns `None` if an attempt is already in flight.
    pub fn claim(registry: &Arc<BootRegistry>, server: &str) -> Option<Self> {
        registry.try_begin(server).then(|| Self {
            registry: Arc::clone(registry),
            server: server.to_owned(),
        })
    }

    /// Server this slot belongs to.
    pub fn server(&self) -> &str {
        &self.server
    }
}

impl Drop for BootSlot {
    fn drop(&mut self) {
        self.registry.end(&self.server);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_begin_is_exclusive_per_name() {
        let reg = BootRegistry::new();
        assert!(reg.try_begin("survival"));
        assert!(!reg.try_begin("survival"));
        assert!(reg.try_begin("creative"));
        assert_eq!(reg.snapshot(), vec!["creative", "survival"]);
    }

    #[test]
    fn test_end_is_idempotent() {
        let reg = BootRegistry::new();
        assert!(reg.try_begin("lobby"));
        assert!(reg.end("lobby"));
        assert!(!reg.end("lobby"));
        assert!(!reg.is_booting("lobby"));
        assert!(reg.try_begin("lobby"));
    }

    #[test]
    fn test_slot_releases_on_drop() {
        let reg = Arc::new(BootRegistry::new());
        let slot = BootSlot::claim(&reg, "survival").unwrap();
        assert_eq!(slot.server(), "survival");
        assert!(reg.is_booting("survival"));
        assert!(BootSlot::claim(&reg, "survival").is_none());

        drop(slot);
        assert!(!reg.is_booting("survival"));
        assert!(BootSlot::claim(&reg, "survival").is_some());
    }

    #[test]
    fn test_concurrent_claims_have_single_winner() {
        let reg = Arc::new(BootRegistry::new());
        let winners: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|_| s.spawn(|| reg.try_begin("survival") as usize))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });
        assert_eq!(winners, 1);
    }
}
