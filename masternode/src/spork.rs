//! Spork collaborator interface
//!
//! Sporks are runtime feature switches delivered over the network by a
//! privileged key. The only one the core reads is the ping salt: when
//! non-zero it is mixed into ping inventory hashes, invalidating every
//! cached ping at once. A kill switch against ping floods.

use std::sync::atomic::{AtomicI64, Ordering};

pub trait SporkView: Send + Sync {
    /// Current ping hash salt; 0 disables salting.
    fn ping_salt(&self) -> i64;
}

/// In-process spork values, settable at runtime.
#[derive(Debug, Default)]
pub struct StaticSporks {
    ping_salt: AtomicI64,
}

impl StaticSporks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ping_salt(salt: i64) -> Self {
        let sporks = Self::default();
        sporks.set_ping_salt(salt);
        sporks
    }

    pub fn set_ping_salt(&self, salt: i64) {
        self.ping_salt.store(salt, Ordering::Relaxed);
    }
}

impl SporkView for StaticSporks {
    fn ping_salt(&self) -> i64 {
        self.ping_salt.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salt_defaults_to_disabled() {
        assert_eq!(StaticSporks::new().ping_salt(), 0);
    }

    #[test]
    fn test_salt_is_settable() {
        let sporks = StaticSporks::new();
        sporks.set_ping_salt(42);
        assert_eq!(sporks.ping_salt(), 42);
    }
}
