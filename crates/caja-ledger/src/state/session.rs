//! # Session State
//!
//! Per-terminal state that never touches the database: the cart being
//! built and the admin gate.
//!
//! The admin gate is a local string comparison against the configured
//! passphrase. It hides screens from casual use and is NOT a security
//! boundary: anyone with the config file or the process can bypass it.

use caja_core::cart::Cart;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct Session {
    cart: Cart,
    admin_unlocked: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    pub fn is_admin_unlocked(&self) -> bool {
        self.admin_unlocked
    }

    /// Returns whether the attempt matched.
    pub fn unlock_admin(&mut self, attempt: &str, passphrase: &str) -> bool {
        if !passphrase.is_empty() && attempt == passphrase {
            self.admin_unlocked = true;
            info!("Admin screens unlocked");
            true
        } else {
            warn!("Admin unlock attempt rejected");
            false
        }
    }

    pub fn lock_admin(&mut self) {
        if self.admin_unlocked {
            info!("Admin screens locked");
        }
        self.admin_unlocked = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_gate() {
        let mut session = Session::new();
        assert!(!session.is_admin_unlocked());

        assert!(!session.unlock_admin("1234", "admin"));
        assert!(!session.is_admin_unlocked());

        assert!(session.unlock_admin("admin", "admin"));
        assert!(session.is_admin_unlocked());

        session.lock_admin();
        assert!(!session.is_admin_unlocked());
    }

    #[test]
    fn test_empty_passphrase_never_unlocks() {
        let mut session = Session::new();
        assert!(!session.unlock_admin("", ""));
    }
}
