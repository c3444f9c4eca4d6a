//! Concrete message catalogs

pub mod bank;

use crate::msg::MsgRegistry;
use std::sync::Arc;

/// Register every built-in message type
pub fn register_all(registry: &mut MsgRegistry) {
    bank::register(registry);
}

/// A registry holding every built-in message type
pub fn default_registry() -> MsgRegistry {
    let mut registry = MsgRegistry::new();
    register_all(&mut registry);
    registry
}

/// Shared form of [`default_registry`]
pub fn shared_registry() -> Arc<MsgRegistry> {
    Arc::new(default_registry())
}
