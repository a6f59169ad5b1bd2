//! Process-wide settings.
//!
//! The production gate starts closed: until something explicitly calls
//! `set_production_environment(false)`, registries install nothing and every
//! client talks to its real transport.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

static PRODUCTION: AtomicBool = AtomicBool::new(true);

static DEFAULT_HEADER_NAME: Lazy<RwLock<String>> = Lazy::new(|| RwLock::new(String::new()));

pub fn is_production_environment() -> bool {
    PRODUCTION.load(Ordering::Acquire)
}

pub fn set_production_environment(production: bool) {
    PRODUCTION.store(production, Ordering::Release);
}

/// Header name used by rules that only specify a value.
pub fn default_header_name() -> String {
    DEFAULT_HEADER_NAME.read().clone()
}

pub fn set_default_header_name(name: impl Into<String>) {
    *DEFAULT_HEADER_NAME.write() = name.into();
}
