//! # Probe
//!
//! Loading of precompiled probe objects and attachment of their program to a
//! kernel hook.

pub(crate) mod guard;
pub(crate) use guard::Scoped;

// Re-export object.rs
#[allow(clippy::module_inception)]
pub(crate) mod object;
pub(crate) use object::*;
