//! Avatar-link finalization: resolving a pending storage task and binding
//! its object to the user's storage collection and avatar profile field.

pub mod service;
pub mod store;
