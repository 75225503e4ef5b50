//! Shared workspace model for the Boardspace server and client.
//!
//! This crate owns the types both sides agree on (entities, request/response
//! bodies) and the decision logic that must behave identically everywhere:
//! permission ordering, effective-access resolution, sign-up domain rules and
//! the session resolution state machine. It performs no IO.

pub mod display;
pub mod email;
pub mod model;
pub mod permission;
pub mod search;
pub mod session;
pub mod sharing;

pub use model::*;
pub use permission::{Access, Permission, Role};
