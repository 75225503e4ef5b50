//! Workspace services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and persistence concerns so route
//! handlers can stay focused on protocol translation and auth plumbing.
//! Every workspace-scoped function takes the caller's [`tenancy::Profile`],
//! whose `domain_id` is the tenant boundary for all of its queries.

pub mod auth;
pub mod company;
pub mod domain;
pub mod group;
pub mod invite;
pub mod profile;
pub mod session;
pub mod share;
pub mod storage;
pub mod whiteboard;
