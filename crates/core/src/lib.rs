//! Functional core for gatehouse.
//!
//! - [`auth`]: identity types and the collaborator traits the web layer implements
//! - [`gate`]: the access gate, the root page form actions and the `Outcome` they return

pub mod auth;
pub mod gate;
