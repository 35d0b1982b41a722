//! Mock GoTrue server for development and testing.
//!
//! Implements the slice of the Supabase auth API gatehouse uses, with a fake
//! Google consent page, so the full sign-in flow runs without a real project.

mod server;
mod store;
mod templates;

pub use server::MockGoTrueServer;
