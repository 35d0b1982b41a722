//! Supabase/GoTrue authentication for gatehouse.
//!
//! This crate provides:
//! - A GoTrue HTTP client (authorize URL, PKCE exchange, refresh, user, logout)
//! - Session cookies in the `sb-<ref>-auth-token` format, chunked when large
//! - A request-scoped client implementing the core session and identity traits
//! - The `/auth/callback` route

mod client;
mod config;
pub mod cookies;
mod error;
mod extractors;
mod handlers;
mod server_client;
mod state;

pub use client::GoTrueClient;
pub use config::AuthConfig;
pub use error::AuthError;
pub use handlers::auth_routes;
pub use server_client::ServerClient;
pub use state::AuthState;

#[cfg(feature = "mock")]
pub mod mock_gotrue;
