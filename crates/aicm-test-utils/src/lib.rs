//! Shared test utilities for the AI Config Manager workspace.
//!
//! A dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`home`] - [`TestHome`] builder for a throwaway home directory

pub mod home;

pub use home::TestHome;
