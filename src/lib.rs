//! onboard: membership onboarding for Hack@UCF
//!
//! Members sign in with Discord and then walk through a series of form
//! steps. Each step is a Kennelish form document: a JSON tree of schema
//! nodes rendered against the member's record and compiled into a validator
//! when the step is submitted.
//!
//! See `kennelish` for the form engine and `server` for the HTTP surface.

pub mod auth;
pub mod config;
pub mod error;
pub mod kennelish;
pub mod member;
pub mod server;

pub use config::Config;
pub use error::{OnboardError, Result};
