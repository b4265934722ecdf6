//! Configuration for the OETS backend.
//!
//! Each submodule owns one aspect of runtime configuration, loaded from
//! environment variables once at startup and carried in `AppState`. The
//! workflow and dispatcher never read the environment themselves.

pub mod cors;
pub mod database;
pub mod email;
pub mod jwt;
pub mod uploads;
