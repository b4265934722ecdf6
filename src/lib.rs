//! OETS: Online Education & Training System backend.
//!
//! An axum HTTP API over PostgreSQL for running a training organization:
//! departments and role-scoped users, courses that move through a
//! draft / submitted / under-review / approved / rejected / published
//! workflow, team rosters of external instructors, and notification
//! fan-out (persisted in-app records plus email) on submission and
//! publication.
//!
//! Layering per module: `router` wires paths, `controller` handles HTTP,
//! `service` owns transactions and database access. Course-specific rules
//! live in two pure-function modules, `courses::policy` (who may act) and
//! `courses::workflow` (which state changes are legal), so they are
//! testable without a database.

pub mod config;
pub mod docs;
pub mod logging;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod utils;
pub mod validator;
