//! PostgreSQL connection pool initialization.
//!
//! The connection string comes from the `DATABASE_URL` environment
//! variable. The pool is created once at startup and cloned into the
//! application state.

use sqlx::PgPool;
use std::env;

/// Initializes the PostgreSQL connection pool.
///
/// # Panics
///
/// Panics if `DATABASE_URL` is not set or the database is unreachable;
/// the server cannot run without it.
pub async fn init_db_pool() -> PgPool {
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to database")
}
