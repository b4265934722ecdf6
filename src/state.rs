use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use crate::config::cors::CorsConfig;
use crate::config::database::init_db_pool;
use crate::config::email::EmailConfig;
use crate::config::jwt::JwtConfig;
use crate::config::uploads::UploadConfig;
use crate::utils::email::EmailService;
use crate::utils::files::{FileStorage, LocalFileStorage};

/// Shared application state, cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub email_service: Arc<EmailService>,
    pub storage: Arc<dyn FileStorage>,
}

pub async fn init_app_state() -> AppState {
    let db = init_db_pool().await;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run database migrations");

    info!("Database connected and migrations applied");

    let upload_config = UploadConfig::from_env();

    AppState {
        db,
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        email_service: Arc::new(EmailService::new(EmailConfig::from_env())),
        storage: Arc::new(LocalFileStorage::new(upload_config.upload_dir)),
    }
}
