pub mod auth;
pub mod courses;
pub mod departments;
pub mod notifications;
pub mod users;
