pub mod email;
pub mod errors;
pub mod files;
pub mod jwt;
pub mod pagination;
pub mod password;
