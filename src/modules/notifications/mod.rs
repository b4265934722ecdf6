pub mod controller;
pub mod dispatcher;
pub mod model;
pub mod router;
pub mod service;
