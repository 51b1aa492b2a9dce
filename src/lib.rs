#![doc = "The `task_manager` library crate."]
#![doc = ""]
#![doc = "Domain models, persistence, authentication, routing and error handling for"]
#![doc = "the task manager service: users, task statuses, labels and tasks exposed as a"]
#![doc = "JSON REST API behind bearer-token authentication. The binary (`main.rs`) only"]
#![doc = "reads configuration, picks a store and starts the server."]

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod openapi;
pub mod routes;
pub mod seed;
pub mod state;
pub mod store;
pub mod telemetry;

pub use app::create_app;
pub use error::AppError;
pub use state::AppState;
