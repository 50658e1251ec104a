pub mod config;
pub mod errors;
pub mod layout;
pub mod routes;
pub mod state;
