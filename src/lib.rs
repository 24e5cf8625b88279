//! Vostok: server-rendered admin console for a multi-company inventory
//! backend. Pages are rendered with askama; all data lives behind the
//! remote REST API and auth provider.

pub mod config;
pub mod filters;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;
pub mod workflow;
