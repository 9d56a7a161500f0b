// ABOUTME: Connection manager library: credential codec, entity store, resolver and access gate
// ABOUTME: The binary wires these into an axum server; tests drive them directly

use std::sync::Arc;

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod crypto;
pub mod entities;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod relations;
pub mod resources;
pub mod routes;
pub mod schema;
pub mod storage;
pub mod types;
pub mod validation;

#[cfg(test)]
mod integration_tests;

use storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
}
