use axum::extract::State;
use std::sync::Arc;

pub mod api;
pub mod app_env;
pub mod domain;
pub mod dto;
pub mod external_connections;
pub mod logging;
pub mod persistence;
pub mod routing_utils;


/// Everything a request handler needs beyond the request itself
pub struct SharedData {
    pub ext_cxn: persistence::ExternalConnectivity,
    pub session_keys: api::auth::SessionKeys,
}

pub type AppState = State<Arc<SharedData>>;
