pub mod api;
pub mod cli;
pub mod config;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod services;
pub mod session;
pub mod startup;

use api::CpdApi;
use gateway::ApiGateway;
use services::SessionFlow;
use session::SessionStore;
use std::sync::Arc;

/// Shared application state: the resource tables, the login flow and the
/// session they all read.
#[derive(Clone)]
pub struct AppState {
    pub api: CpdApi,
    pub flow: Arc<SessionFlow>,
    pub session: Arc<SessionStore>,
}

impl AppState {
    pub fn new(gateway: Arc<ApiGateway>, token_ttl_days: i64) -> Self {
        Self {
            session: gateway.session().clone(),
            flow: Arc::new(SessionFlow::new(gateway.clone()).with_token_ttl_days(token_ttl_days)),
            api: CpdApi::new(gateway),
        }
    }
}
