//! Resource tables: one method per backend operation, each a thin mapping
//! onto [`ApiGateway::request`].

pub mod auth;
pub mod certificates;

pub use auth::AuthApi;
pub use certificates::{CertificateApi, CertificateUpdate};

use std::sync::Arc;

use crate::gateway::ApiGateway;

/// Every resource table, sharing one gateway.
#[derive(Clone)]
pub struct CpdApi {
    gateway: Arc<ApiGateway>,
    auth: AuthApi,
    certificates: CertificateApi,
}

impl CpdApi {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self {
            auth: AuthApi::new(gateway.clone()),
            certificates: CertificateApi::new(gateway.clone()),
            gateway,
        }
    }

    pub fn auth(&self) -> &AuthApi {
        &self.auth
    }

    pub fn certificates(&self) -> &CertificateApi {
        &self.certificates
    }

    pub fn gateway(&self) -> &Arc<ApiGateway> {
        &self.gateway
    }
}
