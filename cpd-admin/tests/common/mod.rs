//! Shared setup for cpd-admin integration tests: a wiremock backend and a
//! gateway wired to it.

#![allow(dead_code)]

use cpd_admin::config::Settings;
use cpd_admin::gateway::{ApiGateway, RecordingNavigator, ReqwestTransport};
use cpd_admin::models::UserData;
use cpd_admin::session::{SessionStore, TokenData};
use cpd_admin::AppState;
use std::sync::Arc;
use wiremock::MockServer;

pub const TEST_TOKEN: &str = "test-token";

pub struct TestApp {
    pub server: MockServer,
    pub state: AppState,
    pub gateway: Arc<ApiGateway>,
    pub session: Arc<SessionStore>,
    pub navigator: Arc<RecordingNavigator>,
}

impl TestApp {
    /// Real reqwest transport pointed at a fresh mock backend, in-memory
    /// session.
    pub async fn spawn() -> Self {
        let server = MockServer::start().await;
        let session = Arc::new(SessionStore::in_memory());
        Self::with_session(server, session)
    }

    pub fn with_session(server: MockServer, session: Arc<SessionStore>) -> Self {
        let navigator = Arc::new(RecordingNavigator::new());
        let transport = ReqwestTransport::new().expect("Failed to build HTTP client");
        let gateway = Arc::new(
            ApiGateway::new(api_base(&server), Arc::new(transport), session.clone())
                .with_navigator(navigator.clone()),
        );
        let state = AppState::new(gateway.clone(), 30);

        Self {
            server,
            state,
            gateway,
            session,
            navigator,
        }
    }

    pub fn sign_in(&self) {
        self.session.set_credential(&TokenData::new(TEST_TOKEN));
        self.session.set_user(&UserData {
            id: Some("1".to_string()),
            name: Some("Ada Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            role: Some("admin".to_string()),
            ..Default::default()
        });
    }
}

pub fn api_base(server: &MockServer) -> String {
    format!("{}/api", server.uri())
}

pub fn settings_for(server: &MockServer, storage_dir: &std::path::Path) -> Settings {
    let mut settings = Settings::default();
    settings.api.base_url = api_base(server);
    settings.session.storage_dir = Some(storage_dir.to_path_buf());
    settings
}
