use std::sync::Arc;

use crate::config::Settings;
use crate::gateway::{ApiGateway, LoggingNavigator, ReqwestTransport, Transport};
use crate::session::SessionStore;
use crate::AppState;

/// Production wiring: file-backed session under the configured storage
/// directory and the reqwest transport.
pub fn build_app_state(settings: &Settings) -> anyhow::Result<AppState> {
    let storage_dir = settings.storage_dir()?;
    let session = SessionStore::open_dir(&storage_dir)
        .map_err(|e| {
            tracing::error!(
                path = %storage_dir.display(),
                error = %e,
                "Failed to open session storage"
            );
            anyhow::anyhow!("Failed to open session storage: {}", e)
        })?
        .with_secure_cookies(settings.secure_cookies());

    let transport = ReqwestTransport::new()
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

    Ok(build_app_state_with(
        settings,
        Arc::new(transport),
        Arc::new(session),
    ))
}

pub fn build_app_state_with(
    settings: &Settings,
    transport: Arc<dyn Transport>,
    session: Arc<SessionStore>,
) -> AppState {
    let gateway = ApiGateway::new(settings.api.base_url.as_str(), transport, session)
        .with_login_route(settings.api.login_route.as_str())
        .with_navigator(Arc::new(LoggingNavigator));

    tracing::debug!(
        base_url = %settings.api.base_url,
        login_route = %settings.api.login_route,
        "API gateway configured"
    );

    AppState::new(Arc::new(gateway), settings.session.token_ttl_days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::TokenData;

    #[test]
    fn file_backed_state_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.session.storage_dir = Some(dir.path().to_path_buf());

        let first = build_app_state(&settings).unwrap();
        first.session.set_credential(&TokenData::new("tok"));
        first.session.set_user(&crate::models::UserData {
            email: Some("ada@example.com".into()),
            ..Default::default()
        });
        drop(first);

        let second = build_app_state(&settings).unwrap();
        assert!(second.session.is_authenticated());
        assert_eq!(second.session.get_user().unwrap().email, "ada@example.com");
    }
}
