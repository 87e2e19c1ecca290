use secrecy::{ExposeSecret, Secret};
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;

use crate::gateway::{ApiError, ApiResult};
use crate::models::{LoginForm, UserProfile};
use crate::session::{AuthMonitor, AuthState};
use crate::AppState;

fn profile_json(profile: &UserProfile) -> Value {
    json!({
        "id": profile.id,
        "name": profile.display_name(),
        "email": profile.email,
        "role": profile.role,
        "initials": profile.initials(),
    })
}

pub async fn login(
    state: &AppState,
    email: &str,
    password: &Secret<String>,
    remember_me: bool,
) -> ApiResult<Value> {
    let form = LoginForm::new(email, password.expose_secret().as_str(), remember_me);
    state.flow.login(&form).await.map(|message| {
        json!({
            "message": message,
            "user": state.session.get_user().as_ref().map(profile_json),
        })
    })
}

pub async fn logout(state: &AppState) -> ApiResult<Value> {
    state
        .flow
        .logout()
        .await
        .map(|message| json!({ "message": message }))
}

pub async fn whoami(state: &AppState, refresh: bool) -> ApiResult<Value> {
    if refresh {
        return state.flow.refresh_profile().await.map(|p| profile_json(&p));
    }
    match state.session.get_user() {
        Some(profile) if state.session.is_authenticated() => {
            ApiResult::Success(profile_json(&profile))
        }
        _ => ApiResult::Failure(ApiError::Unauthorized("Not logged in".to_string())),
    }
}

pub fn status(state: &AppState) -> ApiResult<Value> {
    ApiResult::Success(json!({
        "state": state.session.auth_state(),
        "user": state.session.get_user().as_ref().map(profile_json),
        "remembered_email": state.session.remembered_email(),
    }))
}

/// Report every session transition until `shutdown` resolves.
pub async fn watch<F>(
    state: &AppState,
    interval: Duration,
    shutdown: impl Future<Output = ()>,
    mut on_change: F,
) -> ApiResult<Value>
where
    F: FnMut(AuthState),
{
    let monitor = AuthMonitor::new(state.session.clone()).with_interval(interval);
    let mut rx = monitor.subscribe();
    let handle = monitor.spawn();

    on_change(*rx.borrow_and_update());

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                on_change(*rx.borrow_and_update());
            }
        }
    }

    let last = *rx.borrow();
    drop(rx);
    handle.abort();
    ApiResult::Success(json!({ "state": last }))
}
