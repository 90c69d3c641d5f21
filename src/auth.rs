use crate::error::GraphDlError;
use crate::types::SessionCookies;
use log::{debug, info};
use reqwest::Url;
use reqwest_cookie_store::{CookieStore, CookieStoreMutex};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

/// Logs into the web UI and returns the session cookies as a `Cookie` header.
pub async fn login(
    login_url: &str,
    username: &str,
    password: &str,
    timeout: Duration,
) -> Result<SessionCookies, GraphDlError> {
    let url = Url::parse(login_url)
        .map_err(|e| GraphDlError::ConfigError(format!("invalid login URL {}: {}", login_url, e)))?;

    let store = Arc::new(CookieStoreMutex::new(CookieStore::default()));
    let client = reqwest::Client::builder()
        .cookie_provider(Arc::clone(&store))
        .timeout(timeout)
        .build()?;

    let form = [
        ("form", "1"),
        ("form_refresh", "1"),
        ("name", username),
        ("password", password),
        ("enter", "Enter"),
    ];

    info!("Logging in to {} as {}", url, username);
    let resp = client.post(url).form(&form).send().await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(GraphDlError::AuthenticationError { status });
    }

    let guard = store.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(serialize_cookies(&guard))
}

/// Every live cookie from the exchange, whatever domain or path set it.
fn serialize_cookies(store: &CookieStore) -> SessionCookies {
    let pairs: Vec<String> = store
        .iter_unexpired()
        .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
        .collect();
    debug!("Session carries {} cookie(s)", pairs.len());

    SessionCookies::new(pairs.join("; "))
}
