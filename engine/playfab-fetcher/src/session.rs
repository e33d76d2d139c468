//! Session ticket acquisition through `Client/LoginWithCustomID`

use crate::client::build_http_client;
use crate::config::{persist_session_ticket, FetcherConfig, PlayFabConfig};
use crate::error::{FetcherError, Result};
use crate::models::{ApiEnvelope, LoginRequest, LoginResult, UNKNOWN_ERROR};
use std::path::Path;
use tracing::{debug, error, info};

/// Log in with the configured custom ID and return the new session ticket
pub async fn login_with_custom_id(config: &PlayFabConfig) -> Result<String> {
    if config.custom_id.trim().is_empty() {
        return Err(FetcherError::config("playfab.custom_id is required to log in"));
    }

    let url = format!("{}/Client/LoginWithCustomID", config.api_base_url());
    info!(custom_id = %config.custom_id, title_id = %config.title_id, "Requesting PlayFab session");

    let body = LoginRequest {
        custom_id: &config.custom_id,
        title_id: &config.title_id,
        create_account: true,
    };
    let response = build_http_client(config.timeout_secs)?.post(&url).json(&body).send().await?;

    let status = response.status();
    let raw = response.text().await?;
    info!(status = %status, "PlayFab login answered");
    debug!(body = %raw, "PlayFab login response");

    let envelope: ApiEnvelope<LoginResult> = serde_json::from_str(&raw).map_err(|e| {
        error!(error = %e, "Unable to decode PlayFab login response");
        FetcherError::upstream(format!("Unable to decode JSON response: {raw}"))
    })?;

    match envelope.data {
        Some(result) if status.is_success() => {
            if result.newly_created == Some(true) {
                info!(playfab_id = ?result.play_fab_id, "PlayFab created a new account for this custom ID");
            }
            Ok(result.session_ticket)
        }
        _ => {
            let message = envelope.error_message.unwrap_or_else(|| UNKNOWN_ERROR.to_string());
            error!(error = %message, "PlayFab login failed");
            Err(FetcherError::upstream(format!("PlayFab error: {message}")))
        }
    }
}

/// Make sure the configuration carries a session ticket.
///
/// A configuration that already has one is returned as is. Otherwise this logs
/// in, writes the ticket to `config_path` and returns the updated configuration.
pub async fn ensure_session(config: FetcherConfig, config_path: &Path) -> Result<FetcherConfig> {
    if config.playfab.has_session() {
        return Ok(config);
    }

    info!("No session ticket configured, logging in with custom ID");
    let ticket = login_with_custom_id(&config.playfab).await?;
    persist_session_ticket(config_path, &ticket)?;
    info!(path = %config_path.display(), "New session ticket saved");

    Ok(config.with_session_ticket(ticket))
}
