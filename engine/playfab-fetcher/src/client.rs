use crate::config::PlayFabConfig;
use crate::error::{FetcherError, Result};
use crate::models::{ApiEnvelope, CombinedInfoRequest, CombinedInfoResult, PlayerRecord, UNKNOWN_ERROR};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Anything that can turn a PlayFab ID into a normalized player record
#[async_trait::async_trait]
pub trait PlayerSource: Send + Sync {
    async fn fetch(&self, playfab_id: &str) -> Result<PlayerRecord>;
}

/// PlayFab Client API wrapper bound to one title and session
pub struct PlayFabClient {
    client: Client,
    base_url: String,
    session_ticket: String,
    parameters: Value,
}

impl PlayFabClient {
    /// Create a client, reading `InfoRequestParameters` from the configured file
    pub fn new(config: &PlayFabConfig) -> Result<Self> {
        let parameters = load_info_request_parameters(&config.parameters_file)?;
        Self::with_parameters(config, parameters)
    }

    /// Create a client with an already loaded `InfoRequestParameters` object
    pub fn with_parameters(config: &PlayFabConfig, parameters: Value) -> Result<Self> {
        if !config.has_session() {
            return Err(FetcherError::config("playfab.session_ticket is empty"));
        }

        Ok(Self {
            client: build_http_client(config.timeout_secs)?,
            base_url: config.api_base_url(),
            session_ticket: config.session_ticket.clone(),
            parameters,
        })
    }

    /// Call `Client/GetPlayerCombinedInfo` for one player
    pub async fn get_player_combined_info(&self, playfab_id: &str) -> Result<CombinedInfoResult> {
        let url = format!("{}/Client/GetPlayerCombinedInfo", self.base_url);
        let body = CombinedInfoRequest {
            play_fab_id: playfab_id,
            info_request_parameters: &self.parameters,
        };

        let response = self
            .client
            .post(&url)
            .header("X-Authorization", &self.session_ticket)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!(playfab_id, status = %status, bytes = text.len(), "GetPlayerCombinedInfo response");

        let envelope: ApiEnvelope<CombinedInfoResult> = decode_envelope(status, &text)?;
        Ok(envelope.data.unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl PlayerSource for PlayFabClient {
    async fn fetch(&self, playfab_id: &str) -> Result<PlayerRecord> {
        let result = self.get_player_combined_info(playfab_id).await?;
        PlayerRecord::from_combined_info(result)
    }
}

/// HTTP client shared by the data and login calls
pub(crate) fn build_http_client(timeout_secs: Option<u64>) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

/// Decode a PlayFab response body.
///
/// A non-success status becomes `Upstream` with PlayFab's `errorMessage`, or
/// [`UNKNOWN_ERROR`] when the body carries none.
pub(crate) fn decode_envelope<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<ApiEnvelope<T>> {
    if !status.is_success() {
        let message = serde_json::from_str::<ApiEnvelope<Value>>(body)
            .ok()
            .and_then(|envelope| envelope.error_message)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
        return Err(FetcherError::upstream(message));
    }

    serde_json::from_str(body)
        .map_err(|e| FetcherError::upstream(format!("Malformed PlayFab response: {e}")))
}

/// Read the `InfoRequestParameters` object from a JSON document
pub fn load_info_request_parameters(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(FetcherError::not_found(format!(
            "Parameters file {} does not exist",
            path.display()
        )));
    }

    let document: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    Ok(document
        .get("InfoRequestParameters")
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default())))
}
