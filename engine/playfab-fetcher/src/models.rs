use crate::error::{FetcherError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Statistics dropped from every record (casual-queue bookkeeping)
pub const EXCLUDED_STATS: [&str; 4] =
    ["CasualRank", "CasualRankTimestamp", "CasualRankSamples", "CasualMatchCount"];

/// Statistics holding Unix timestamps; each gets a `<name>_formatted` companion
pub const TIMESTAMP_STATS: [&str; 2] = ["TeamfightRankTimestamp", "DuelRankTimestamp"];

/// Layout used for `created_at` and the formatted timestamp statistics
pub const SQL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Message used when PlayFab does not say what went wrong
pub const UNKNOWN_ERROR: &str = "unknown error";

/// A single statistic value as reported by PlayFab or derived from one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Statistics keyed by name; inserting a duplicate name keeps the last value
pub type PlayerStats = BTreeMap<String, StatValue>;

/// Normalized player row, ready to be written to the store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRecord {
    pub playfab_id: String,
    pub platform_account_id: String,
    pub platform: String,
    pub username: String,
    pub entity_id: String,
    pub created_at: Option<NaiveDateTime>,
    pub stats: PlayerStats,
}

/// A JSON document carried inside a JSON string field.
///
/// PlayFab user data values are opaque strings; the title stores a serialized
/// object in them, so decoding takes a second `serde_json` pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddedJson<T>(pub T);

impl<T> EmbeddedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for EmbeddedJson<T> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        serde_json::from_str(&raw)
            .map(EmbeddedJson)
            .map_err(|e| de::Error::custom(format!("embedded JSON: {e}")))
    }
}

/// Common PlayFab response wrapper
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub code: Option<u16>,

    #[serde(default)]
    pub status: Option<String>,

    pub data: Option<T>,

    #[serde(default, rename = "errorMessage")]
    pub error_message: Option<String>,
}

/// Body of `Client/GetPlayerCombinedInfo`
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CombinedInfoRequest<'a> {
    pub play_fab_id: &'a str,
    pub info_request_parameters: &'a Value,
}

/// `data` of a `GetPlayerCombinedInfo` response
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CombinedInfoResult {
    pub play_fab_id: Option<String>,
    pub info_result_payload: Option<InfoResultPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InfoResultPayload {
    pub account_info: Option<UserAccountInfo>,
    pub user_read_only_data: Option<UserReadOnlyData>,
    pub player_statistics: Option<Vec<StatisticValue>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UserAccountInfo {
    pub created: Option<String>,
}

/// Only `AccountInfo` is decoded; other read-only keys are ignored
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UserReadOnlyData {
    pub account_info: Option<UserDataRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UserDataRecord {
    pub value: EmbeddedJson<ReadOnlyAccountInfo>,
    pub last_updated: Option<String>,
}

/// Identity document stored by the title under `UserReadOnlyData.AccountInfo`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ReadOnlyAccountInfo {
    #[serde(deserialize_with = "string_or_number")]
    pub play_fab_id: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub platform_account_id: Option<String>,
    pub platform: Option<String>,
    pub name: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub entity_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatisticValue {
    pub statistic_name: String,
    pub value: StatValue,
    #[serde(default)]
    pub version: Option<i64>,
}

/// Body of `Client/LoginWithCustomID`
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginRequest<'a> {
    pub custom_id: &'a str,
    pub title_id: &'a str,
    pub create_account: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginResult {
    pub session_ticket: String,
    #[serde(default)]
    pub play_fab_id: Option<String>,
    #[serde(default)]
    pub newly_created: Option<bool>,
}

/// Platform account IDs are sometimes serialized as numbers
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Null) | None => None,
        Some(other) => return Err(de::Error::custom(format!("expected string, got {other}"))),
    })
}

impl InfoResultPayload {
    /// Decoded `UserReadOnlyData.AccountInfo`, or an empty document if absent
    pub fn read_only_account_info(&mut self) -> ReadOnlyAccountInfo {
        self.user_read_only_data
            .as_mut()
            .and_then(|data| data.account_info.take())
            .map(|record| record.value.into_inner())
            .unwrap_or_default()
    }
}

impl StatValue {
    /// Render a timestamp statistic as a UTC date-time string
    pub fn formatted_timestamp(&self) -> String {
        match self {
            Self::Integer(secs) => format_timestamp(*secs),
            Self::Float(secs) if secs.is_finite() => format_timestamp(secs.trunc() as i64),
            Self::Float(secs) => secs.to_string(),
            Self::Text(text) => text.clone(),
        }
    }
}

impl PlayerRecord {
    /// Project a `GetPlayerCombinedInfo` result into a record.
    ///
    /// Fails with `Validation` when the embedded identity document lacks the
    /// PlayFab ID or the platform account ID.
    pub fn from_combined_info(result: CombinedInfoResult) -> Result<Self> {
        let mut payload = result.info_result_payload.unwrap_or_default();
        let identity = payload.read_only_account_info();

        let playfab_id = non_empty(identity.play_fab_id)
            .ok_or_else(|| FetcherError::validation("PlayFabId is missing in the response"))?;
        let platform_account_id = non_empty(identity.platform_account_id).ok_or_else(|| {
            FetcherError::validation(format!("PlatformAccountId is missing for {playfab_id}"))
        })?;

        let created_at = payload
            .account_info
            .and_then(|info| info.created)
            .as_deref()
            .and_then(parse_iso_datetime);

        Ok(Self {
            playfab_id,
            platform_account_id,
            platform: identity.platform.unwrap_or_default(),
            username: identity.name.unwrap_or_default(),
            entity_id: identity.entity_id.unwrap_or_default(),
            created_at,
            stats: normalize_statistics(payload.player_statistics.unwrap_or_default()),
        })
    }

    /// `created_at` in the layout the store expects
    pub fn created_at_sql(&self) -> Option<String> {
        self.created_at.map(|ts| ts.format(SQL_DATETIME_FORMAT).to_string())
    }

    /// Statistics serialized for the `stats_json` column
    pub fn stats_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.stats)?)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Build the statistics map: drop excluded names, then add formatted timestamps
pub fn normalize_statistics(statistics: Vec<StatisticValue>) -> PlayerStats {
    let mut stats: PlayerStats = statistics
        .into_iter()
        .filter(|stat| !EXCLUDED_STATS.contains(&stat.statistic_name.as_str()))
        .map(|stat| (stat.statistic_name, stat.value))
        .collect();

    for key in TIMESTAMP_STATS {
        if let Some(formatted) = stats.get(key).map(StatValue::formatted_timestamp) {
            stats.insert(format!("{key}_formatted"), StatValue::Text(formatted));
        }
    }

    stats
}

/// Unix seconds to `YYYY-MM-DD HH:MM:SS` (UTC); out-of-range input is echoed back
pub fn format_timestamp(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format(SQL_DATETIME_FORMAT).to_string())
        .unwrap_or_else(|| secs.to_string())
}

/// Parse PlayFab's ISO-8601 timestamps, ignoring a `Z` suffix and fractional seconds
pub fn parse_iso_datetime(raw: &str) -> Option<NaiveDateTime> {
    let cleaned = raw.trim().replace('Z', "");
    let head = cleaned.split('.').next()?;
    if head.is_empty() {
        return None;
    }

    NaiveDateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(head, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S%:z").ok().map(|dt| dt.naive_local())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(head, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
