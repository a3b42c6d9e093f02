use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use arogya_core::models::intake::Locale;
use arogya_intake::EngineSettings;
use arogya_intake::escalation::ResponseDelivery;
use arogya_intake::settings::DEFAULT_MODEL_ID;

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArogyaConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    #[serde(default)]
    pub config_version: u32,
    pub region: String,
    /// Bucket holding escalation receipts and uploaded audio.
    pub bucket: String,
    pub model_id: String,
    pub locale: Locale,
    pub credentials: CredentialSource,
    pub decision_timeout_secs: u64,
    pub capture_timeout_secs: u64,
    pub inbox: InboxBackend,
    /// Added in v1; older configs are migrated to polling.
    pub response_delivery: ResponseMode,
    pub poll_interval_secs: u64,
    pub created_at: jiff::Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialSource {
    Profile { profile_name: String },
    DefaultChain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboxBackend {
    /// Receipts live only as long as the process.
    Memory,
    S3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    Poll,
    Push,
}

impl ArogyaConfig {
    pub fn new(region: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            config_version: CURRENT_VERSION,
            region: region.into(),
            bucket: bucket.into(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            locale: Locale::Default,
            credentials: CredentialSource::DefaultChain,
            decision_timeout_secs: 8,
            capture_timeout_secs: 60,
            inbox: InboxBackend::S3,
            response_delivery: ResponseMode::Poll,
            poll_interval_secs: 5,
            created_at: jiff::Timestamp::now(),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        let response_delivery = match self.response_delivery {
            ResponseMode::Poll => ResponseDelivery::Poll {
                interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            },
            ResponseMode::Push => ResponseDelivery::Push,
        };
        EngineSettings {
            // Zero would time out every call.
            decision_timeout: Duration::from_secs(self.decision_timeout_secs.max(1)),
            capture_timeout: Duration::from_secs(self.capture_timeout_secs.max(1)),
            response_delivery,
            model_id: self.model_id.clone(),
        }
    }
}

fn config_dir() -> eyre::Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("org.arogya.intake"))
}

pub fn config_path() -> eyre::Result<PathBuf> {
    Ok(config_dir()?.join("config.json"))
}

pub fn has_config() -> bool {
    config_path().map(|p| p.exists()).unwrap_or(false)
}

pub fn load_config() -> eyre::Result<ArogyaConfig> {
    let path = config_path()?;
    let contents = std::fs::read_to_string(&path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;
    parse_config(&contents)
}

/// Parse config file contents, migrating older versions.
pub fn parse_config(contents: &str) -> eyre::Result<ArogyaConfig> {
    // Parse as raw JSON so we can run migrations before deserializing.
    let json: serde_json::Value = serde_json::from_str(contents)?;
    let on_disk_version = json
        .get("config_version")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;

    let migrated = migrate(json, on_disk_version)?;
    let config: ArogyaConfig = serde_json::from_value(migrated)?;
    Ok(config)
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
///
/// Each migration is a pure transform on the raw JSON value.
fn migrate(mut json: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION}). \
             Please update arogya."
        ));
    }

    // v0 → v1: reviewer responses become observable by push as well as poll
    if from_version < 1 {
        let obj = json
            .as_object_mut()
            .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;
        obj.entry("response_delivery")
            .or_insert(serde_json::Value::String("poll".to_string()));
        obj.entry("poll_interval_secs")
            .or_insert(serde_json::Value::Number(5.into()));
        obj.insert(
            "config_version".to_string(),
            serde_json::Value::Number(1.into()),
        );
        tracing::info!("migrated config v0 → v1 (added response_delivery)");
    }

    Ok(json)
}

pub fn save_config(config: &ArogyaConfig) -> eyre::Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)?;

    // Always write the current version, regardless of what was loaded.
    let mut stamped = config.clone();
    stamped.config_version = CURRENT_VERSION;

    let path = dir.join("config.json");
    let json = serde_json::to_string_pretty(&stamped)?;

    // Write to a temp file then rename for atomicity
    let tmp_path = dir.join("config.json.tmp");
    std::fs::write(&tmp_path, json.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, &path)?;

    tracing::info!(path = %path.display(), "config saved");
    Ok(path)
}
