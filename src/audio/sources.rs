//! Microphone enumeration

use cpal::traits::{DeviceTrait, HostTrait};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Source id prefix for a named input device
pub const INPUT_PREFIX: &str = "input:";

/// Source id that follows the system default input
pub const DEFAULT_SOURCE_ID: &str = "default";

/// Selectable microphone
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioSource {
    /// `"default"` or `"input:<device name>"`, accepted by `MicrophoneCapture::open`
    pub id: String,

    /// Display name
    pub name: String,

    pub is_default: bool,
}

/// Audio source errors
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to enumerate devices: {0}")]
    EnumerationError(String),
}

/// List inputs: the system default entry, then every named input device
/// with the current default device first
pub fn list_sources() -> Result<Vec<AudioSource>, SourceError> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let names = host
        .input_devices()
        .map_err(|e| SourceError::EnumerationError(e.to_string()))?
        .filter_map(|device| device.name().ok())
        .collect();

    let sources = sources_from_names(default_name.as_deref(), names);
    log::debug!("Found {} input devices", sources.len() - 1);
    Ok(sources)
}

fn sources_from_names(default_name: Option<&str>, names: Vec<String>) -> Vec<AudioSource> {
    let mut named: Vec<AudioSource> = names
        .into_iter()
        .map(|name| AudioSource {
            id: format!("{}{}", INPUT_PREFIX, name),
            is_default: default_name == Some(name.as_str()),
            name,
        })
        .collect();
    named.sort_by_key(|s| !s.is_default);

    let default_label = match default_name {
        Some(name) => format!("System default ({})", name),
        None => "System default".to_string(),
    };
    let mut sources = vec![AudioSource {
        id: DEFAULT_SOURCE_ID.to_string(),
        name: default_label,
        is_default: false,
    }];
    sources.extend(named);
    sources
}
