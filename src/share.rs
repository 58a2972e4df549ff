//! Share links - a session packed into one URL query parameter
//!
//! The session JSON is lz-string compressed with the URI-component alphabet,
//! so links produced here open in the web version and the other way round.

use crate::content_filter::{self, ContentError};
use crate::session::SessionConfig;
use tauri::Url;
use thiserror::Error;

/// Query parameter holding the packed session
pub const CONFIG_PARAM: &str = "config";

/// Share link errors
#[derive(Error, Debug)]
pub enum ShareError {
    #[error("Invalid link: {0}")]
    InvalidUrl(String),

    #[error("Link has no 'config' parameter")]
    MissingConfig,

    #[error("Shared config could not be decompressed")]
    Decompress,

    #[error("Shared config is not a valid session: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Compress the shareable form of `session` into a parameter value
pub fn encode_session(session: &SessionConfig) -> Result<String, ShareError> {
    let json = serde_json::to_string(&session.for_sharing())?;
    Ok(lz_str::compress_to_encoded_uri_component(json.as_str()))
}

/// Inverse of `encode_session`. The result is sanitized, marked as
/// configured, and has its candles lit.
pub fn decode_session(encoded: &str) -> Result<SessionConfig, ShareError> {
    let wide =
        lz_str::decompress_from_encoded_uri_component(encoded).ok_or(ShareError::Decompress)?;
    let json = String::from_utf16(&wide).map_err(|_| ShareError::Decompress)?;
    if json.is_empty() {
        return Err(ShareError::Decompress);
    }

    let session: SessionConfig = serde_json::from_str(&json)?;
    Ok(session.sanitized().for_sharing())
}

/// Put `session` into `base_url`, replacing any `config` parameter already
/// there and keeping the rest of the query.
pub fn share_link(base_url: &str, session: &SessionConfig) -> Result<String, ShareError> {
    content_filter::check_session_text(session)?;

    let mut url = Url::parse(base_url).map_err(|e| ShareError::InvalidUrl(e.to_string()))?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| *key != CONFIG_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    let encoded = encode_session(session)?;

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(CONFIG_PARAM, &encoded);

    log::debug!("Share link built ({} bytes)", url.as_str().len());
    Ok(url.to_string())
}

/// Restore a session from a full share link or from the bare parameter value
pub fn session_from_link(link: &str) -> Result<SessionConfig, ShareError> {
    let link = link.trim();
    match Url::parse(link) {
        Ok(url) => {
            let encoded = url
                .query_pairs()
                .find(|(key, _)| *key == CONFIG_PARAM)
                .map(|(_, value)| value.into_owned())
                .ok_or(ShareError::MissingConfig)?;
            decode_session(&encoded)
        }
        Err(_) => decode_session(link),
    }
}
