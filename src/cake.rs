//! Cake catalogue
//!
//! The core only ever needs a cake's candle geometry. Artwork itself (built-in
//! illustration or an uploaded image) is resolved by the front end.

use crate::layout::CakeGeometry;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Prefix shared by every uploaded cake id
pub const CUSTOM_CAKE_PREFIX: &str = "custom-";

/// Uploaded images above this size are refused (decoded bytes)
pub const MAX_CUSTOM_IMAGE_BYTES: usize = 8 * 1024 * 1024;

/// Geometry used for every uploaded cake
pub const CUSTOM_CAKE_GEOMETRY: CakeGeometry = CakeGeometry {
    base_y_percent: 40.0,
    base_width_percent: 50.0,
};

/// Custom cake errors
#[derive(Error, Debug, PartialEq)]
pub enum CakeError {
    #[error("Not a data URL")]
    NotDataUrl,

    #[error("Unsupported media type: {0}")]
    NotAnImage(String),

    #[error("Image data must be base64 encoded")]
    NotBase64,

    #[error("Invalid image data: {0}")]
    InvalidData(String),

    #[error("Image is too large ({0} bytes)")]
    TooLarge(usize),
}

/// Cake illustration: one of the bundled ones, or an uploaded image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CakeArtwork {
    BuiltIn(String),
    Custom(String),
}

/// Selectable cake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CakeOption {
    pub id: String,
    pub name: String,
    pub artwork: CakeArtwork,
    pub geometry: CakeGeometry,
}

fn built_in(id: &str, name: &str, base_y_percent: f32, base_width_percent: f32) -> CakeOption {
    CakeOption {
        id: id.to_string(),
        name: name.to_string(),
        artwork: CakeArtwork::BuiltIn(id.to_string()),
        geometry: CakeGeometry {
            base_y_percent,
            base_width_percent,
        },
    }
}

/// Bundled cakes, first one is the fallback
pub fn built_in_cakes() -> Vec<CakeOption> {
    vec![
        built_in("elegant-strawberry", "Strawberry Dream", 38.0, 55.0),
        built_in("classic-chocolate", "Midnight Cocoa", 52.0, 50.0),
        built_in("rainbow-party", "Rainbow Layer", 38.0, 45.0),
        built_in("blueberry-glaze", "Purple Velvet", 45.0, 40.0),
    ]
}

pub fn is_custom_id(id: &str) -> bool {
    id.starts_with(CUSTOM_CAKE_PREFIX)
}

/// Resolve a cake id against the catalogue and the session's uploads.
///
/// Unknown ids fall back to the first bundled cake, the same way an outdated
/// share link still renders something sensible.
pub fn resolve_cake(id: &str, custom_cakes: &BTreeMap<String, String>) -> CakeOption {
    if is_custom_id(id) {
        if let Some(data_url) = custom_cakes.get(id) {
            return CakeOption {
                id: id.to_string(),
                name: "Custom Cake".to_string(),
                artwork: CakeArtwork::Custom(data_url.clone()),
                geometry: CUSTOM_CAKE_GEOMETRY,
            };
        }
    }

    let mut cakes = built_in_cakes();
    match cakes.iter().position(|c| c.id == id) {
        Some(index) => cakes.swap_remove(index),
        None => cakes.swap_remove(0),
    }
}

/// Bundled cakes followed by uploads, in id order
pub fn list_cakes(custom_cakes: &BTreeMap<String, String>) -> Vec<CakeOption> {
    let mut cakes = built_in_cakes();
    cakes.extend(
        custom_cakes
            .keys()
            .map(|id| resolve_cake(id, custom_cakes)),
    );
    cakes
}

/// Decoded `data:image/...;base64,` URL
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// Parse and check an uploaded image data URL
pub fn decode_image_data_url(data_url: &str) -> Result<ImageData, CakeError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or(CakeError::NotDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(CakeError::NotDataUrl)?;

    let mut params = header.split(';');
    let media_type = params.next().unwrap_or_default().trim().to_ascii_lowercase();
    if !media_type.starts_with("image/") {
        return Err(CakeError::NotAnImage(media_type));
    }
    if !params.any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(CakeError::NotBase64);
    }

    // rough pre-check so a huge payload is refused before decoding
    if payload.len() / 4 * 3 > MAX_CUSTOM_IMAGE_BYTES + 3 {
        return Err(CakeError::TooLarge(payload.len() / 4 * 3));
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| CakeError::InvalidData(e.to_string()))?;
    if bytes.is_empty() {
        return Err(CakeError::InvalidData("empty image".to_string()));
    }
    if bytes.len() > MAX_CUSTOM_IMAGE_BYTES {
        return Err(CakeError::TooLarge(bytes.len()));
    }

    Ok(ImageData { media_type, bytes })
}

/// Id for a new upload
pub fn custom_cake_id(millis: u128) -> String {
    format!("{}{}", CUSTOM_CAKE_PREFIX, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent PNG
    const PNG_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

    #[test]
    fn catalogue_has_four_cakes_with_geometry() {
        let cakes = built_in_cakes();
        assert_eq!(cakes.len(), 4);
        assert_eq!(cakes[0].id, "elegant-strawberry");
        assert_eq!(cakes[1].geometry.base_y_percent, 52.0);
        assert_eq!(cakes[3].geometry.base_width_percent, 40.0);
    }

    #[test]
    fn resolve_known_built_in() {
        let cake = resolve_cake("rainbow-party", &BTreeMap::new());
        assert_eq!(cake.name, "Rainbow Layer");
        assert_eq!(cake.artwork, CakeArtwork::BuiltIn("rainbow-party".to_string()));
    }

    #[test]
    fn resolve_unknown_falls_back_to_first() {
        let cake = resolve_cake("lemon-drizzle", &BTreeMap::new());
        assert_eq!(cake.id, "elegant-strawberry");

        // a custom id with no upload behind it falls back too
        let cake = resolve_cake("custom-1", &BTreeMap::new());
        assert_eq!(cake.id, "elegant-strawberry");
    }

    #[test]
    fn resolve_custom_uses_custom_geometry() {
        let mut uploads = BTreeMap::new();
        uploads.insert("custom-42".to_string(), PNG_DATA_URL.to_string());

        let cake = resolve_cake("custom-42", &uploads);
        assert_eq!(cake.geometry, CUSTOM_CAKE_GEOMETRY);
        assert_eq!(cake.artwork, CakeArtwork::Custom(PNG_DATA_URL.to_string()));

        let all = list_cakes(&uploads);
        assert_eq!(all.len(), 5);
        assert_eq!(all[4].id, "custom-42");
    }

    #[test]
    fn decodes_png_data_url() {
        let image = decode_image_data_url(PNG_DATA_URL).unwrap();
        assert_eq!(image.media_type, "image/png");
        assert_eq!(&image.bytes[1..4], b"PNG");
    }

    #[test]
    fn rejects_non_image_data_urls() {
        assert_eq!(
            decode_image_data_url("https://example.com/cake.png"),
            Err(CakeError::NotDataUrl)
        );
        assert_eq!(
            decode_image_data_url("data:text/plain;base64,aGk="),
            Err(CakeError::NotAnImage("text/plain".to_string()))
        );
        assert_eq!(
            decode_image_data_url("data:image/svg+xml,<svg/>"),
            Err(CakeError::NotBase64)
        );
        assert!(matches!(
            decode_image_data_url("data:image/png;base64,@@@"),
            Err(CakeError::InvalidData(_))
        ));
        assert!(matches!(
            decode_image_data_url("data:image/png;base64,"),
            Err(CakeError::InvalidData(_))
        ));
    }

    #[test]
    fn custom_ids_are_prefixed() {
        let id = custom_cake_id(1_700_000_000_000);
        assert_eq!(id, "custom-1700000000000");
        assert!(is_custom_id(&id));
        assert!(!is_custom_id("classic-chocolate"));
    }
}
