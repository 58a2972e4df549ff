//! Session configuration: the cake, candles and text a user has picked
//!
//! Field names serialize in camelCase so a session round-trips through the
//! same JSON the web version puts in its share links.

use crate::cake::{self, CakeOption};
use crate::layout::{self, CandleMode, CandlePlacement, CandleSpec, MAX_CANDLES, MIN_CANDLES};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Longest digit string a numeral-candle cake takes
pub const MAX_DIGITS: usize = 4;

/// UI language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Zh,
    #[default]
    En,
    Ja,
    Fr,
    Ar,
}

impl Language {
    /// Switcher order
    pub const ALL: [Language; 5] = [
        Language::En,
        Language::Zh,
        Language::Ja,
        Language::Fr,
        Language::Ar,
    ];

    pub fn is_rtl(self) -> bool {
        matches!(self, Language::Ar)
    }

    /// Name of the language in that language
    pub fn native_name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Zh => "中文",
            Language::Ja => "日本語",
            Language::Fr => "Français",
            Language::Ar => "العربية",
        }
    }
}

/// Everything a user configures, plus the live candle flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub lang: Language,
    pub selected_cake_id: String,
    pub config_completed: bool,
    pub candle_type: CandleMode,
    pub candle_count: u32,
    pub digits: String,
    pub is_extinguished: bool,
    pub is_blowing: bool,
    /// Uploaded cakes, id to image data URL
    pub custom_cakes: BTreeMap<String, String>,
    pub user_name: String,
    pub custom_message: String,
    pub giver_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::for_language(Language::default())
    }
}

impl SessionConfig {
    pub fn for_language(lang: Language) -> Self {
        Self {
            lang,
            selected_cake_id: "elegant-strawberry".to_string(),
            config_completed: false,
            candle_type: CandleMode::Classic,
            candle_count: 18,
            digits: "18".to_string(),
            is_extinguished: false,
            is_blowing: false,
            custom_cakes: BTreeMap::new(),
            user_name: String::new(),
            custom_message: String::new(),
            giver_name: String::new(),
        }
    }

    /// Clamp and filter the candle inputs into the layout engine's domain
    pub fn sanitized(mut self) -> Self {
        self.candle_count = self.candle_count.clamp(MIN_CANDLES, MAX_CANDLES);
        self.digits = sanitize_digits(&self.digits);
        self
    }

    /// Digit string to lay out; an empty one shows a single zero
    pub fn layout_digits(&self) -> &str {
        if self.digits.is_empty() {
            "0"
        } else {
            &self.digits
        }
    }

    pub fn selected_cake(&self) -> CakeOption {
        cake::resolve_cake(&self.selected_cake_id, &self.custom_cakes)
    }

    /// Candle placements for the current inputs
    pub fn candle_layout(&self) -> Vec<CandlePlacement> {
        let geometry = self.selected_cake().geometry;
        let spec = match self.candle_type {
            CandleMode::Classic => CandleSpec::Classic {
                count: self.candle_count.clamp(MIN_CANDLES, MAX_CANDLES),
            },
            CandleMode::Digits => CandleSpec::Digits {
                digits: self.layout_digits(),
            },
        };
        layout::layout_candles(spec, geometry)
    }

    /// Apply a partial update. Candle inputs are sanitized on the way in.
    pub fn apply(&mut self, update: SessionUpdate) {
        if let Some(lang) = update.lang {
            self.lang = lang;
        }
        if let Some(id) = update.selected_cake_id {
            self.selected_cake_id = id;
        }
        if let Some(completed) = update.config_completed {
            self.config_completed = completed;
        }
        if let Some(mode) = update.candle_type {
            self.candle_type = mode;
        }
        if let Some(count) = update.candle_count {
            self.candle_count = count.clamp(MIN_CANDLES, MAX_CANDLES);
        }
        if let Some(digits) = update.digits {
            self.digits = sanitize_digits(&digits);
        }
        if let Some(name) = update.user_name {
            self.user_name = name;
        }
        if let Some(message) = update.custom_message {
            self.custom_message = message;
        }
        if let Some(name) = update.giver_name {
            self.giver_name = name;
        }
    }

    /// Copy of this session as it should appear to someone opening a share
    /// link: configured, with the candles lit again
    pub fn for_sharing(&self) -> Self {
        Self {
            config_completed: true,
            is_extinguished: false,
            is_blowing: false,
            ..self.clone()
        }
    }
}

/// Partial session update coming from the UI controls
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionUpdate {
    pub lang: Option<Language>,
    pub selected_cake_id: Option<String>,
    pub config_completed: Option<bool>,
    pub candle_type: Option<CandleMode>,
    pub candle_count: Option<u32>,
    pub digits: Option<String>,
    pub user_name: Option<String>,
    pub custom_message: Option<String>,
    pub giver_name: Option<String>,
}

/// Keep ASCII numerals only, at most `MAX_DIGITS` of them
pub fn sanitize_digits(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(MAX_DIGITS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_session_matches_first_visit() {
        let session = SessionConfig::default();

        assert_eq!(session.lang, Language::En);
        assert_eq!(session.selected_cake_id, "elegant-strawberry");
        assert_eq!(session.candle_type, CandleMode::Classic);
        assert_eq!(session.candle_count, 18);
        assert_eq!(session.digits, "18");
        assert!(!session.config_completed);
        assert!(!session.is_extinguished);
        assert!(session.custom_cakes.is_empty());
    }

    #[test]
    fn sanitize_digits_filters_and_truncates() {
        assert_eq!(sanitize_digits("2a0-2 4 9"), "2024");
        assert_eq!(sanitize_digits("abc"), "");
        assert_eq!(sanitize_digits("١٢"), "");
    }

    #[test]
    fn sanitized_clamps_count() {
        let mut session = SessionConfig::default();
        session.candle_count = 0;
        assert_eq!(session.clone().sanitized().candle_count, 1);

        session.candle_count = 250;
        assert_eq!(session.sanitized().candle_count, 100);
    }

    #[test]
    fn apply_only_touches_given_fields() {
        let mut session = SessionConfig::default();
        session.apply(SessionUpdate {
            candle_type: Some(CandleMode::Digits),
            digits: Some("30th!".to_string()),
            user_name: Some("Robin".to_string()),
            ..Default::default()
        });

        assert_eq!(session.candle_type, CandleMode::Digits);
        assert_eq!(session.digits, "30");
        assert_eq!(session.user_name, "Robin");
        assert_eq!(session.candle_count, 18);
        assert_eq!(session.selected_cake_id, "elegant-strawberry");
    }

    #[test]
    fn apply_clamps_candle_count() {
        let mut session = SessionConfig::default();
        session.apply(SessionUpdate {
            candle_count: Some(1000),
            ..Default::default()
        });
        assert_eq!(session.candle_count, 100);
    }

    #[test]
    fn layout_uses_selected_cake_geometry() {
        let mut session = SessionConfig::default();
        session.selected_cake_id = "classic-chocolate".to_string();
        session.candle_type = CandleMode::Digits;
        session.digits = "23".to_string();

        let layout = session.candle_layout();
        assert_eq!(layout.len(), 2);
        assert!(layout.iter().all(|c| c.y_percent == 52.0));
    }

    #[test]
    fn empty_digits_show_a_zero() {
        let mut session = SessionConfig::default();
        session.candle_type = CandleMode::Digits;
        session.digits.clear();

        let layout = session.candle_layout();
        assert_eq!(layout.len(), 1);
        assert_eq!(layout[0].label.as_deref(), Some("0"));
    }

    #[test]
    fn classic_layout_follows_count() {
        let mut session = SessionConfig::default();
        session.candle_count = 42;
        assert_eq!(session.candle_layout().len(), 42);
    }

    #[test]
    fn sharing_relights_and_completes() {
        let mut session = SessionConfig::default();
        session.is_extinguished = true;
        session.is_blowing = true;
        session.user_name = "Sam".to_string();

        let shared = session.for_sharing();
        assert!(shared.config_completed);
        assert!(!shared.is_extinguished);
        assert!(!shared.is_blowing);
        assert_eq!(shared.user_name, "Sam");
    }

    #[test]
    fn deserializes_partial_json_with_defaults() {
        let session: SessionConfig =
            serde_json::from_str(r#"{"lang":"ar","candleType":"digits","digits":"7"}"#).unwrap();

        assert_eq!(session.lang, Language::Ar);
        assert!(session.lang.is_rtl());
        assert_eq!(session.candle_type, CandleMode::Digits);
        assert_eq!(session.candle_count, 18);
        assert_eq!(session.selected_cake_id, "elegant-strawberry");
    }

    #[test]
    fn serializes_camel_case_fields() {
        let json = serde_json::to_value(SessionConfig::default()).unwrap();
        assert_eq!(json["selectedCakeId"], "elegant-strawberry");
        assert_eq!(json["candleType"], "classic");
        assert_eq!(json["customCakes"], serde_json::json!({}));
    }

    #[test]
    fn language_names() {
        assert_eq!(Language::Fr.native_name(), "Français");
        assert!(!Language::Zh.is_rtl());
    }
}
