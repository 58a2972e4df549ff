//! Birthday Cake Library
//!
//! Desktop birthday cake: pick a cake, candles and a message, then blow the
//! candles out through the microphone. The webview draws everything; this
//! crate owns the candle layout, the microphone, and blow detection.

pub mod audio;
pub mod blow;
pub mod cake;
pub mod celebrate;
pub mod content_filter;
pub mod detection;
pub mod i18n;
pub mod layout;
pub mod monitor;
pub mod session;
pub mod share;
pub mod state;

use audio::AudioSource;
use blow::BlowDetectionConfig;
use cake::CakeOption;
use celebrate::ConfettiParticle;
use detection::{CpalMicrophone, StatusSink};
use i18n::{Greeting, LanguageOption, Translation};
use layout::CandlePlacement;
use session::{Language, SessionConfig, SessionUpdate};
use state::{AppState, BlowStatus};

use parking_lot::Mutex;
use std::sync::Arc;
use tauri::{AppHandle, Emitter, State};

/// Application state wrapper
pub struct AppStateWrapper(pub Arc<Mutex<AppState>>);

/// Emitted with a `BlowStatus` whenever the candles change state
pub const BLOW_STATE_EVENT: &str = "blow-state";

/// Emitted once per lit session when the candles go out
pub const EXTINGUISHED_EVENT: &str = "candles-extinguished";

impl StatusSink for AppHandle {
    fn blow_state(&self, status: BlowStatus) {
        if let Err(e) = self.emit(BLOW_STATE_EVENT, status) {
            log::warn!("Failed to emit {}: {}", BLOW_STATE_EVENT, e);
        }
    }

    fn extinguished(&self, status: BlowStatus) {
        if let Err(e) = self.emit(EXTINGUISHED_EVENT, status) {
            log::warn!("Failed to emit {}: {}", EXTINGUISHED_EVENT, e);
        }
    }
}

/// Session from a share link passed on the command line, if any
fn launch_session() -> Option<SessionConfig> {
    let marker = format!("{}=", share::CONFIG_PARAM);
    let link = std::env::args().skip(1).find(|arg| arg.contains(&marker))?;
    match share::session_from_link(&link) {
        Ok(session) => {
            log::info!("Opened shared cake from launch link");
            Some(session)
        }
        Err(e) => {
            log::warn!("Ignoring launch link: {}", e);
            None
        }
    }
}

/// List available microphones
#[tauri::command]
async fn list_microphones() -> Result<Vec<AudioSource>, String> {
    audio::list_sources().map_err(|e| e.to_string())
}

/// Built-in cakes followed by the session's uploads
#[tauri::command]
fn list_cakes(state: State<'_, AppStateWrapper>) -> Vec<CakeOption> {
    let app_state = state.0.lock();
    cake::list_cakes(&app_state.session.custom_cakes)
}

#[tauri::command]
fn get_session(state: State<'_, AppStateWrapper>) -> SessionConfig {
    state.0.lock().session.clone()
}

/// Apply a partial update from the controls
#[tauri::command]
async fn update_session(
    state: State<'_, AppStateWrapper>,
    update: SessionUpdate,
) -> Result<SessionConfig, String> {
    let (session, stop) = {
        let mut app_state = state.0.lock();
        app_state.session.apply(update);
        let stop = !app_state.session.config_completed && app_state.is_monitoring();
        (app_state.session.clone(), stop)
    };

    // Back to configuring: the microphone is not needed any more
    if stop {
        detection::stop(&state.0).await;
    }
    Ok(session)
}

/// Start over with a fresh session in `lang`
#[tauri::command]
async fn reset_session(
    state: State<'_, AppStateWrapper>,
    lang: Language,
) -> Result<SessionConfig, String> {
    detection::stop(&state.0).await;
    let mut app_state = state.0.lock();
    app_state.session = SessionConfig::for_language(lang);
    Ok(app_state.session.clone())
}

/// Store an uploaded cake image and select it
#[tauri::command]
fn add_custom_cake(
    state: State<'_, AppStateWrapper>,
    data_url: String,
) -> Result<CakeOption, String> {
    let image = cake::decode_image_data_url(&data_url).map_err(|e| e.to_string())?;
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let id = cake::custom_cake_id(millis);
    log::info!("Custom cake {} ({}, {} bytes)", id, image.media_type, image.bytes.len());

    let mut app_state = state.0.lock();
    app_state.session.custom_cakes.insert(id.clone(), data_url);
    app_state.session.selected_cake_id = id;
    Ok(app_state.session.selected_cake())
}

/// Candle placements for the current session
#[tauri::command]
fn candle_layout(state: State<'_, AppStateWrapper>) -> Vec<CandlePlacement> {
    state.0.lock().session.candle_layout()
}

/// Finish configuring and light the candles
#[tauri::command]
async fn complete_config(
    app: AppHandle,
    state: State<'_, AppStateWrapper>,
    source_id: Option<String>,
) -> Result<BlowStatus, String> {
    state.0.lock().session.config_completed = true;
    detection::start(&CpalMicrophone, &app, &state.0, source_id)
        .await
        .map_err(|e| e.to_string())?;
    Ok(state.0.lock().blow_status())
}

/// Start listening for blows; `false` means no microphone
#[tauri::command]
async fn start_blow_detection(
    app: AppHandle,
    state: State<'_, AppStateWrapper>,
    source_id: Option<String>,
) -> Result<bool, String> {
    detection::start(&CpalMicrophone, &app, &state.0, source_id)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
async fn stop_blow_detection(state: State<'_, AppStateWrapper>) -> Result<(), String> {
    detection::stop(&state.0).await;
    Ok(())
}

/// Put the candles out by hand
#[tauri::command]
async fn extinguish_candles(
    app: AppHandle,
    state: State<'_, AppStateWrapper>,
) -> Result<BlowStatus, String> {
    Ok(detection::extinguish(&app, &state.0).await)
}

/// Light the candles again with a fresh microphone session
#[tauri::command]
async fn relight_candles(
    app: AppHandle,
    state: State<'_, AppStateWrapper>,
    source_id: Option<String>,
) -> Result<BlowStatus, String> {
    detection::relight(&CpalMicrophone, &app, &state.0, source_id)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
fn get_blow_status(state: State<'_, AppStateWrapper>) -> BlowStatus {
    state.0.lock().blow_status()
}

#[tauri::command]
fn get_blow_config(state: State<'_, AppStateWrapper>) -> BlowDetectionConfig {
    state.0.lock().blow_config.clone()
}

/// Replace the detector tuning; takes effect the next time candles are lit
#[tauri::command]
fn set_blow_config(
    state: State<'_, AppStateWrapper>,
    config: BlowDetectionConfig,
) -> Result<(), String> {
    config.validate().map_err(|e| e.to_string())?;
    log::info!("Blow config updated: {:?}", config);
    state.0.lock().blow_config = config;
    Ok(())
}

/// Link that reopens this cake, candles lit, on another machine
#[tauri::command]
fn generate_share_link(
    state: State<'_, AppStateWrapper>,
    base_url: String,
) -> Result<String, String> {
    let session = state.0.lock().session.clone();
    share::share_link(&base_url, &session).map_err(|e| e.to_string())
}

/// Open a shared cake: replaces the session and lights the candles
#[tauri::command]
async fn load_share_link(
    app: AppHandle,
    state: State<'_, AppStateWrapper>,
    link: String,
    source_id: Option<String>,
) -> Result<SessionConfig, String> {
    let session = share::session_from_link(&link).map_err(|e| e.to_string())?;

    detection::stop(&state.0).await;
    state.0.lock().session = session;
    detection::start(&CpalMicrophone, &app, &state.0, source_id)
        .await
        .map_err(|e| e.to_string())?;

    Ok(state.0.lock().session.clone())
}

/// Languages for the switcher
#[tauri::command]
fn list_languages() -> Vec<LanguageOption> {
    i18n::languages()
}

#[tauri::command]
fn get_translation(lang: Language) -> Translation {
    i18n::translation(lang)
}

/// Header text for the current session and candle state
#[tauri::command]
fn get_greeting(state: State<'_, AppStateWrapper>) -> Greeting {
    i18n::greeting(&state.0.lock().session)
}

/// Confetti for a `width` x `height` canvas, only once the candles are out
#[tauri::command]
fn celebration_burst(
    state: State<'_, AppStateWrapper>,
    width: f32,
    height: f32,
) -> Vec<ConfettiParticle> {
    if !state.0.lock().session.is_extinguished {
        return Vec::new();
    }
    celebrate::burst(&mut rand::rng(), width, height)
}

/// Initialize the Tauri application
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    env_logger::init();

    let mut app_state = AppState::default();
    if let Some(session) = launch_session() {
        app_state.session = session;
    }

    tauri::Builder::default()
        .manage(AppStateWrapper(Arc::new(Mutex::new(app_state))))
        .invoke_handler(tauri::generate_handler![
            list_microphones,
            list_cakes,
            get_session,
            update_session,
            reset_session,
            add_custom_cake,
            candle_layout,
            complete_config,
            start_blow_detection,
            stop_blow_detection,
            extinguish_candles,
            relight_candles,
            get_blow_status,
            get_blow_config,
            set_blow_config,
            generate_share_link,
            load_share_link,
            list_languages,
            get_translation,
            get_greeting,
            celebration_burst,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
