//! User preferences and their durable store.
//!
//! Preferences are loaded once at startup and replaced wholesale on every
//! save. The on-disk JSON keeps the field names the web client used
//! (`apiKey`, `voiceURI`) so existing settings files load unchanged.

use serde::{Deserialize, Serialize};

use crate::store::{KeyValueStore, StoreError};
use crate::theme::Theme;

/// Key under which preferences are persisted.
pub const PREFERENCES_KEY: &str = "chatapp_settings";

pub const MIN_PITCH: f32 = 0.0;
pub const MAX_PITCH: f32 = 2.0;
pub const DEFAULT_PITCH: f32 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    #[serde(rename = "apiKey")]
    pub credential: String,
    pub theme: Theme,
    pub pitch: f32,
    #[serde(rename = "voiceURI", skip_serializing_if = "Option::is_none")]
    pub voice_selector: Option<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            credential: String::new(),
            theme: Theme::Midnight,
            pitch: DEFAULT_PITCH,
            voice_selector: None,
        }
    }
}

impl Preferences {
    /// Clamp pitch into range and normalise an empty voice selector to `None`.
    pub fn normalized(mut self) -> Self {
        self.pitch = clamp_pitch(self.pitch);
        if self.voice_selector.as_deref().is_some_and(|v| v.trim().is_empty()) {
            self.voice_selector = None;
        }
        self
    }

    /// Any non-empty key counts; the remote endpoint decides if it is valid.
    pub fn has_credential(&self) -> bool {
        !self.credential.is_empty()
    }
}

pub fn clamp_pitch(pitch: f32) -> f32 {
    if pitch.is_finite() {
        pitch.clamp(MIN_PITCH, MAX_PITCH)
    } else {
        DEFAULT_PITCH
    }
}

/// Parse stored preferences; anything unreadable counts as absent.
pub fn parse_preferences(raw: &str) -> Option<Preferences> {
    match serde_json::from_str::<Preferences>(raw) {
        Ok(prefs) => Some(prefs.normalized()),
        Err(e) => {
            log::warn!("ignoring unreadable preferences: {}", e);
            None
        }
    }
}

/// Single owner of the live preferences and their persistence.
pub struct PreferenceStore {
    store: Box<dyn KeyValueStore>,
    current: Preferences,
}

impl PreferenceStore {
    /// Load preferences from `store`, falling back to defaults.
    pub fn open(store: Box<dyn KeyValueStore>) -> Self {
        let current = load(store.as_ref());
        Self { store, current }
    }

    pub fn current(&self) -> &Preferences {
        &self.current
    }

    /// Replace the live preferences and persist them.
    ///
    /// The live value is replaced even if the write fails, so the shell
    /// keeps showing what the user chose for the rest of the session.
    pub fn save(&mut self, prefs: Preferences) -> Result<(), StoreError> {
        self.current = prefs.normalized();
        let json = serde_json::to_string_pretty(&self.current)?;
        self.store.set(PREFERENCES_KEY, &json)
    }
}

/// Read preferences from `store`, returning defaults when missing or unreadable.
pub fn load(store: &dyn KeyValueStore) -> Preferences {
    match store.get(PREFERENCES_KEY) {
        Ok(Some(raw)) => parse_preferences(&raw).unwrap_or_default(),
        Ok(None) => Preferences::default(),
        Err(e) => {
            log::warn!("could not read preferences, using defaults: {}", e);
            Preferences::default()
        }
    }
}
