use nova_core::preferences::clamp_pitch;
use nova_core::{Conversation, GenerateError, PreferenceStore, Preferences, Theme, Voice};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::sync::mpsc;

use crate::tui::AppEvent;

/// Sidebar entries. Display only; they don't change how the chat behaves.
pub const CATEGORIES: [&str; 5] = ["General", "Coding", "Content", "Research", "Translate"];

/// Pitch change per Left/Right press in the settings form.
pub const PITCH_STEP: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Sidebar,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    ApiKey,
    Theme,
    Voice,
    Pitch,
}

impl SettingsField {
    pub fn next(self) -> Self {
        match self {
            SettingsField::ApiKey => SettingsField::Theme,
            SettingsField::Theme => SettingsField::Voice,
            SettingsField::Voice => SettingsField::Pitch,
            SettingsField::Pitch => SettingsField::ApiKey,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            SettingsField::ApiKey => SettingsField::Pitch,
            SettingsField::Theme => SettingsField::ApiKey,
            SettingsField::Voice => SettingsField::Theme,
            SettingsField::Pitch => SettingsField::Voice,
        }
    }
}

/// Where the credential used for requests comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Saved,
    Env,
    Missing,
}

/// Working copy of the preferences while the settings popup is open.
#[derive(Debug, Clone)]
pub struct SettingsForm {
    pub field: SettingsField,
    pub api_key: String,
    pub api_key_cursor: usize,
    pub theme: Theme,
    /// 0 is the default voice, `n` is `voices[n - 1]`.
    pub voice_idx: usize,
    /// The selector as loaded. Saved back unchanged unless the voice field
    /// is edited, so a voice missing from this session's list survives.
    pub saved_voice: Option<String>,
    pub voice_changed: bool,
    pub pitch: f32,
}

impl SettingsForm {
    pub fn from_preferences(prefs: &Preferences, voices: &[Voice]) -> Self {
        let voice_idx = prefs
            .voice_selector
            .as_deref()
            .and_then(|id| voices.iter().position(|v| v.id == id))
            .map(|i| i + 1)
            .unwrap_or(0);

        Self {
            field: SettingsField::ApiKey,
            api_key: prefs.credential.clone(),
            api_key_cursor: prefs.credential.chars().count(),
            theme: prefs.theme,
            voice_idx,
            saved_voice: prefs.voice_selector.clone(),
            voice_changed: false,
            pitch: prefs.pitch,
        }
    }

    pub fn to_preferences(&self, voices: &[Voice]) -> Preferences {
        let voice_selector = if self.voice_changed {
            match self.voice_idx {
                0 => None,
                n => voices.get(n - 1).map(|v| v.id.clone()),
            }
        } else {
            self.saved_voice.clone()
        };

        Preferences {
            credential: self.api_key.trim().to_string(),
            theme: self.theme,
            pitch: clamp_pitch(self.pitch),
            voice_selector,
        }
    }

    pub fn adjust_pitch(&mut self, delta: f32) {
        // Snap to the step grid so repeated presses don't drift
        let stepped = ((self.pitch + delta) / PITCH_STEP).round() * PITCH_STEP;
        self.pitch = clamp_pitch(stepped);
    }

    pub fn cycle_voice(&mut self, voice_count: usize, forward: bool) {
        let options = voice_count + 1;
        self.voice_changed = true;
        self.voice_idx = if forward {
            (self.voice_idx + 1) % options
        } else {
            (self.voice_idx + options - 1) % options
        };
    }
}

pub struct App {
    pub should_quit: bool,
    pub focus: FocusPane,

    // Input line
    pub input: String,
    pub input_cursor: usize, // cursor position in chars

    // Conversation
    pub conversation: Conversation,
    pub model_name: String,
    pub animation_frame: u8, // 0-2 for the typing indicator

    // Chat scrolling; `follow` pins the view to the newest line
    pub chat_scroll: u16,
    pub chat_max_scroll: u16,
    pub follow: bool,

    // Sidebar: CATEGORIES, then the Settings entry
    pub sidebar_state: ListState,

    // Preferences
    pub preferences: PreferenceStore,
    pub env_credential: Option<String>,

    // Settings popup
    pub show_settings: bool,
    pub settings: SettingsForm,
    pub voices: Vec<Voice>,

    // Blocking alert, dismissed by any key
    pub alert: Option<String>,
    // Transient footer message
    pub status: Option<String>,

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub sidebar_area: Option<Rect>,

    events: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        conversation: Conversation,
        preferences: PreferenceStore,
        env_credential: Option<String>,
        events: mpsc::UnboundedSender<AppEvent>,
        model_name: String,
    ) -> Self {
        let voices = conversation.voices();
        let settings = SettingsForm::from_preferences(preferences.current(), &voices);
        let mut sidebar_state = ListState::default();
        sidebar_state.select(Some(0));

        Self {
            should_quit: false,
            focus: FocusPane::Input,
            input: String::new(),
            input_cursor: 0,
            conversation,
            model_name,
            animation_frame: 0,
            chat_scroll: 0,
            chat_max_scroll: 0,
            follow: true,
            sidebar_state,
            preferences,
            env_credential,
            show_settings: false,
            settings,
            voices,
            alert: None,
            status: None,
            chat_area: None,
            sidebar_area: None,
            events,
        }
    }

    pub fn theme(&self) -> Theme {
        self.preferences.current().theme
    }

    /// The saved preferences, with the environment credential filled in
    /// when none has been saved.
    pub fn effective_preferences(&self) -> Preferences {
        let mut prefs = self.preferences.current().clone();
        if !prefs.has_credential() {
            if let Some(key) = &self.env_credential {
                prefs.credential = key.clone();
            }
        }
        prefs
    }

    pub fn credential_source(&self) -> CredentialSource {
        if self.preferences.current().has_credential() {
            CredentialSource::Saved
        } else if self.env_credential.is_some() {
            CredentialSource::Env
        } else {
            CredentialSource::Missing
        }
    }

    /// Send the input line. Blank input and sends while busy are ignored.
    pub fn submit(&mut self) {
        let prefs = self.effective_preferences();
        match self.conversation.begin_send(&self.input, &prefs) {
            Ok(Some(turn)) => {
                self.input.clear();
                self.input_cursor = 0;
                self.status = None;
                self.follow = true;

                let tx = self.events.clone();
                tokio::spawn(async move {
                    let result = turn.run().await;
                    // The loop may already be gone if the user quit mid-request
                    let _ = tx.send(AppEvent::Generated(result));
                });
            }
            Ok(None) => {}
            Err(e) => {
                self.alert = Some(e.to_string());
            }
        }
    }

    pub fn on_generated(&mut self, result: Result<String, GenerateError>) {
        let prefs = self.effective_preferences();
        self.conversation.finish_send(result, &prefs);
        self.follow = true;
    }

    /// Advance the typing indicator (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.conversation.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
        if self.chat_scroll >= self.chat_max_scroll {
            self.chat_scroll = self.chat_max_scroll;
            self.follow = true;
        }
    }

    // Input editing

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
        self.input.insert(byte_pos, c);
        self.input_cursor += 1;
    }

    pub fn delete_before_cursor(&mut self) {
        if self.input_cursor > 0 {
            self.input_cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete_at_cursor(&mut self) {
        if self.input_cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        self.input_cursor = (self.input_cursor + 1).min(self.input.chars().count());
    }

    // Sidebar

    /// Number of sidebar rows: the categories plus the Settings entry.
    pub fn sidebar_len(&self) -> usize {
        CATEGORIES.len() + 1
    }

    pub fn sidebar_down(&mut self) {
        let i = self.sidebar_state.selected().unwrap_or(0);
        self.sidebar_state.select(Some((i + 1).min(self.sidebar_len() - 1)));
    }

    pub fn sidebar_up(&mut self) {
        let i = self.sidebar_state.selected().unwrap_or(0);
        self.sidebar_state.select(Some(i.saturating_sub(1)));
    }

    pub fn sidebar_on_settings(&self) -> bool {
        self.sidebar_state.selected() == Some(CATEGORIES.len())
    }

    // Settings

    pub fn open_settings(&mut self) {
        self.conversation.refresh_voices();
        self.voices = self.conversation.voices();
        self.settings = SettingsForm::from_preferences(self.preferences.current(), &self.voices);
        self.show_settings = true;
    }

    pub fn close_settings(&mut self) {
        self.show_settings = false;
    }

    pub fn save_settings(&mut self) {
        let prefs = self.settings.to_preferences(&self.voices);
        self.status = Some(match self.preferences.save(prefs) {
            Ok(()) => "Settings saved".to_string(),
            Err(e) => {
                log::error!("failed to save preferences: {}", e);
                format!("Could not save settings: {}", e)
            }
        });
        self.show_settings = false;
    }

    pub fn settings_insert_char(&mut self, c: char) {
        let form = &mut self.settings;
        let byte_pos = char_to_byte_index(&form.api_key, form.api_key_cursor);
        form.api_key.insert(byte_pos, c);
        form.api_key_cursor += 1;
    }

    pub fn settings_backspace(&mut self) {
        let form = &mut self.settings;
        if form.api_key_cursor > 0 {
            form.api_key_cursor -= 1;
            let byte_pos = char_to_byte_index(&form.api_key, form.api_key_cursor);
            form.api_key.remove(byte_pos);
        }
    }

    /// Left/Right on the focused settings field.
    pub fn settings_adjust(&mut self, forward: bool) {
        let voice_count = self.voices.len();
        let form = &mut self.settings;
        match form.field {
            SettingsField::ApiKey => {
                if forward {
                    form.api_key_cursor = (form.api_key_cursor + 1).min(form.api_key.chars().count());
                } else {
                    form.api_key_cursor = form.api_key_cursor.saturating_sub(1);
                }
            }
            SettingsField::Theme => {
                form.theme = if forward { form.theme.next() } else { form.theme.prev() };
            }
            SettingsField::Voice => form.cycle_voice(voice_count, forward),
            SettingsField::Pitch => {
                form.adjust_pitch(if forward { PITCH_STEP } else { -PITCH_STEP });
            }
        }
    }

    /// Label for the voice currently chosen in the settings form.
    pub fn settings_voice_label(&self) -> String {
        let form = &self.settings;
        if !form.voice_changed && form.voice_idx == 0 {
            if let Some(id) = &form.saved_voice {
                return format!("{} (unavailable)", id);
            }
        }
        match form.voice_idx {
            0 => "Default".to_string(),
            n => self
                .voices
                .get(n - 1)
                .map(Voice::label)
                .unwrap_or_else(|| "Default".to_string()),
        }
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use nova_core::ids::SequentialIds;
    use nova_core::{GenerationClient, MemoryStore, SilentSpeech, Turn};
    use std::sync::Arc;

    pub struct EchoClient;

    #[async_trait]
    impl GenerationClient for EchoClient {
        async fn generate(&self, _credential: &str, history: &[Turn]) -> Result<String, GenerateError> {
            Ok(history.last().map(|t| t.text.clone()).unwrap_or_default())
        }
    }

    pub fn app_with(prefs: Preferences, env_credential: Option<&str>) -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let conversation = Conversation::new(
            Arc::new(EchoClient),
            Box::new(SilentSpeech),
            Box::new(SequentialIds::default()),
        );
        let mut preferences = PreferenceStore::open(Box::new(MemoryStore::new()));
        preferences.save(prefs).unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new(
            conversation,
            preferences,
            env_credential.map(str::to_string),
            tx,
            "test-model".to_string(),
        );
        (app, rx)
    }

    pub fn keyed() -> Preferences {
        Preferences {
            credential: "key".to_string(),
            ..Preferences::default()
        }
    }
}
