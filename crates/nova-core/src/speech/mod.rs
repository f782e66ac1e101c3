//! Speech playback.
//!
//! The host's synthesizer sits behind [`SpeechEngine`]; [`speak`] holds the
//! playback policy: at most one utterance at a time, newest wins, unknown
//! voices fall back to the default.

mod command;

pub use command::CommandSpeech;

/// One voice offered by the host synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    /// Stable identifier stored in preferences.
    pub id: String,
    pub name: String,
    pub lang: String,
}

impl Voice {
    pub fn label(&self) -> String {
        if self.lang.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.lang)
        }
    }
}

/// A single request to speak.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// 0.0 to 2.0, 1.0 is the synthesizer's normal pitch.
    pub pitch: f32,
    /// `None` means the platform default voice.
    pub voice: Option<Voice>,
}

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

pub trait SpeechEngine: Send {
    fn is_available(&self) -> bool;
    fn voices(&self) -> Vec<Voice>;
    /// Re-read the host's voice list, for hosts whose voices change at runtime.
    fn refresh_voices(&mut self) {}
    /// Stop whatever is playing or queued.
    fn cancel(&mut self);
    fn speak(&mut self, utterance: Utterance) -> Result<(), SpeechError>;
}

/// The engine for hosts without speech. Every call is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSpeech;

impl SpeechEngine for SilentSpeech {
    fn is_available(&self) -> bool {
        false
    }

    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn cancel(&mut self) {}

    fn speak(&mut self, _utterance: Utterance) -> Result<(), SpeechError> {
        Ok(())
    }
}

/// Speak `text`, preempting anything already playing. Fire-and-forget.
pub fn speak(engine: &mut dyn SpeechEngine, text: &str, pitch: f32, voice_selector: Option<&str>) {
    if !engine.is_available() {
        return;
    }

    let voice = voice_selector.and_then(|id| engine.voices().into_iter().find(|v| v.id == id));
    if voice.is_none() {
        if let Some(id) = voice_selector {
            log::debug!("voice {} not available, using default", id);
        }
    }

    engine.cancel();
    let utterance = Utterance {
        text: text.to_string(),
        pitch,
        voice,
    };
    if let Err(e) = engine.speak(utterance) {
        log::warn!("speech playback failed: {}", e);
    }
}
