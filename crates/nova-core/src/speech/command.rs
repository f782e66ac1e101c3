use std::io::Write;
use std::process::{Child, Command, Stdio};

use super::{SpeechEngine, SpeechError, Utterance, Voice};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Backend {
    /// `espeak-ng` or `espeak`, named by program.
    Espeak(String),
    /// macOS `say`.
    Say,
}

impl Backend {
    fn program(&self) -> &str {
        match self {
            Backend::Espeak(program) => program,
            Backend::Say => "say",
        }
    }
}

/// Speaks through the platform's command-line synthesizer.
///
/// Each utterance is one child process; cancelling kills it.
pub struct CommandSpeech {
    backend: Option<Backend>,
    voices: Vec<Voice>,
    current: Option<Child>,
}

impl CommandSpeech {
    /// Probe for a synthesizer. Without one the engine reports unavailable.
    pub fn detect() -> Self {
        let backend = detect_backend();
        match &backend {
            Some(b) => log::info!("speech backend: {}", b.program()),
            None => log::info!("no speech synthesizer found, replies will not be spoken"),
        }
        let voices = backend.as_ref().map(list_voices).unwrap_or_default();
        Self {
            backend,
            voices,
            current: None,
        }
    }
}

impl SpeechEngine for CommandSpeech {
    fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn refresh_voices(&mut self) {
        if let Some(backend) = &self.backend {
            self.voices = list_voices(backend);
        }
    }

    fn cancel(&mut self) {
        if let Some(mut child) = self.current.take() {
            // Already-finished children just get reaped here.
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    fn speak(&mut self, utterance: Utterance) -> Result<(), SpeechError> {
        let Some(backend) = &self.backend else {
            return Ok(());
        };

        let (args, text) = match backend {
            Backend::Espeak(_) => {
                let mut args = vec!["--stdin".to_string(), "-p".to_string(), espeak_pitch(utterance.pitch).to_string()];
                if let Some(voice) = &utterance.voice {
                    args.push("-v".to_string());
                    args.push(voice.id.clone());
                }
                (args, utterance.text)
            }
            Backend::Say => {
                let mut args = vec!["-f".to_string(), "-".to_string()];
                if let Some(voice) = &utterance.voice {
                    args.push("-v".to_string());
                    args.push(voice.id.clone());
                }
                let text = format!("[[pbas {}]] {}", say_pitch(utterance.pitch), utterance.text);
                (args, text)
            }
        };

        let program = backend.program().to_string();
        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SpeechError::Spawn { program, source })?;

        feed_stdin(&mut child, text);
        self.current = Some(child);
        Ok(())
    }
}

impl Drop for CommandSpeech {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Write `text` to the child's stdin on its own thread, then close it.
///
/// espeak reads and speaks line by line, so a long reply can fill the pipe
/// and block the writer until playback catches up.
fn feed_stdin(child: &mut Child, text: String) {
    if let Some(mut stdin) = child.stdin.take() {
        std::thread::spawn(move || {
            // Fails with a broken pipe once the child is cancelled.
            if let Err(e) = stdin.write_all(text.as_bytes()) {
                log::debug!("speech input closed early: {}", e);
            }
        });
    }
}

fn detect_backend() -> Option<Backend> {
    for program in ["espeak-ng", "espeak"] {
        let found = Command::new(program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok();
        if found {
            return Some(Backend::Espeak(program.to_string()));
        }
    }

    if cfg!(target_os = "macos") {
        let found = Command::new("say")
            .args(["-v", "?"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok();
        if found {
            return Some(Backend::Say);
        }
    }

    None
}

fn list_voices(backend: &Backend) -> Vec<Voice> {
    let output = match backend {
        Backend::Espeak(program) => Command::new(program).arg("--voices").output(),
        Backend::Say => Command::new("say").args(["-v", "?"]).output(),
    };

    let output = match output {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            log::warn!("{} voice listing exited with {}", backend.program(), output.status);
            return Vec::new();
        }
        Err(e) => {
            log::warn!("could not list {} voices: {}", backend.program(), e);
            return Vec::new();
        }
    };

    let listing = String::from_utf8_lossy(&output.stdout);
    match backend {
        Backend::Espeak(_) => parse_espeak_voices(&listing),
        Backend::Say => parse_say_voices(&listing),
    }
}

/// Parse `espeak --voices`:
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  af              --/M      Afrikaans          gmw/af
/// ```
fn parse_espeak_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let _priority = cols.next()?;
            let lang = cols.next()?;
            let _age_gender = cols.next()?;
            let name = cols.next()?;
            Some(Voice {
                id: lang.to_string(),
                name: name.replace('_', " "),
                lang: lang.to_string(),
            })
        })
        .collect()
}

/// Parse `say -v ?`:
///
/// ```text
/// Alex                en_US    # Most people recognize me by my voice.
/// Bad News            en_US    # The light you see at the end of the tunnel...
/// ```
fn parse_say_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .filter_map(|line| {
            let head = line.split('#').next()?.trim_end();
            let (name, lang) = head.rsplit_once(char::is_whitespace)?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(Voice {
                id: name.to_string(),
                name: name.to_string(),
                lang: lang.to_string(),
            })
        })
        .collect()
}

/// espeak pitch is 0..=99 with 50 as normal.
fn espeak_pitch(pitch: f32) -> u8 {
    (pitch.clamp(0.0, 2.0) / 2.0 * 99.0).round() as u8
}

/// `say` base pitch via the `[[pbas]]` command, 50 as normal.
fn say_pitch(pitch: f32) -> u8 {
    (pitch.clamp(0.0, 2.0) * 50.0).round() as u8
}
