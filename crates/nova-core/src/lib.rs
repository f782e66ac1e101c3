pub mod ai;
pub mod config;
pub mod conversation;
pub mod ids;
pub mod preferences;
pub mod speech;
pub mod state;
pub mod store;
pub mod theme;

// Re-export main types for convenience
pub use ai::{GeminiClient, GenerateError, GenerationClient};
pub use config::Config;
pub use conversation::{Conversation, PendingTurn, SendError, SendOutcome};
pub use ids::{IdGenerator, UuidGenerator};
pub use preferences::{PreferenceStore, Preferences};
pub use speech::{CommandSpeech, SilentSpeech, SpeechEngine, SpeechError, Utterance, Voice};
pub use state::{Message, Role, Turn};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use theme::Theme;
