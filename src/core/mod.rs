pub mod cache;
pub mod chunking;
pub mod identity;
pub mod keys;
pub mod pipeline;
pub mod speech;

// Re-export commonly used types for convenience
pub use cache::{Cached, ResponseCache, get_or_generate};
pub use chunking::{TextChunks, chunk_text};
pub use identity::identify;
pub use keys::{FileKey, Folder, extract_key_from_url, synthesis_file_key};
pub use pipeline::{NarratedArtifact, NarrationTarget, Narrator};
pub use speech::{
    AudioFormat, AudioStatus, PollySpeechService, SpeechService, SynthesisEngine,
    SynthesisLimits, SynthesisOutcome, SynthesisRequest, check_audio,
};
