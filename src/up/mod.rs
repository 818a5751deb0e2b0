pub mod confirm;
pub mod prompt;

pub use confirm::{Confirmer, StdinConfirmer, UpError, UserPresenceProof};
pub use prompt::{challenge_prompt, UpPrompt};
