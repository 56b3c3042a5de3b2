//! Typed MiniStream API calls
//!
//! Free functions grouped by area, each taking the shared `ApiClient`.
//! Destructive calls take a `Confirmation`, which can only be obtained from an
//! explicit affirmative answer.

pub mod auth;
pub mod creator;
pub mod discover;
pub mod media;
pub mod series;
pub mod types;
pub mod videos;

pub use media::MediaFile;
pub use types::*;

/// Proof that the user explicitly confirmed a destructive action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation(());

impl Confirmation {
    /// Accepts "y" or "yes" in any case, ignoring surrounding whitespace
    pub fn from_answer(answer: &str) -> Option<Self> {
        let answer = answer.trim();
        (answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
            .then_some(Confirmation(()))
    }

    /// For callers that collected consent by other means, such as a `--yes` flag
    pub fn assume_yes() -> Self {
        Confirmation(())
    }
}
