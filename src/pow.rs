//! Proof-of-work publish tokens.
//!
//! LRCLIB hands out a `{prefix, target}` challenge. A nonce solves it when
//! `sha256(prefix + nonce)` read as a big-endian number is at most `target`.
//! The token sent with a publish is `"{prefix}:{nonce}"`.
//!
//! A [`PublishToken`] also remembers which (duration, lyric) it was minted
//! for, so the engine can refuse to attach it to different content.

use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{SignerError, StoreError};

/// Upper bound on nonces tried per challenge. LRCLIB's targets are usually
/// solved within a few million attempts.
pub const DEFAULT_MAX_ATTEMPTS: u64 = 50_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Challenge {
    pub prefix: String,
    pub target: String,
}

/// Issues challenges. Implemented by the LRCLIB client.
pub trait ChallengeSource {
    fn request_challenge(&self) -> Result<Challenge, StoreError>;
}

// ============================================================================
// Token
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishToken {
    value: String,
    binding: [u8; 32],
}

impl PublishToken {
    pub fn new(value: impl Into<String>, duration_sec: u32, text: &str) -> Self {
        Self {
            value: value.into(),
            binding: content_binding(duration_sec, text),
        }
    }

    /// Header value, `prefix:nonce`.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_bound_to(&self, duration_sec: u32, text: &str) -> bool {
        self.binding == content_binding(duration_sec, text)
    }
}

fn content_binding(duration_sec: u32, text: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(duration_sec.to_be_bytes());
    hasher.update(text.as_bytes());
    hasher.finalize().into()
}

// ============================================================================
// Signer
// ============================================================================

pub trait ProofOfWorkSigner {
    /// Produce a token for publishing `text` against a track of `duration_sec`.
    fn sign(&self, duration_sec: u32, text: &str) -> Result<PublishToken, SignerError>;
}

impl<T: ProofOfWorkSigner + ?Sized> ProofOfWorkSigner for &T {
    fn sign(&self, duration_sec: u32, text: &str) -> Result<PublishToken, SignerError> {
        (**self).sign(duration_sec, text)
    }
}

/// Solves challenges fetched from a [`ChallengeSource`].
#[derive(Debug, Clone)]
pub struct ChallengeSigner<C> {
    source: C,
    max_attempts: u64,
}

impl<C: ChallengeSource> ChallengeSigner<C> {
    pub fn new(source: C) -> Self {
        Self {
            source,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

impl<C: ChallengeSource> ProofOfWorkSigner for ChallengeSigner<C> {
    fn sign(&self, duration_sec: u32, text: &str) -> Result<PublishToken, SignerError> {
        let challenge = self.source.request_challenge()?;
        let target =
            hex::decode(&challenge.target).map_err(|_| SignerError::BadTarget(challenge.target.clone()))?;
        if target.len() != 32 {
            return Err(SignerError::BadTarget(challenge.target));
        }

        let started = std::time::Instant::now();
        let nonce = solve(&challenge.prefix, &target, self.max_attempts)
            .ok_or(SignerError::Exhausted(self.max_attempts))?;
        tracing::debug!(nonce, elapsed_ms = started.elapsed().as_millis() as u64, "solved challenge");

        Ok(PublishToken::new(
            format!("{}:{}", challenge.prefix, nonce),
            duration_sec,
            text,
        ))
    }
}

/// Find the smallest nonce below `max_attempts` whose hash is within target.
pub fn solve(prefix: &str, target: &[u8], max_attempts: u64) -> Option<u64> {
    (0..max_attempts).find(|nonce| meets_target(prefix, *nonce, target))
}

pub fn meets_target(prefix: &str, nonce: u64, target: &[u8]) -> bool {
    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    hasher.finalize().as_slice() <= target
}
