//! Pairing token issuance.
//!
//! Tokens are drawn at random from [`TOKEN_CHARSET`] and checked against
//! the hub. A collision is retried a bounded number of times; if every
//! draw collides the allocation fails rather than looping forever.

use playlink_types::{Token, TOKEN_CHARSET};
use rand::seq::IndexedRandom;
use tracing::{debug, warn};

use crate::config::TokenConfig;
use crate::error::HubError;
use crate::hub::Hub;

/// Draws fresh, currently unused tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAllocator {
    length: usize,
    max_attempts: u32,
}

impl TokenAllocator {
    /// Allocator for `length`-character tokens, giving up after
    /// `max_attempts` collisions.
    pub const fn new(length: usize, max_attempts: u32) -> Self {
        Self {
            length,
            max_attempts,
        }
    }

    /// Allocator configured from the `tokens` section.
    pub const fn from_config(config: &TokenConfig) -> Self {
        Self::new(config.length, config.max_attempts)
    }

    /// Draw one candidate token.
    pub fn generate<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Token {
        let token: String = (0..self.length)
            .filter_map(|_| TOKEN_CHARSET.choose(rng))
            .map(|&b| char::from(b))
            .collect();
        Token::from(token)
    }

    /// Draw a token no player currently holds.
    pub async fn allocate(&self, hub: &Hub) -> Result<Token, HubError> {
        for attempt in 1..=self.max_attempts {
            let candidate = self.generate(&mut rand::rng());
            if !hub.player_exists(&candidate).await? {
                debug!(token = %candidate, attempt, "token allocated");
                return Ok(candidate);
            }
            debug!(token = %candidate, attempt, "token collision, retrying");
        }
        warn!(attempts = self.max_attempts, "failed to generate new random token");
        Err(HubError::TokensExhausted(self.max_attempts))
    }
}

impl Default for TokenAllocator {
    fn default() -> Self {
        Self::from_config(&TokenConfig::default())
    }
}
