use crate::round::RoundId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, JackpotError>;

#[derive(Error, Debug)]
pub enum JackpotError {
    #[error("Invalid wager: {0} (amount must be positive and keep the pot within limits)")]
    InvalidWager(f64),

    #[error("Pot of {0} is too large to allocate tickets")]
    PotTooLarge(f64),

    #[error("Betting is closed for round {round_id}")]
    BettingClosed { round_id: RoundId },

    #[error("Round {round_id} has an empty pot, nothing to draw")]
    EmptyPotOnDraw { round_id: RoundId },

    #[error("Round {round_id}: no position owns winning ticket {ticket}")]
    AllocationInvariantViolation { round_id: RoundId, ticket: u64 },

    #[error("Invalid round state: {0}")]
    InvalidState(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl JackpotError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}
