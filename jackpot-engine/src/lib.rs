//! Jackpot engine - one betting round at a time
//!
//! Players place wagers on the current round. Once enough distinct players
//! have joined, the round counts down, closes, converts every player's stake
//! into a contiguous range of tickets and draws one ticket uniformly at random.
//! The owner of that ticket takes the pot.

pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod player;
pub mod round;

pub use config::EngineConfig;
pub use error::{JackpotError, Result};
pub use events::{EventBus, RoundEvent};
pub use manager::{LifecycleHandle, RoundManager};
pub use player::{Player, PlayerId};
pub use round::{
    BetReceipt, DrawOutcome, PlayerPosition, Round, RoundId, RoundSnapshot, RoundState,
    RoundSummary, TicketAllocation, TicketRange, Wager, MAX_POT,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manager_creation() {
        let manager = RoundManager::new(EngineConfig::default()).unwrap();
        let round = manager.current_round();

        assert_eq!(round.state(), RoundState::Idle);
        assert_eq!(round.total_pot(), 0.0);
        assert!(manager.past_rounds().is_empty());
    }
}
