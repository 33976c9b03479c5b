//! Weighted ticket allocation.
//!
//! Wager totals are converted to integer cents and laid end to end, starting
//! at ticket 0, in the order the positions were opened. A draw samples a
//! ticket uniformly from the allocated range, so each player wins with
//! probability proportional to the cents they put in.

use crate::error::{JackpotError, Result};
use crate::player::PlayerId;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const TICKETS_PER_UNIT: u64 = 100;

/// Largest pot a round accepts, in currency units. Keeps every ticket count
/// well inside `u64` and every cent exactly representable in `f64`.
pub const MAX_POT: f64 = 1e12;

// Absorbs representation error such as 0.29 * 100 = 28.999999999999996.
const CENT_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketRange {
    pub player_id: PlayerId,
    /// First owned ticket.
    pub start: u64,
    /// Last owned ticket, inclusive. Equals `start` when `tickets == 0`.
    pub end: u64,
    pub tickets: u64,
    /// Percentage of the allocated tickets.
    pub share: f64,
}

impl TicketRange {
    pub fn contains(&self, ticket: u64) -> bool {
        self.tickets > 0 && self.start <= ticket && ticket <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketAllocation {
    /// `round(total_pot) * 100`.
    pub ticket_space: u64,
    /// Sum of all ranges; the draw samples `[0, allocated)`.
    pub allocated: u64,
    pub ranges: Vec<TicketRange>,
}

impl TicketAllocation {
    /// Nothing to draw from.
    pub fn is_empty(&self) -> bool {
        self.ticket_space == 0 || self.allocated == 0
    }

    pub fn owner_of(&self, ticket: u64) -> Option<&TicketRange> {
        self.ranges.iter().find(|range| range.contains(ticket))
    }

    pub fn range_of(&self, player_id: PlayerId) -> Option<&TicketRange> {
        self.ranges.iter().find(|range| range.player_id == player_id)
    }

    /// Uniform ticket in `[0, allocated)`, or `None` for an empty allocation.
    pub fn draw_ticket<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<u64> {
        if self.is_empty() {
            return None;
        }
        Some(rng.gen_range(0..self.allocated))
    }
}

/// Whole cents in `amount`, or `None` above `MAX_POT`.
pub fn to_tickets(amount: f64) -> Option<u64> {
    if amount.is_nan() || amount <= 0.0 {
        return Some(0);
    }
    if amount > MAX_POT {
        return None;
    }
    Some((amount * TICKETS_PER_UNIT as f64 + CENT_EPSILON).floor() as u64)
}

/// `round(total_pot) * 100`, or `None` above `MAX_POT`.
pub fn ticket_space(total_pot: f64) -> Option<u64> {
    if total_pot.is_nan() || total_pot <= 0.0 {
        return Some(0);
    }
    if total_pot > MAX_POT {
        return None;
    }
    (total_pot.round() as u64).checked_mul(TICKETS_PER_UNIT)
}

/// Allocate contiguous, gap-free ticket ranges. `totals` must be in position
/// insertion order; the result preserves it.
pub fn allocate(totals: &[(PlayerId, f64)]) -> Result<TicketAllocation> {
    let total_pot: f64 = totals.iter().map(|(_, amount)| amount).sum();
    let too_large = || JackpotError::PotTooLarge(total_pot);

    let space = ticket_space(total_pot).ok_or_else(too_large)?;
    let owned = totals
        .iter()
        .map(|(_, amount)| to_tickets(*amount))
        .collect::<Option<Vec<u64>>>()
        .ok_or_else(too_large)?;
    let allocated = owned
        .iter()
        .try_fold(0u64, |sum, &tickets| sum.checked_add(tickets))
        .ok_or_else(too_large)?;

    // Every partial sum is bounded by `allocated`, so the cursor cannot overflow.
    let mut cursor = 0u64;
    let ranges = totals
        .iter()
        .zip(owned)
        .map(|((player_id, _), tickets)| {
            let start = cursor;
            let end = if tickets == 0 { start } else { start + tickets - 1 };
            cursor += tickets;

            let share = if allocated == 0 {
                0.0
            } else {
                tickets as f64 / allocated as f64 * 100.0
            };

            TicketRange {
                player_id: *player_id,
                start,
                end,
                tickets,
                share,
            }
        })
        .collect();

    Ok(TicketAllocation {
        ticket_space: space,
        allocated,
        ranges,
    })
}
