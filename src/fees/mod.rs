//! Bidirectional fee engine
//!
//! Converts between "amount burned" on the source chain and "amount usable
//! by the action" on the destination chain, in both directions, and answers
//! feasibility questions. Pure arithmetic, no I/O.
//!
//! Rounding is asymmetric on purpose: the forward direction floors every
//! division, the reverse direction ceilings every division so a requested
//! target amount is always met, never undershot. The two are therefore not
//! exact inverses; `reverse-then-forward` may overshoot by a few base units.

pub mod oracle;

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::FeeError;

pub use oracle::TransitFeeOracle;

/// Basis-point denominator: 1 bp = 0.01%.
pub const BPS_DENOMINATOR: u64 = 10_000;

// ============================================================================
// Parameters
// ============================================================================

/// Fee model parameters, overridable per call.
///
/// The two rates are basis points; the two operator fees are flat amounts in
/// the asset's smallest unit (6 decimals), decided by the caller per
/// transfer rather than derived from the amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeParams {
    /// Transit fee deducted by the burn/mint messaging layer, in bps.
    pub transit_fee_bps: u32,
    /// Protocol revenue taken from the post-transit amount, in bps.
    pub protocol_fee_bps: u32,
    /// Flat fee paid to the indexer that triggers the mint.
    pub indexer_fee: U256,
    /// Flat fee paid to the relayer that executes the action.
    pub relayer_fee: U256,
}

impl Default for FeeParams {
    fn default() -> Self {
        Self {
            transit_fee_bps: 1,   // fast-transfer tier
            protocol_fee_bps: 10, // 0.10%
            indexer_fee: U256::ZERO,
            relayer_fee: U256::ZERO,
        }
    }
}

impl FeeParams {
    /// Reject out-of-range basis-point parameters up front.
    fn check(&self) -> Result<(), FeeError> {
        if self.transit_fee_bps > BPS_DENOMINATOR as u32 {
            return Err(FeeError::InvalidFeeParameters {
                name: "transit_fee_bps",
                value: self.transit_fee_bps,
            });
        }
        if self.protocol_fee_bps > BPS_DENOMINATOR as u32 {
            return Err(FeeError::InvalidFeeParameters {
                name: "protocol_fee_bps",
                value: self.protocol_fee_bps,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Results
// ============================================================================

/// Full fee breakdown for one transfer. All amounts in the asset's smallest
/// unit.
///
/// Invariants: `expected_amount = burn_amount - transit_fee` and
/// `amount_for_action = max(0, expected_amount - total_fees)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub burn_amount: U256,
    /// Network transit fee charged between burn and mint.
    pub transit_fee: U256,
    /// Amount the destination account holds after minting.
    pub expected_amount: U256,
    pub protocol_fee: U256,
    pub indexer_fee: U256,
    pub relayer_fee: U256,
    /// `protocol_fee + indexer_fee + relayer_fee`.
    pub total_fees: U256,
    /// What is left for the action itself.
    pub amount_for_action: U256,
}

/// Structured feasibility answer. Never panics; invalid parameters are the
/// only error path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feasibility {
    /// Whether `burn_amount` leaves at least `action_cost` for the action.
    pub feasible: bool,
    /// How much headroom remains beyond the action cost (zero if infeasible).
    pub surplus: U256,
    /// How much is missing (zero if feasible).
    pub shortfall: U256,
    /// The smallest burn that would have covered the action cost.
    pub minimum_burn: U256,
}

// ============================================================================
// Arithmetic helpers
// ============================================================================

/// `floor(amount * bps / 10000)`.
pub(crate) fn bps_fee(amount: U256, bps: u32) -> Result<U256, FeeError> {
    amount
        .checked_mul(U256::from(bps))
        .map(|scaled| scaled / U256::from(BPS_DENOMINATOR))
        .ok_or(FeeError::Overflow {
            context: "basis-point fee",
        })
}

/// `floor(expected_amount * protocol_fee_bps / 10000)`, validating the rate.
///
/// Shared with action validation, which recomputes the protocol fee when
/// checking that minted funds cover every party.
pub fn protocol_fee(expected_amount: U256, protocol_fee_bps: u32) -> Result<U256, FeeError> {
    if protocol_fee_bps > BPS_DENOMINATOR as u32 {
        return Err(FeeError::InvalidFeeParameters {
            name: "protocol_fee_bps",
            value: protocol_fee_bps,
        });
    }
    bps_fee(expected_amount, protocol_fee_bps)
}

/// `ceil(amount * 10000 / (10000 - bps))` — grossing an amount back up so
/// that deducting `bps` from the result still leaves `amount`.
fn gross_up(amount: U256, bps: u32, name: &'static str) -> Result<U256, FeeError> {
    if bps as u64 == BPS_DENOMINATOR {
        return Err(FeeError::RateConsumesAmount { name });
    }
    let numerator = amount
        .checked_mul(U256::from(BPS_DENOMINATOR))
        .ok_or(FeeError::Overflow { context: "gross-up" })?;
    let denominator = U256::from(BPS_DENOMINATOR - bps as u64);
    // Ceiling division: round up so the target is met, never undershot.
    let quotient = numerator / denominator;
    if (numerator % denominator).is_zero() {
        Ok(quotient)
    } else {
        Ok(quotient + U256::from(1u64))
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Forward direction: how much of `burn_amount` survives transit and fees.
///
/// Every division floors, so the reported `amount_for_action` is a
/// guaranteed lower bound on what the action will actually have.
pub fn compute_breakdown(burn_amount: U256, params: &FeeParams) -> Result<FeeBreakdown, FeeError> {
    params.check()?;

    let transit_fee = bps_fee(burn_amount, params.transit_fee_bps)?;
    let expected_amount = burn_amount - transit_fee;
    let protocol_fee = bps_fee(expected_amount, params.protocol_fee_bps)?;

    let total_fees = protocol_fee
        .checked_add(params.indexer_fee)
        .and_then(|sum| sum.checked_add(params.relayer_fee))
        .ok_or(FeeError::Overflow {
            context: "total fees",
        })?;

    let amount_for_action = expected_amount.saturating_sub(total_fees);

    Ok(FeeBreakdown {
        burn_amount,
        transit_fee,
        expected_amount,
        protocol_fee,
        indexer_fee: params.indexer_fee,
        relayer_fee: params.relayer_fee,
        total_fees,
        amount_for_action,
    })
}

/// Reverse direction: the burn required so the action ends up with at least
/// `target_amount_for_action`.
///
/// Both gross-up divisions ceiling, so feeding the resulting `burn_amount`
/// back through [`compute_breakdown`] never undershoots the target (it may
/// overshoot by rounding). Fails when either rate is 10000 bps, which would
/// divide by zero.
pub fn compute_burn_for_target(
    target_amount_for_action: U256,
    params: &FeeParams,
) -> Result<FeeBreakdown, FeeError> {
    params.check()?;

    let base_needed = target_amount_for_action
        .checked_add(params.indexer_fee)
        .and_then(|sum| sum.checked_add(params.relayer_fee))
        .ok_or(FeeError::Overflow {
            context: "base needed",
        })?;

    let expected_amount = gross_up(base_needed, params.protocol_fee_bps, "protocol_fee_bps")?;
    let burn_amount = gross_up(expected_amount, params.transit_fee_bps, "transit_fee_bps")?;

    // Recomputed for reporting; amount_for_action is pinned to the request.
    let transit_fee = burn_amount - expected_amount;
    let protocol_fee = bps_fee(expected_amount, params.protocol_fee_bps)?;
    let total_fees = protocol_fee + params.indexer_fee + params.relayer_fee;

    Ok(FeeBreakdown {
        burn_amount,
        transit_fee,
        expected_amount,
        protocol_fee,
        indexer_fee: params.indexer_fee,
        relayer_fee: params.relayer_fee,
        total_fees,
        amount_for_action: target_amount_for_action,
    })
}

/// Can `burn_amount` fund an action costing `action_cost`? Also reports the
/// minimum burn that would have worked, via the reverse calculation.
pub fn check_feasibility(
    burn_amount: U256,
    action_cost: U256,
    params: &FeeParams,
) -> Result<Feasibility, FeeError> {
    let forward = compute_breakdown(burn_amount, params)?;
    let reverse = compute_burn_for_target(action_cost, params)?;

    let feasible = forward.amount_for_action >= action_cost;
    Ok(Feasibility {
        feasible,
        surplus: forward.amount_for_action.saturating_sub(action_cost),
        shortfall: action_cost.saturating_sub(forward.amount_for_action),
        minimum_burn: reverse.burn_amount,
    })
}
