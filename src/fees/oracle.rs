//! Live transit-fee schedule lookup
//!
//! The messaging layer publishes its transit-fee schedule per domain pair.
//! This wrapper fetches the fast-transfer tier and falls back to the
//! caller's configured constant on any fetch error, timeout, or implausible
//! value — blocking a transfer on a fee-schedule lookup is worse than using
//! a conservative default.

use std::time::Duration;

use alloy::primitives::U256;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{FeeError, TransportError};
use crate::fees::{self, FeeBreakdown, FeeParams, BPS_DENOMINATOR};

/// Finality threshold identifying the fast-transfer fee tier.
const FAST_TRANSFER_THRESHOLD: u32 = 1000;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// One entry of the published fee schedule, per finality threshold level.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeeEntry {
    /// 1000 = fast transfer, 2000 = standard transfer.
    finality_threshold: u32,
    /// Minimum fee in basis points.
    minimum_fee: u32,
}

/// Fee-schedule client with fail-open semantics.
pub struct TransitFeeOracle {
    http: reqwest::Client,
    base_url: String,
}

impl TransitFeeOracle {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Fetch the fast-transfer fee rate for a domain pair.
    pub async fn transit_fee_bps(
        &self,
        source_domain: u32,
        destination_domain: u32,
    ) -> Result<u32, TransportError> {
        let endpoint = format!(
            "{}/v2/burn/USDC/fees/{}/{}",
            self.base_url, source_domain, destination_domain
        );
        let response = self.http.get(&endpoint).send().await?;

        if !response.status().is_success() {
            return Err(TransportError::Status {
                status: response.status().as_u16(),
                endpoint,
            });
        }

        let entries: Vec<FeeEntry> = response.json().await?;
        let fast = entries
            .iter()
            .find(|e| e.finality_threshold == FAST_TRANSFER_THRESHOLD)
            .ok_or(TransportError::MissingField("fast transfer fee entry"))?;

        debug!(
            source_domain,
            destination_domain,
            fee_bps = fast.minimum_fee,
            "Retrieved transit fee schedule"
        );
        Ok(fast.minimum_fee)
    }

    /// Forward breakdown using the live transit fee when reachable, the
    /// configured constant otherwise.
    pub async fn breakdown_with_live_fee(
        &self,
        burn_amount: U256,
        params: &FeeParams,
        source_domain: u32,
        destination_domain: u32,
    ) -> Result<FeeBreakdown, FeeError> {
        let transit_fee_bps = match self.transit_fee_bps(source_domain, destination_domain).await {
            Ok(bps) if bps as u64 <= BPS_DENOMINATOR => bps,
            Ok(bps) => {
                warn!(
                    fee_bps = bps,
                    fallback_bps = params.transit_fee_bps,
                    "Fee schedule returned an out-of-range rate, using configured fallback"
                );
                params.transit_fee_bps
            }
            Err(error) => {
                warn!(
                    %error,
                    fallback_bps = params.transit_fee_bps,
                    "Fee schedule lookup failed, using configured fallback"
                );
                params.transit_fee_bps
            }
        };

        let live = FeeParams {
            transit_fee_bps,
            ..params.clone()
        };
        fees::compute_breakdown(burn_amount, &live)
    }
}
