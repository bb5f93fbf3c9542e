//! Client configuration
//!
//! One explicit configuration value, resolved once at construction and
//! passed into the client — chain metadata is never looked up from a shared
//! mutable registry at runtime.

use std::env;
use std::fmt;
use std::path::Path;

use alloy::primitives::{Address, U256};
use eyre::{eyre, Result, WrapErr};
use url::Url;

use crate::fees::FeeParams;

/// Source-chain endpoint and contract addresses.
#[derive(Clone)]
pub struct SourceChainConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    /// Messaging-layer domain (distinct from the chain id).
    pub domain: u32,
    pub token_messenger: Address,
    pub burn_token: Address,
    pub private_key: String,
}

/// Custom Debug that redacts private_key to prevent accidental log leakage.
impl fmt::Debug for SourceChainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceChainConfig")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("domain", &self.domain)
            .field("token_messenger", &self.token_messenger)
            .field("burn_token", &self.burn_token)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Destination-chain endpoint.
#[derive(Debug, Clone)]
pub struct DestinationChainConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    pub domain: u32,
}

/// Polling cadence.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub attestation_interval_ms: u64,
    pub flow_interval_ms: u64,
    pub announced_delay_ms: u64,
}

/// Complete client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub source: SourceChainConfig,
    pub destination: DestinationChainConfig,
    pub gateway_url: String,
    pub attestation_url: String,
    pub poll: PollConfig,
    pub fees: FeeParams,
}

fn default_poll_interval() -> u64 {
    2000
}

fn default_announced_delay() -> u64 {
    5000
}

fn require(name: &'static str) -> Result<String> {
    env::var(name).map_err(|_| eyre!("{} environment variable is required", name))
}

fn parse_address(name: &'static str) -> Result<Address> {
    require(name)?
        .parse()
        .wrap_err_with(|| format!("{name} must be a valid EVM address"))
}

fn optional_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl ClientConfig {
    /// Load configuration from environment variables, reading `.env` first
    /// when present.
    pub fn load() -> Result<Self> {
        Self::load_from_file(".env")
    }

    /// Load from a specific .env file path, falling through to the process
    /// environment.
    pub fn load_from_file(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            dotenvy::from_filename(path)
                .wrap_err_with(|| format!("Failed to load .env file from {}", path))?;
        }
        Self::load_from_env()
    }

    fn load_from_env() -> Result<Self> {
        let source = SourceChainConfig {
            rpc_url: require("SOURCE_RPC_URL")?,
            chain_id: require("SOURCE_CHAIN_ID")?
                .parse()
                .wrap_err("SOURCE_CHAIN_ID must be a valid u64")?,
            domain: require("SOURCE_DOMAIN")?
                .parse()
                .wrap_err("SOURCE_DOMAIN must be a valid u32")?,
            token_messenger: parse_address("TOKEN_MESSENGER_ADDRESS")?,
            burn_token: parse_address("BURN_TOKEN_ADDRESS")?,
            private_key: require("PRIVATE_KEY")?,
        };

        let destination = DestinationChainConfig {
            rpc_url: require("DEST_RPC_URL")?,
            chain_id: require("DEST_CHAIN_ID")?
                .parse()
                .wrap_err("DEST_CHAIN_ID must be a valid u64")?,
            domain: require("DEST_DOMAIN")?
                .parse()
                .wrap_err("DEST_DOMAIN must be a valid u32")?,
        };

        let poll = PollConfig {
            attestation_interval_ms: optional_parsed(
                "ATTESTATION_INTERVAL_MS",
                default_poll_interval(),
            ),
            flow_interval_ms: optional_parsed("FLOW_INTERVAL_MS", default_poll_interval()),
            announced_delay_ms: optional_parsed("ANNOUNCED_DELAY_MS", default_announced_delay()),
        };

        let default_fees = FeeParams::default();
        let fees = FeeParams {
            transit_fee_bps: optional_parsed("TRANSIT_FEE_BPS", default_fees.transit_fee_bps),
            protocol_fee_bps: optional_parsed("PROTOCOL_FEE_BPS", default_fees.protocol_fee_bps),
            indexer_fee: U256::from(optional_parsed("INDEXER_FEE", 0u64)),
            relayer_fee: U256::from(optional_parsed("RELAYER_FEE", 0u64)),
        };

        let config = ClientConfig {
            source,
            destination,
            gateway_url: require("GATEWAY_URL")?,
            attestation_url: require("ATTESTATION_URL")?,
            poll,
            fees,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("SOURCE_RPC_URL", &self.source.rpc_url),
            ("DEST_RPC_URL", &self.destination.rpc_url),
            ("GATEWAY_URL", &self.gateway_url),
            ("ATTESTATION_URL", &self.attestation_url),
        ] {
            Url::parse(value).wrap_err_with(|| format!("{name} is not a valid URL: {value}"))?;
        }

        if self.source.chain_id == 0 || self.destination.chain_id == 0 {
            return Err(eyre!("chain ids must be non-zero"));
        }
        if self.source.chain_id == self.destination.chain_id {
            return Err(eyre!(
                "source and destination chain ids are both {}; a transfer needs two chains",
                self.source.chain_id
            ));
        }
        if self.source.domain == self.destination.domain {
            return Err(eyre!(
                "source and destination domains are both {}; a transfer needs two domains",
                self.source.domain
            ));
        }

        if self.source.private_key.trim_start_matches("0x").len() != 64 {
            return Err(eyre!("PRIVATE_KEY must be 32 bytes of hex"));
        }

        if self.source.token_messenger == Address::ZERO {
            return Err(eyre!("TOKEN_MESSENGER_ADDRESS cannot be the zero address"));
        }
        if self.source.burn_token == Address::ZERO {
            return Err(eyre!("BURN_TOKEN_ADDRESS cannot be the zero address"));
        }

        if self.fees.transit_fee_bps > 10_000 || self.fees.protocol_fee_bps > 10_000 {
            return Err(eyre!("fee basis points cannot exceed 10000"));
        }

        if self.poll.attestation_interval_ms == 0 || self.poll.flow_interval_ms == 0 {
            return Err(eyre!("poll intervals must be non-zero"));
        }

        Ok(())
    }
}
