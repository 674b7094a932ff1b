//! Config should always be deserializable, default values should be used.
use alloy_primitives::{Address, B256, U256};
use eyre::Context;
use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr};
use std::{net::SocketAddr, path::Path};

use crate::{
    build_info::version_string,
    local_backend::LocalBackend,
    telemetry::LoggingConfig,
    types::{ChainHead, MevParams},
};

#[serde_as]
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MevConfig {
    /// Accept bids right after startup. Otherwise wait for miner_startMev.
    pub enabled: bool,
    /// Basis points, 100 = 1%.
    pub validator_commission: u64,
    pub bid_simulation_left_over_ms: u64,
    pub no_interrupt_left_over_ms: u64,
    /// 0 disables the limit.
    pub max_bids_per_builder: u32,
    /// Bids kept per parent block before answering busy.
    pub max_pending_bids: usize,
    pub gas_ceil: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub gas_price: U256,
    #[serde_as(as = "DisplayFromStr")]
    pub builder_fee_ceil: U256,
}

impl Default for MevConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            validator_commission: 100,
            bid_simulation_left_over_ms: 50,
            no_interrupt_left_over_ms: 400,
            max_bids_per_builder: 2,
            max_pending_bids: 1024,
            gas_ceil: 140_000_000,
            gas_price: U256::from(1_000_000_000u64),
            builder_fee_ceil: U256::ZERO,
        }
    }
}

impl MevConfig {
    pub fn mev_params(&self) -> MevParams {
        MevParams {
            validator_commission: self.validator_commission,
            bid_simulation_left_over: self.bid_simulation_left_over_ms.saturating_mul(1_000_000),
            no_interrupt_left_over: self.no_interrupt_left_over_ms.saturating_mul(1_000_000),
            max_bids_per_builder: self.max_bids_per_builder,
            gas_ceil: self.gas_ceil,
            gas_price: self.gas_price,
            builder_fee_ceil: self.builder_fee_ceil,
            version: version_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MevApiConfig {
    pub rpc_addr: String,
    /// No metrics server if None.
    pub metrics_addr: Option<SocketAddr>,
    /// Serve miner_* operator methods next to mev_*.
    pub enable_admin_api: bool,

    pub logging: LoggingConfig,
    pub mev: MevConfig,

    /// Builders allowed to submit bids.
    pub builders: Vec<Address>,

    /// Chain head the local backend starts from.
    pub head_number: u64,
    pub head_hash: B256,
    pub in_turn: bool,
}

impl Default for MevApiConfig {
    fn default() -> Self {
        Self {
            rpc_addr: "127.0.0.1:8545".to_string(),
            metrics_addr: None,
            enable_admin_api: true,
            logging: LoggingConfig::default(),
            mev: MevConfig::default(),
            builders: Vec::new(),
            head_number: 0,
            head_hash: B256::ZERO,
            in_turn: false,
        }
    }
}

impl MevApiConfig {
    pub fn create_local_backend(&self) -> LocalBackend {
        let backend = LocalBackend::new(
            self.mev.mev_params(),
            self.mev.max_pending_bids,
            ChainHead::new(self.head_number, self.head_hash),
            self.builders.iter().copied(),
        );
        if self.mev.enabled {
            backend.start_mev();
        }
        backend.set_in_turn(self.in_turn);
        backend
    }
}

pub fn load_config_toml(path: impl AsRef<Path>) -> eyre::Result<MevApiConfig> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Config file read error: {:?}", path))?;
    let config: MevApiConfig =
        toml::from_str(&data).wrap_err_with(|| format!("Config file parse error: {:?}", path))?;
    Ok(config)
}
