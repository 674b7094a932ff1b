//! Node side collaborator of the mev API.
//! It owns all bidding state (best bids, eligibility, chain head); the admission checks only read it.
use alloy_primitives::{B256, U256};
use mockall::automock;

use crate::{
    error::BackendError,
    types::{BidArgs, ChainHead, MevParams},
};

#[automock]
pub trait MevBackend: Send + Sync {
    /// Whether the node currently takes bids at all.
    fn mev_running(&self) -> bool;
    /// Whether this node is the proposer of the next block.
    fn miner_in_turn(&self) -> bool;
    fn current_header(&self) -> ChainHead;
    /// Takes an already admitted bid and returns its hash.
    fn send_bid(&self, args: BidArgs) -> Result<B256, BackendError>;
    /// Best gas fee seen for bids building on parent_hash.
    fn best_bid_gas_fee(&self, parent_hash: B256) -> Option<U256>;
    fn mev_params(&self) -> MevParams;
}
