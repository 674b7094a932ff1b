//! Admission of builder bids.
//! Every bid goes through the same fixed sequence of checks and is rejected on the first one
//! that fails. Only admitted bids reach [MevBackend::send_bid].
use alloy_primitives::{B256, U256};
use std::sync::Arc;
use tracing::{debug, error};

use crate::{
    backend::MevBackend,
    error::{InvalidBidReason, InvalidPayBidTxReason, MevError},
    metrics::{inc_bid_issues, inc_bids_accepted, inc_bids_received, inc_bids_rejected},
    types::{BidArgs, BidIssue, ChainHead, MevParams, PAY_BID_TX_GAS_LIMIT},
};

/// Entry point used by builders (see [crate::rpc]).
/// Stateless: eligibility and chain head are read from the backend on every call.
#[derive(Clone)]
pub struct MevApi {
    backend: Arc<dyn MevBackend>,
}

impl std::fmt::Debug for MevApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MevApi").finish_non_exhaustive()
    }
}

impl MevApi {
    pub fn new(backend: Arc<dyn MevBackend>) -> Self {
        Self { backend }
    }

    /// Checks the bid and, if admitted, hands it to the backend returning the backend's bid hash.
    /// Backend errors are returned unchanged.
    pub fn send_bid(&self, args: BidArgs) -> Result<B256, MevError> {
        inc_bids_received();
        let block_number = args.raw_bid.as_ref().map(|raw_bid| raw_bid.block_number);
        let res = self.admit_and_forward(args);
        match &res {
            Ok(bid_hash) => {
                inc_bids_accepted();
                debug!(?block_number, %bid_hash, "Bid accepted");
            }
            Err(err) => {
                inc_bids_rejected(err.kind());
                debug!(?block_number, ?err, "Bid rejected");
            }
        }
        res
    }

    fn admit_and_forward(&self, args: BidArgs) -> Result<B256, MevError> {
        if !self.backend.mev_running() {
            return Err(MevError::NotRunning);
        }
        if !self.backend.miner_in_turn() {
            return Err(MevError::NotInTurn);
        }
        let current_header = self.backend.current_header();
        validate_bid(&args, &current_header)?;
        Ok(self.backend.send_bid(args)?)
    }

    pub fn best_bid_gas_fee(&self, parent_hash: B256) -> Option<U256> {
        self.backend.best_bid_gas_fee(parent_hash)
    }

    pub fn params(&self) -> MevParams {
        self.backend.mev_params()
    }

    pub fn running(&self) -> bool {
        self.backend.mev_running()
    }

    /// Issues are only recorded. No action is taken on the reported bid.
    pub fn report_issue(&self, issue: BidIssue) -> Result<(), MevError> {
        inc_bid_issues();
        error!(
            bid_hash = %issue.bid_hash,
            builder = %issue.builder,
            validator = %issue.validator,
            message = %issue.message,
            "Received issue"
        );
        Ok(())
    }
}

/// Structural and economic checks of a bid against the current head.
/// Check order is part of the contract: callers rely on the first failing check being reported.
pub fn validate_bid(args: &BidArgs, current_header: &ChainHead) -> Result<(), MevError> {
    let raw_bid = args
        .raw_bid
        .as_ref()
        .ok_or(InvalidBidReason::MissingRawBid)?;

    // only the next block can be bid on
    if current_header.number.checked_add(1) != Some(raw_bid.block_number) {
        return Err(InvalidBidReason::BlockNumber {
            expected: current_header.number.saturating_add(1),
            got: raw_bid.block_number,
        }
        .into());
    }

    if raw_bid.parent_hash != current_header.hash {
        return Err(InvalidBidReason::ParentHash {
            expected: current_header.hash,
        }
        .into());
    }

    let gas_fee = match raw_bid.gas_fee {
        Some(gas_fee) if !gas_fee.is_zero() && raw_bid.gas_used != 0 => gas_fee,
        _ => return Err(InvalidBidReason::EmptyGasFeeOrGasUsed.into()),
    };
    if gas_fee.is_negative() {
        return Err(InvalidBidReason::NegativeGasFee.into());
    }

    let has_pay_bid_tx = !args.pay_bid_tx.is_empty();
    let has_pay_bid_tx_gas_used = args.pay_bid_tx_gas_used != 0;

    let Some(builder_fee) = raw_bid.builder_fee else {
        if has_pay_bid_tx || has_pay_bid_tx_gas_used {
            return Err(InvalidPayBidTxReason::PresentWithoutBuilderFee.into());
        }
        return Ok(());
    };

    if builder_fee.is_negative() {
        return Err(InvalidBidReason::NegativeBuilderFee.into());
    }

    if builder_fee.is_zero() && (has_pay_bid_tx || has_pay_bid_tx_gas_used) {
        return Err(InvalidPayBidTxReason::PresentWithZeroBuilderFee.into());
    }

    if builder_fee >= gas_fee {
        return Err(InvalidBidReason::BuilderFeeNotLessThanGasFee.into());
    }

    // A positive fee may still come without payBidTx when builder and validator settle otherwise.
    if builder_fee.is_positive() {
        if args.pay_bid_tx_gas_used > PAY_BID_TX_GAS_LIMIT {
            return Err(InvalidBidReason::PayBidTxGasUsedTooHigh {
                gas_used: args.pay_bid_tx_gas_used,
            }
            .into());
        }
        if has_pay_bid_tx != has_pay_bid_tx_gas_used {
            return Err(InvalidPayBidTxReason::NonAligned.into());
        }
    }

    Ok(())
}
