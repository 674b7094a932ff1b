use alloy_primitives::{Address, B256};
use jsonrpsee::types::{ErrorObject, ErrorObjectOwned};

use crate::types::PAY_BID_TX_GAS_LIMIT;

pub const INVALID_BID_PARAM_ERROR_CODE: i32 = -38001;
pub const INVALID_PAY_BID_TX_ERROR_CODE: i32 = -38002;
pub const MEV_NOT_RUNNING_ERROR_CODE: i32 = -38003;
pub const MEV_BUSY_ERROR_CODE: i32 = -38004;
pub const MEV_NOT_IN_TURN_ERROR_CODE: i32 = -38005;
/// Code used for failures without a dedicated code.
pub const DEFAULT_ERROR_CODE: i32 = -32000;

/// Rejection of mev_sendBid.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MevError {
    #[error("the validator stop accepting bids for now, try again later")]
    NotRunning,
    #[error("the validator is not in-turn to propose currently, try again later")]
    NotInTurn,
    #[error("{0}")]
    InvalidBid(#[from] InvalidBidReason),
    #[error("invalid payBidTx: {0}")]
    InvalidPayBidTx(#[from] InvalidPayBidTxReason),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidBidReason {
    #[error("rawBid should not be nil")]
    MissingRawBid,
    #[error("stale block number or block in future")]
    BlockNumber { expected: u64, got: u64 },
    #[error("non-aligned parent hash: {expected}")]
    ParentHash { expected: B256 },
    #[error("empty gasFee or empty gasUsed")]
    EmptyGasFeeOrGasUsed,
    #[error("gas fee should not be less than 0")]
    NegativeGasFee,
    #[error("builder fee should not be less than 0")]
    NegativeBuilderFee,
    #[error("builder fee must be less than gas fee")]
    BuilderFeeNotLessThanGasFee,
    #[error("transfer tx gas used must be no more than {}", PAY_BID_TX_GAS_LIMIT)]
    PayBidTxGasUsedTooHigh { gas_used: u64 },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidPayBidTxReason {
    #[error("payBidTx should be nil when builder fee is 0")]
    PresentWithZeroBuilderFee,
    #[error("non-aligned payBidTx and payBidTxGasUsed")]
    NonAligned,
    #[error("payBidTx should be nil when builder fee is nil")]
    PresentWithoutBuilderFee,
}

/// Failures reported by a [crate::backend::MevBackend] when it takes a bid.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("the validator is working on too many bids, try again later")]
    Busy,
    #[error("bid already exists: {0}")]
    DuplicateBid(B256),
    #[error("too many bids: exceeded limit of {limit} bids per builder per block")]
    TooManyBids { limit: u32 },
    #[error("builder {0} is not registered")]
    UnknownBuilder(Address),
    #[error("invalid bid signature: {0}")]
    InvalidSignature(String),
    #[error("{0}")]
    Internal(String),
}

impl MevError {
    pub fn code(&self) -> i32 {
        match self {
            MevError::NotRunning => MEV_NOT_RUNNING_ERROR_CODE,
            MevError::NotInTurn => MEV_NOT_IN_TURN_ERROR_CODE,
            MevError::InvalidBid(_) => INVALID_BID_PARAM_ERROR_CODE,
            MevError::InvalidPayBidTx(_) => INVALID_PAY_BID_TX_ERROR_CODE,
            MevError::Backend(err) => err.code(),
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            MevError::NotRunning => "not_running",
            MevError::NotInTurn => "not_in_turn",
            MevError::InvalidBid(_) => "invalid_bid",
            MevError::InvalidPayBidTx(_) => "invalid_pay_bid_tx",
            MevError::Backend(_) => "backend",
        }
    }
}

impl BackendError {
    pub fn code(&self) -> i32 {
        match self {
            BackendError::Busy => MEV_BUSY_ERROR_CODE,
            BackendError::DuplicateBid(_)
            | BackendError::TooManyBids { .. }
            | BackendError::UnknownBuilder(_)
            | BackendError::InvalidSignature(_) => INVALID_BID_PARAM_ERROR_CODE,
            BackendError::Internal(_) => DEFAULT_ERROR_CODE,
        }
    }
}

impl From<MevError> for ErrorObjectOwned {
    fn from(err: MevError) -> Self {
        ErrorObject::owned(err.code(), err.to_string(), None::<()>)
    }
}

impl From<MevError> for jsonrpsee::core::Error {
    fn from(err: MevError) -> Self {
        jsonrpsee::core::Error::Call(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_and_codes() {
        let err = MevError::from(InvalidBidReason::BuilderFeeNotLessThanGasFee);
        assert_eq!(err.to_string(), "builder fee must be less than gas fee");
        assert_eq!(err.code(), INVALID_BID_PARAM_ERROR_CODE);

        let err = MevError::from(InvalidPayBidTxReason::NonAligned);
        assert_eq!(
            err.to_string(),
            "invalid payBidTx: non-aligned payBidTx and payBidTxGasUsed"
        );
        assert_eq!(err.code(), INVALID_PAY_BID_TX_ERROR_CODE);

        let err = MevError::from(InvalidBidReason::PayBidTxGasUsedTooHigh { gas_used: 30_000 });
        assert_eq!(
            err.to_string(),
            "transfer tx gas used must be no more than 25000"
        );

        assert_eq!(MevError::from(BackendError::Busy).code(), MEV_BUSY_ERROR_CODE);
        assert_eq!(
            MevError::from(BackendError::Internal("boom".to_owned())).code(),
            DEFAULT_ERROR_CODE
        );
    }

    #[test]
    fn rpc_error_object_keeps_code_and_message() {
        let obj: ErrorObjectOwned = MevError::NotInTurn.into();
        assert_eq!(obj.code(), MEV_NOT_IN_TURN_ERROR_CODE);
        assert_eq!(
            obj.message(),
            "the validator is not in-turn to propose currently, try again later"
        );
    }
}
