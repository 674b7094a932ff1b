//! Data exchanged between builders and the validator.
use alloy_primitives::{keccak256, Address, Bytes, B256, I256, U256};
use alloy_rlp::{Encodable, Header};
use serde::{Deserialize, Serialize};

use crate::serde_helpers::{option_signed_quantity, quantity, u256_decimal};

/// Max gas a pay bid tx (plain value transfer) may declare.
pub const PAY_BID_TX_GAS_LIMIT: u64 = 25_000;

/// Block proposal as signed by the builder.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBid {
    #[serde(with = "quantity")]
    pub block_number: u64,
    pub parent_hash: B256,
    #[serde(default)]
    pub txs: Vec<Bytes>,
    #[serde(default)]
    pub un_revertible: Vec<B256>,
    #[serde(with = "quantity")]
    pub gas_used: u64,
    /// Total fee offered for the block. None when the builder omitted it.
    #[serde(default, with = "option_signed_quantity")]
    pub gas_fee: Option<I256>,
    /// Part of gas_fee paid directly to the validator.
    /// None means no separate builder fee, Some(0) means an explicit zero fee.
    #[serde(
        default,
        with = "option_signed_quantity",
        skip_serializing_if = "Option::is_none"
    )]
    pub builder_fee: Option<I256>,
}

impl RawBid {
    /// keccak256 of the RLP list [blockNumber, parentHash, txs, unRevertible, gasUsed, gasFee, builderFee].
    /// Missing fees are encoded as 0.
    /// Only meaningful for bids that passed admission (fees are encoded as unsigned).
    pub fn hash(&self) -> B256 {
        let gas_fee = self.gas_fee.map(I256::into_raw).unwrap_or(U256::ZERO);
        let builder_fee = self.builder_fee.map(I256::into_raw).unwrap_or(U256::ZERO);
        let payload_length = self.block_number.length()
            + self.parent_hash.length()
            + self.txs.length()
            + self.un_revertible.length()
            + self.gas_used.length()
            + gas_fee.length()
            + builder_fee.length();

        let mut out = Vec::with_capacity(payload_length + 8);
        Header {
            list: true,
            payload_length,
        }
        .encode(&mut out);
        self.block_number.encode(&mut out);
        self.parent_hash.encode(&mut out);
        self.txs.encode(&mut out);
        self.un_revertible.encode(&mut out);
        self.gas_used.encode(&mut out);
        gas_fee.encode(&mut out);
        builder_fee.encode(&mut out);
        keccak256(&out)
    }
}

/// Argument of mev_sendBid.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidArgs {
    /// None models a request without a bid payload (or an explicit null).
    #[serde(default, alias = "RawBid")]
    pub raw_bid: Option<RawBid>,
    /// Builder signature over [RawBid::hash].
    #[serde(default)]
    pub signature: Bytes,
    /// Settlement tx paying the builder fee. Empty means absent.
    #[serde(default)]
    pub pay_bid_tx: Bytes,
    #[serde(default, with = "quantity")]
    pub pay_bid_tx_gas_used: u64,
}

/// Canonical head as seen by the backend when the bid is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainHead {
    pub number: u64,
    pub hash: B256,
}

impl ChainHead {
    pub fn new(number: u64, hash: B256) -> Self {
        Self { number, hash }
    }
}

/// Bidding parameters published to builders. Not interpreted by the admission checks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MevParams {
    /// Basis points of the builder fee kept by the validator (100 = 1%).
    pub validator_commission: u64,
    /// Nanoseconds before block time at which bid simulation stops.
    pub bid_simulation_left_over: u64,
    /// Nanoseconds before block time after which the best bid is no longer interrupted.
    pub no_interrupt_left_over: u64,
    pub max_bids_per_builder: u32,
    pub gas_ceil: u64,
    /// Minimum average gas price of a bid block.
    #[serde(with = "u256_decimal")]
    pub gas_price: U256,
    #[serde(with = "u256_decimal")]
    pub builder_fee_ceil: U256,
    pub version: String,
}

/// Problem report sent by a validator about a bid it previously accepted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BidIssue {
    #[serde(default)]
    pub validator: Address,
    #[serde(default)]
    pub builder: Address,
    pub bid_hash: B256,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn bid_args_from_go_style_json() {
        let json = r#"{
            "rawBid": {
                "blockNumber": 101,
                "parentHash": "0x5b5e4b5e0a3b1b9b8f4b1b4c9f2cbd8f0e1f3c0a9a1b2c3d4e5f60718293a4b5",
                "txs": ["0x01"],
                "unRevertible": [],
                "gasUsed": 21000,
                "gasFee": 100,
                "builderFee": "0xa"
            },
            "signature": "0x",
            "payBidTx": "0x02",
            "payBidTxGasUsed": 5000
        }"#;
        let args: BidArgs = serde_json::from_str(json).unwrap();
        let raw_bid = args.raw_bid.unwrap();
        assert_eq!(raw_bid.block_number, 101);
        assert_eq!(raw_bid.gas_used, 21000);
        assert_eq!(raw_bid.gas_fee, Some(I256::try_from(100i64).unwrap()));
        assert_eq!(raw_bid.builder_fee, Some(I256::try_from(10i64).unwrap()));
        assert_eq!(args.pay_bid_tx, Bytes::from(vec![2u8]));
        assert_eq!(args.pay_bid_tx_gas_used, 5000);
    }

    #[test]
    fn absent_and_zero_builder_fee_are_distinct() {
        let absent: RawBid = serde_json::from_str(
            r#"{"blockNumber":"0x1","parentHash":"0x0000000000000000000000000000000000000000000000000000000000000000","gasUsed":"0x1","gasFee":"1"}"#,
        )
        .unwrap();
        let zero: RawBid = serde_json::from_str(
            r#"{"blockNumber":"0x1","parentHash":"0x0000000000000000000000000000000000000000000000000000000000000000","gasUsed":"0x1","gasFee":"1","builderFee":0}"#,
        )
        .unwrap();
        assert_eq!(absent.builder_fee, None);
        assert_eq!(zero.builder_fee, Some(I256::ZERO));
    }

    #[test]
    fn negative_fee_is_representable() {
        let raw_bid: RawBid = serde_json::from_str(
            r#"{"blockNumber":1,"parentHash":"0x0000000000000000000000000000000000000000000000000000000000000000","gasUsed":1,"gasFee":-5,"builderFee":"-0x1"}"#,
        )
        .unwrap();
        assert!(raw_bid.gas_fee.unwrap().is_negative());
        assert!(raw_bid.builder_fee.unwrap().is_negative());
    }

    #[test]
    fn go_builder_fee_above_u64_decodes() {
        let json = r#"{"blockNumber":1,"parentHash":"0x0000000000000000000000000000000000000000000000000000000000000000","gasUsed":1,"gasFee":20000000000000000000,"builderFee":10000000000000000000}"#;
        let raw_bid: RawBid = serde_json::from_str(json).unwrap();
        assert_eq!(
            raw_bid.gas_fee,
            Some(I256::from_dec_str("20000000000000000000").unwrap())
        );
        let encoded = serde_json::to_string(&raw_bid).unwrap();
        assert!(encoded.contains(r#""gasFee":20000000000000000000"#));
        assert!(encoded.contains(r#""builderFee":10000000000000000000"#));
    }

    #[test]
    fn missing_raw_bid_is_none() {
        let args: BidArgs = serde_json::from_str(r#"{"rawBid":null}"#).unwrap();
        assert!(args.raw_bid.is_none());
        assert!(args.pay_bid_tx.is_empty());
    }

    #[test]
    fn hash_depends_on_builder_fee_presence_only_through_value() {
        let parent_hash =
            b256!("0x5b5e4b5e0a3b1b9b8f4b1b4c9f2cbd8f0e1f3c0a9a1b2c3d4e5f60718293a4b5");
        let mut raw_bid = RawBid {
            block_number: 10,
            parent_hash,
            gas_used: 21000,
            gas_fee: Some(I256::try_from(100i64).unwrap()),
            ..Default::default()
        };
        let without_fee = raw_bid.hash();
        raw_bid.builder_fee = Some(I256::ZERO);
        assert_eq!(raw_bid.hash(), without_fee);
        raw_bid.builder_fee = Some(I256::try_from(1i64).unwrap());
        assert_ne!(raw_bid.hash(), without_fee);
    }

    #[test]
    fn mev_params_use_pascal_case() {
        let params = MevParams {
            validator_commission: 100,
            gas_price: U256::from(1_000_000_000u64),
            version: "v1".to_owned(),
            ..Default::default()
        };
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["ValidatorCommission"], 100);
        assert_eq!(value["GasPrice"], 1_000_000_000u64);
        let back: MevParams = serde_json::from_value(value).unwrap();
        assert_eq!(back, params);
    }
}
