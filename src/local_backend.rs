//! In-process [MevBackend] keeping the bid book in memory.
//! Used by the standalone server and as a realistic backend in tests.
use ahash::{HashMap, HashSet};
use alloy_primitives::{Address, Signature, B256, I256, U256};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, trace};

use crate::{
    backend::MevBackend,
    error::BackendError,
    types::{BidArgs, ChainHead, MevParams},
};

/// Bids received for a single parent hash.
#[derive(Debug, Default)]
struct BidBook {
    best_gas_fee: U256,
    bids: HashSet<B256>,
    bids_per_builder: HashMap<Address, u32>,
}

#[derive(Debug)]
pub struct LocalBackend {
    running: AtomicBool,
    in_turn: AtomicBool,
    head: RwLock<ChainHead>,
    builders: RwLock<HashSet<Address>>,
    books: Mutex<HashMap<B256, BidBook>>,
    params: MevParams,
    /// Max bids kept per parent hash, above it we answer Busy.
    max_pending_bids: usize,
}

impl LocalBackend {
    pub fn new(
        params: MevParams,
        max_pending_bids: usize,
        head: ChainHead,
        builders: impl IntoIterator<Item = Address>,
    ) -> Self {
        Self {
            running: AtomicBool::new(false),
            in_turn: AtomicBool::new(false),
            head: RwLock::new(head),
            builders: RwLock::new(builders.into_iter().collect()),
            books: Default::default(),
            params,
            max_pending_bids,
        }
    }

    pub fn start_mev(&self) {
        self.running.store(true, Ordering::SeqCst);
        info!("Mev started");
    }

    pub fn stop_mev(&self) {
        self.running.store(false, Ordering::SeqCst);
        info!("Mev stopped");
    }

    pub fn set_in_turn(&self, in_turn: bool) {
        self.in_turn.store(in_turn, Ordering::SeqCst);
    }

    /// Moves the head. Bid books of any other parent are dropped.
    pub fn update_head(&self, head: ChainHead) {
        *self.head.write() = head;
        self.books
            .lock()
            .retain(|parent_hash, _| *parent_hash == head.hash);
        trace!(number = head.number, hash = %head.hash, "Head updated");
    }

    /// Returns true if the builder was not registered yet.
    pub fn add_builder(&self, builder: Address) -> bool {
        self.builders.write().insert(builder)
    }

    /// Returns true if the builder was registered.
    pub fn remove_builder(&self, builder: &Address) -> bool {
        self.builders.write().remove(builder)
    }

    pub fn has_builder(&self, builder: &Address) -> bool {
        self.builders.read().contains(builder)
    }
}

/// Signer of bid_hash. Accepts v as 0/1 or 27/28.
fn recover_builder(bid_hash: &B256, signature: &[u8]) -> Result<Address, BackendError> {
    let signature = Signature::from_raw(signature)
        .map_err(|err| BackendError::InvalidSignature(err.to_string()))?;
    signature
        .recover_address_from_prehash(bid_hash)
        .map_err(|err| BackendError::InvalidSignature(err.to_string()))
}

impl MevBackend for LocalBackend {
    fn mev_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn miner_in_turn(&self) -> bool {
        self.in_turn.load(Ordering::SeqCst)
    }

    fn current_header(&self) -> ChainHead {
        *self.head.read()
    }

    fn send_bid(&self, args: BidArgs) -> Result<B256, BackendError> {
        let raw_bid = args
            .raw_bid
            .as_ref()
            .ok_or_else(|| BackendError::Internal("missing raw bid".to_owned()))?;
        let gas_fee = raw_bid
            .gas_fee
            .filter(|gas_fee| !gas_fee.is_negative())
            .map(I256::into_raw)
            .ok_or_else(|| BackendError::Internal("missing gas fee".to_owned()))?;
        let bid_hash = raw_bid.hash();
        let builder = recover_builder(&bid_hash, &args.signature)?;
        if !self.has_builder(&builder) {
            return Err(BackendError::UnknownBuilder(builder));
        }

        let mut books = self.books.lock();
        let book = books.entry(raw_bid.parent_hash).or_default();
        if book.bids.contains(&bid_hash) {
            return Err(BackendError::DuplicateBid(bid_hash));
        }
        if book.bids.len() >= self.max_pending_bids {
            return Err(BackendError::Busy);
        }
        let limit = self.params.max_bids_per_builder;
        let builder_bids = book.bids_per_builder.entry(builder).or_default();
        // 0 disables the limit
        if limit != 0 && *builder_bids >= limit {
            return Err(BackendError::TooManyBids { limit });
        }
        *builder_bids += 1;
        book.bids.insert(bid_hash);
        if gas_fee > book.best_gas_fee {
            book.best_gas_fee = gas_fee;
            trace!(%bid_hash, %builder, %gas_fee, "New best bid");
        }
        Ok(bid_hash)
    }

    fn best_bid_gas_fee(&self, parent_hash: B256) -> Option<U256> {
        self.books
            .lock()
            .get(&parent_hash)
            .map(|book| book.best_gas_fee)
    }

    fn mev_params(&self) -> MevParams {
        self.params.clone()
    }
}
