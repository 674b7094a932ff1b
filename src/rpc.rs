//! JSON-RPC binding: `mev_*` for builders and `miner_*` for the node operator.
use alloy_primitives::{Address, B256, U256};
use jsonrpsee::{
    core::{async_trait, RpcResult},
    proc_macros::rpc,
    server::{Server, ServerHandle},
};
use std::{net::SocketAddr, sync::Arc};
use tracing::info;

use crate::{
    local_backend::LocalBackend,
    types::{BidArgs, BidIssue, MevParams},
    validator::MevApi,
};

#[rpc(server, client, namespace = "mev")]
pub trait MevRpc {
    /// Receives a bid from a builder. Returns the bid hash.
    #[method(name = "sendBid")]
    async fn send_bid(&self, args: BidArgs) -> RpcResult<B256>;

    #[method(name = "bestBidGasFee")]
    async fn best_bid_gas_fee(&self, parent_hash: B256) -> RpcResult<Option<U256>>;

    #[method(name = "params")]
    async fn params(&self) -> RpcResult<MevParams>;

    #[method(name = "running")]
    async fn running(&self) -> RpcResult<bool>;

    /// Served for validators reporting problems with a bid.
    #[method(name = "reportIssue")]
    async fn report_issue(&self, issue: BidIssue) -> RpcResult<()>;
}

#[async_trait]
impl MevRpcServer for MevApi {
    async fn send_bid(&self, args: BidArgs) -> RpcResult<B256> {
        Ok(MevApi::send_bid(self, args)?)
    }

    async fn best_bid_gas_fee(&self, parent_hash: B256) -> RpcResult<Option<U256>> {
        Ok(MevApi::best_bid_gas_fee(self, parent_hash))
    }

    async fn params(&self) -> RpcResult<MevParams> {
        Ok(MevApi::params(self))
    }

    async fn running(&self) -> RpcResult<bool> {
        Ok(MevApi::running(self))
    }

    async fn report_issue(&self, issue: BidIssue) -> RpcResult<()> {
        Ok(MevApi::report_issue(self, issue)?)
    }
}

#[rpc(server, client, namespace = "miner")]
pub trait MinerMevRpc {
    #[method(name = "startMev")]
    async fn start_mev(&self) -> RpcResult<()>;

    #[method(name = "stopMev")]
    async fn stop_mev(&self) -> RpcResult<()>;

    #[method(name = "mevRunning")]
    async fn mev_running(&self) -> RpcResult<bool>;

    /// Returns false if the builder was already registered.
    #[method(name = "addBuilder")]
    async fn add_builder(&self, builder: Address) -> RpcResult<bool>;

    /// Returns false if the builder was not registered.
    #[method(name = "removeBuilder")]
    async fn remove_builder(&self, builder: Address) -> RpcResult<bool>;

    #[method(name = "hasBuilder")]
    async fn has_builder(&self, builder: Address) -> RpcResult<bool>;
}

/// Operator controls over a [LocalBackend].
#[derive(Debug, Clone)]
pub struct MinerMevApi {
    backend: Arc<LocalBackend>,
}

impl MinerMevApi {
    pub fn new(backend: Arc<LocalBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl MinerMevRpcServer for MinerMevApi {
    async fn start_mev(&self) -> RpcResult<()> {
        self.backend.start_mev();
        Ok(())
    }

    async fn stop_mev(&self) -> RpcResult<()> {
        self.backend.stop_mev();
        Ok(())
    }

    async fn mev_running(&self) -> RpcResult<bool> {
        Ok(crate::backend::MevBackend::mev_running(self.backend.as_ref()))
    }

    async fn add_builder(&self, builder: Address) -> RpcResult<bool> {
        let added = self.backend.add_builder(builder);
        info!(%builder, added, "Add builder");
        Ok(added)
    }

    async fn remove_builder(&self, builder: Address) -> RpcResult<bool> {
        let removed = self.backend.remove_builder(&builder);
        info!(%builder, removed, "Remove builder");
        Ok(removed)
    }

    async fn has_builder(&self, builder: Address) -> RpcResult<bool> {
        Ok(self.backend.has_builder(&builder))
    }
}

/// Serves `mev_*` and, if a local backend is given, `miner_*` on addr.
pub async fn start_rpc_server(
    addr: &str,
    api: MevApi,
    local_backend: Option<Arc<LocalBackend>>,
) -> eyre::Result<(SocketAddr, ServerHandle)> {
    let server = Server::builder().build(addr).await?;
    let local_addr = server.local_addr()?;
    let mut module = api.into_rpc();
    if let Some(backend) = local_backend {
        module.merge(MinerMevApi::new(backend).into_rpc())?;
    }
    let handle = server.start(module);
    info!(%local_addr, "Mev RPC server started");
    Ok((local_addr, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{
            INVALID_BID_PARAM_ERROR_CODE, INVALID_PAY_BID_TX_ERROR_CODE,
            MEV_NOT_RUNNING_ERROR_CODE,
        },
        local_backend::tests::{backend_for, head, signed_args},
    };
    use alloy_primitives::Bytes;
    use alloy_signer_local::PrivateKeySigner;
    use jsonrpsee::{
        core::{client::ClientT, Error},
        http_client::{HttpClient, HttpClientBuilder},
        rpc_params,
    };

    async fn start(backend: Arc<LocalBackend>) -> (HttpClient, ServerHandle) {
        let api = MevApi::new(backend.clone());
        let (addr, handle) = start_rpc_server("127.0.0.1:0", api, Some(backend))
            .await
            .unwrap();
        let client = HttpClientBuilder::default()
            .build(format!("http://{addr}"))
            .unwrap();
        (client, handle)
    }

    fn error_code(err: Error) -> i32 {
        match err {
            Error::Call(obj) => obj.code(),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_bid_over_rpc() {
        let signer = PrivateKeySigner::random();
        let backend = Arc::new(backend_for(&[signer.address()], 0));
        let (client, handle) = start(backend).await;

        let args = signed_args(&signer, 100);
        let expected_hash = args.raw_bid.as_ref().unwrap().hash();
        assert_eq!(MevRpcClient::send_bid(&client, args).await.unwrap(), expected_hash);
        assert_eq!(
            MevRpcClient::best_bid_gas_fee(&client, head().hash)
                .await
                .unwrap(),
            Some(U256::from(100))
        );

        let mut misaligned = signed_args(&signer, 200);
        misaligned.raw_bid.as_mut().unwrap().builder_fee = Some(alloy_primitives::I256::ONE);
        misaligned.pay_bid_tx_gas_used = 5_000;
        let err = MevRpcClient::send_bid(&client, misaligned).await.unwrap_err();
        assert_eq!(error_code(err), INVALID_PAY_BID_TX_ERROR_CODE);

        handle.stop().unwrap();
    }

    #[tokio::test]
    async fn go_style_payload_is_accepted() {
        let signer = PrivateKeySigner::random();
        let backend = Arc::new(backend_for(&[signer.address()], 0));
        let (client, handle) = start(backend).await;

        let args = signed_args(&signer, 100);
        let raw_bid = args.raw_bid.clone().unwrap();
        let payload = serde_json::json!({
            "rawBid": {
                "blockNumber": raw_bid.block_number,
                "parentHash": raw_bid.parent_hash,
                "txs": [],
                "unRevertible": [],
                "gasUsed": raw_bid.gas_used,
                "gasFee": 100,
            },
            "signature": args.signature,
        });
        let bid_hash: B256 = client
            .request("mev_sendBid", rpc_params![payload])
            .await
            .unwrap();
        assert_eq!(bid_hash, raw_bid.hash());

        let missing_raw_bid = serde_json::json!({ "signature": Bytes::new() });
        let err = client
            .request::<B256, _>("mev_sendBid", rpc_params![missing_raw_bid])
            .await
            .unwrap_err();
        assert_eq!(error_code(err), INVALID_BID_PARAM_ERROR_CODE);

        handle.stop().unwrap();
    }

    #[tokio::test]
    async fn operator_controls() {
        let signer = PrivateKeySigner::random();
        let backend = Arc::new(backend_for(&[], 0));
        let (client, handle) = start(backend).await;

        assert!(MinerMevRpcClient::add_builder(&client, signer.address())
            .await
            .unwrap());
        assert!(MinerMevRpcClient::has_builder(&client, signer.address())
            .await
            .unwrap());

        MinerMevRpcClient::stop_mev(&client).await.unwrap();
        assert!(!MevRpcClient::running(&client).await.unwrap());
        let err = MevRpcClient::send_bid(&client, signed_args(&signer, 100))
            .await
            .unwrap_err();
        assert_eq!(error_code(err), MEV_NOT_RUNNING_ERROR_CODE);

        MinerMevRpcClient::start_mev(&client).await.unwrap();
        assert!(MinerMevRpcClient::mev_running(&client).await.unwrap());
        assert!(MevRpcClient::send_bid(&client, signed_args(&signer, 100))
            .await
            .is_ok());

        MevRpcClient::report_issue(
            &client,
            BidIssue {
                builder: signer.address(),
                bid_hash: B256::repeat_byte(3),
                message: "payBidTx reverted".to_owned(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let params = MevRpcClient::params(&client).await.unwrap();
        assert_eq!(params.max_bids_per_builder, 0);

        handle.stop().unwrap();
    }
}
