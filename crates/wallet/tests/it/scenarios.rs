//! End to end flows a dapp test goes through.

use crate::utils::{ACCOUNT_0, ACCOUNT_1, MockSigner, SignerCall, mock_wallet, record};
use headless_wallet::{ChainConfig, WalletConfig, WalletError, rpc::error::ErrorCode};
use serde_json::json;

#[tokio::test(flavor = "multi_thread")]
async fn single_chain_dapp_flow() {
    crate::init_tracing();
    let (wallet, transport) = mock_wallet(
        WalletConfig::default()
            .with_chain(ChainConfig::new(1).with_rpc_url("http://localhost:8545".parse().unwrap()))
            .with_debug(true),
    );
    transport.respond("eth_blockNumber", json!("0x10"));
    let connects = record(&wallet, "connect");

    assert_eq!(wallet.request("eth_chainId", ()).await.unwrap(), json!("0x1"));
    assert_eq!(wallet.request("net_version", ()).await.unwrap(), json!("1"));
    wallet.request("eth_requestAccounts", ()).await.unwrap();
    assert_eq!(*connects.lock(), vec![vec![json!({"chainId": "0x1"})]]);

    assert_eq!(wallet.request("eth_blockNumber", ()).await.unwrap(), json!("0x10"));
    assert_eq!(transport.calls()[0].url.as_str(), "http://localhost:8545/");

    let changes = record(&wallet, "accountsChanged");
    let account_3 = wallet.dev_accounts().get(3).unwrap().address();
    assert_eq!(wallet.switch_account(3usize).unwrap(), account_3);
    assert_eq!(*changes.lock(), vec![vec![json!([account_3])]]);
    for method in ["eth_accounts", "eth_requestAccounts"] {
        assert_eq!(wallet.request(method, ()).await.unwrap(), json!([account_3]), "{method}");
    }
    // already connected
    assert_eq!(connects.lock().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn multi_chain_routing() {
    let signer = MockSigner::new(ACCOUNT_0);
    let (wallet, transport) = mock_wallet(
        WalletConfig::default()
            .with_chains([ChainConfig::new(1), ChainConfig::new(42161)])
            .with_rpc_url(1, "http://127.0.0.1:8545".parse().unwrap())
            .with_rpc_url(42161, "http://127.0.0.1:8546".parse().unwrap())
            .with_signer(signer.clone()),
    );
    let chains = record(&wallet, "chainChanged");

    wallet.request("eth_blockNumber", ()).await.unwrap();
    let res =
        wallet.request("wallet_switchEthereumChain", vec![json!({"chainId": "0xa4b1"})]).await;
    assert_eq!(res.unwrap(), json!(null));
    assert_eq!(wallet.request("eth_chainId", ()).await.unwrap(), json!("0xa4b1"));
    assert_eq!(wallet.rpc_url().as_str(), "http://127.0.0.1:8546/");
    wallet.request("eth_blockNumber", ()).await.unwrap();

    let urls: Vec<_> = transport.calls().iter().map(|sent| sent.url.to_string()).collect();
    assert_eq!(urls, ["http://127.0.0.1:8545/", "http://127.0.0.1:8546/"]);
    assert_eq!(*chains.lock(), vec![vec![json!("0xa4b1")]]);

    // transactions are bound to the new chain
    wallet.request("eth_sendTransaction", vec![json!({"to": ACCOUNT_1})]).await.unwrap();
    let calls = signer.calls();
    let [SignerCall::SendTransaction { chain, request }] = calls.as_slice() else {
        panic!("unexpected signer calls {calls:?}");
    };
    assert_eq!(chain.id, 42161);
    assert_eq!(chain.rpc_url.as_str(), "http://127.0.0.1:8546/");
    assert_eq!(request.chain_id, Some(42161));
}

#[tokio::test(flavor = "multi_thread")]
async fn node_errors_are_preserved() {
    let (wallet, transport) = mock_wallet(WalletConfig::default());
    transport.respond_raw(
        "eth_call",
        json!({
            "jsonrpc": "2.0",
            "error": {"code": -32600, "message": "Invalid Request"}
        }),
    );

    let err = wallet.request("eth_call", vec![json!({"to": ACCOUNT_1})]).await.unwrap_err();
    let WalletError::Rpc(rpc) = &err else { panic!("expected rpc error, got {err:?}") };
    assert_eq!(rpc.code, ErrorCode::InvalidRequest);
    assert_eq!(rpc.message, "Invalid Request");
    assert_eq!(err.code(), Some(-32600));
    assert_eq!(err.to_string(), "Invalid Request");
}

#[tokio::test(flavor = "multi_thread")]
async fn any_chain_mode_accepts_every_chain() {
    let (wallet, transport) = mock_wallet(
        WalletConfig::default().with_default_rpc_url("http://127.0.0.1:9545".parse().unwrap()),
    );
    assert_eq!(wallet.chain_id(), 31337);

    wallet.switch_chain(10).unwrap();
    assert_eq!(wallet.request("eth_chainId", ()).await.unwrap(), json!("0xa"));
    wallet.request("eth_gasPrice", ()).await.unwrap();
    assert_eq!(transport.calls()[0].url.as_str(), "http://127.0.0.1:9545/");
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_requests_share_the_session() {
    let (wallet, transport) = mock_wallet(WalletConfig::default());

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let wallet = wallet.clone();
            tokio::spawn(async move {
                if i % 2 == 0 {
                    wallet.request("eth_blockNumber", ()).await
                } else {
                    wallet.request("eth_chainId", ()).await
                }
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(wallet.request_count(), 16);
    let mut ids: Vec<_> = transport.calls().iter().map(|sent| sent.call.id.to_string()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
}
