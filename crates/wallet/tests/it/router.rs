use crate::utils::{ACCOUNT_0, MockSigner, mock_wallet, record};
use alloy_primitives::Address;
use headless_wallet::{UnknownMethodPolicy, WalletConfig, WalletError};
use serde_json::{Value, json};

fn addresses(value: Value) -> Vec<Address> {
    serde_json::from_value(value).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn wallet_state_never_touches_the_transport() {
    crate::init_tracing();
    let (wallet, transport) = mock_wallet(WalletConfig::default());

    let calls: Vec<(&str, Value)> = vec![
        ("eth_accounts", json!([])),
        ("eth_chainId", json!([])),
        ("net_version", json!([])),
        ("eth_requestAccounts", json!([])),
        ("wallet_switchEthereumChain", json!([{"chainId": "0x1"}])),
        ("wallet_addEthereumChain", json!([{"chainId": "0x89", "chainName": "Polygon"}])),
        ("wallet_getPermissions", json!([])),
        ("wallet_requestPermissions", json!([{"eth_accounts": {}}])),
        ("wallet_revokePermissions", json!([{"eth_accounts": {}}])),
        ("wallet_watchAsset", json!([{"type": "ERC20", "options": {}}])),
    ];
    for (method, params) in calls {
        let params: Vec<Value> = serde_json::from_value(params).unwrap();
        wallet.request(method, params).await.unwrap();
    }

    assert!(transport.calls().is_empty());
    assert_eq!(wallet.request_count(), 10);
}

#[tokio::test(flavor = "multi_thread")]
async fn answers_from_the_session() {
    let (wallet, _) = mock_wallet(WalletConfig::default());

    assert_eq!(wallet.request("eth_chainId", ()).await.unwrap(), json!("0x7a69"));
    assert_eq!(wallet.request("net_version", ()).await.unwrap(), json!("31337"));
    assert_eq!(addresses(wallet.request("eth_accounts", ()).await.unwrap()), vec![ACCOUNT_0]);
    assert_eq!(
        wallet.request("wallet_getPermissions", ()).await.unwrap(),
        json!([{"parentCapability": "eth_accounts", "caveats": []}])
    );
    assert_eq!(wallet.request("wallet_addEthereumChain", ()).await.unwrap(), Value::Null);
    assert_eq!(wallet.request("wallet_watchAsset", ()).await.unwrap(), json!(true));
    // adding a chain does not make it switchable
    assert_eq!(wallet.chain_id(), 31337);
}

#[tokio::test(flavor = "multi_thread")]
async fn request_accounts_connects_once() {
    let (wallet, _) = mock_wallet(WalletConfig::default());
    let connects = record(&wallet, "connect");
    assert!(!wallet.is_connected());

    for _ in 0..3 {
        let accounts = wallet.request("eth_requestAccounts", ()).await.unwrap();
        assert_eq!(addresses(accounts), vec![ACCOUNT_0]);
    }

    assert!(wallet.is_connected());
    assert_eq!(*connects.lock(), vec![vec![json!({"chainId": "0x7a69"})]]);
}

#[tokio::test(flavor = "multi_thread")]
async fn reads_are_forwarded_to_the_active_chain() {
    let (wallet, transport) = mock_wallet(WalletConfig::default());
    transport.respond("eth_getBalance", json!("0xde0b6b3a7640000"));

    let params = vec![json!(ACCOUNT_0), json!("latest")];
    let balance = wallet.request("eth_getBalance", params.clone()).await.unwrap();
    assert_eq!(balance, json!("0xde0b6b3a7640000"));

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].url.as_str(), "http://127.0.0.1:8545/");
    let envelope = serde_json::to_value(&calls[0].call).unwrap();
    assert_eq!(
        envelope,
        json!({"jsonrpc": "2.0", "method": "eth_getBalance", "params": params, "id": 1})
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn request_ids_increase() {
    let (wallet, transport) = mock_wallet(WalletConfig::default());
    wallet.request("eth_chainId", ()).await.unwrap();
    wallet.request("eth_blockNumber", ()).await.unwrap();
    wallet.request("eth_gasPrice", ()).await.unwrap();

    let ids: Vec<_> = transport.calls().iter().map(|sent| sent.call.id.to_string()).collect();
    assert_eq!(ids, ["2", "3"]);
    assert_eq!(wallet.request_count(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_methods_follow_the_policy() {
    let (wallet, transport) = mock_wallet(WalletConfig::default());
    transport.respond("anvil_mine", Value::Null);
    assert_eq!(wallet.request("anvil_mine", vec![json!(1)]).await.unwrap(), Value::Null);
    assert_eq!(transport.methods(), ["anvil_mine"]);

    let (wallet, transport) =
        mock_wallet(WalletConfig::default().with_unknown_methods(UnknownMethodPolicy::Reject));
    let err = wallet.request("anvil_mine", ()).await.unwrap_err();
    assert!(matches!(err, WalletError::UnsupportedMethod(ref m) if m == "anvil_mine"));
    assert_eq!(err.code(), Some(4200));
    assert!(transport.calls().is_empty());

    // known reads are still forwarded
    wallet.request("eth_blockNumber", ()).await.unwrap();
    assert_eq!(transport.methods(), ["eth_blockNumber"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn sign_transaction_is_unsupported() {
    let signer = MockSigner::new(ACCOUNT_0);
    let (wallet, transport) = mock_wallet(WalletConfig::default().with_signer(signer.clone()));

    let err = wallet.request("eth_signTransaction", vec![json!({})]).await.unwrap_err();
    assert_eq!(err.code(), Some(4200));
    assert!(err.to_string().contains("eth_signTransaction"));
    assert!(signer.calls().is_empty());
    assert!(transport.calls().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_params() {
    let (wallet, _) = mock_wallet(WalletConfig::default());

    let err = wallet.request("wallet_switchEthereumChain", ()).await.unwrap_err();
    assert!(matches!(err, WalletError::InvalidParams(_)), "{err:?}");

    let err = wallet
        .request("wallet_switchEthereumChain", vec![json!({"chainId": "mainnet"})])
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(-32602));

    let err = wallet.request("personal_sign", vec![json!(42)]).await.unwrap_err();
    assert_eq!(err.code(), Some(-32602));
}

#[tokio::test(flavor = "multi_thread")]
async fn json_envelope() {
    let (wallet, _) = mock_wallet(WalletConfig::default());

    let call = serde_json::from_value(json!({
        "jsonrpc": "2.0", "method": "eth_chainId", "params": [], "id": "a"
    }))
    .unwrap();
    let res = serde_json::to_value(wallet.request_json(call).await).unwrap();
    assert_eq!(res, json!({"jsonrpc": "2.0", "id": "a", "result": "0x7a69"}));

    let call = serde_json::from_value(json!({
        "jsonrpc": "2.0", "method": "eth_signTransaction", "params": [{}], "id": 5
    }))
    .unwrap();
    let res = serde_json::to_value(wallet.request_json(call).await).unwrap();
    assert_eq!(res["id"], json!(5));
    assert_eq!(res["error"]["code"], json!(4200));
}
