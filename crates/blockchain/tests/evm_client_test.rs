use blockchain::{BlockchainGateway, EvmClient, EvmGatewayProvider, GatewayProvider};
use shared::{BalanceRequestItem, NetworkDefinition, TokenInfo, Wallet};
use std::time::Duration;

fn ethereum(primary: &str, fallbacks: Vec<String>) -> NetworkDefinition {
    NetworkDefinition {
        chain_id: 1,
        name: "Ethereum".to_string(),
        identifier: "ethereum".to_string(),
        native_symbol: "ETH".to_string(),
        native_decimals: 18,
        price_feed_chain_id: "ethereum".to_string(),
        wrapped_native_address: Some("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2".to_string()),
        primary_rpc_url: primary.to_string(),
        fallback_rpc_urls: fallbacks,
        block_explorer_url: Some("https://etherscan.io".to_string()),
    }
}

fn wallet() -> Wallet {
    Wallet::parse("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045").unwrap()
}

#[tokio::test]
async fn test_empty_request_set_skips_network() {
    let client = EvmClient::new(&ethereum("http://127.0.0.1:9", Vec::new()), Duration::from_secs(1)).unwrap();
    let results = client.get_balances(&[]).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_unreachable_endpoints_fail_whole_batch() {
    let network = ethereum("http://127.0.0.1:9", vec!["http://127.0.0.1:10".to_string()]);
    let client = EvmClient::new(&network, Duration::from_secs(1)).unwrap();
    let requests = vec![BalanceRequestItem::native(&wallet(), &network)];

    let result = client.get_balances(&requests).await;
    assert!(result.is_err());
}

#[tokio::test]
#[ignore] // Requires network access to a public Ethereum RPC
async fn test_live_batch_balances() {
    let network = ethereum(
        "https://eth.llamarpc.com",
        vec!["https://rpc.ankr.com/eth".to_string()],
    );
    let provider = EvmGatewayProvider::new(Duration::from_secs(15));
    let gateway = provider.gateway(&network).unwrap();

    let usdc = TokenInfo {
        chain_id: 1,
        address: "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".to_string(),
        name: "USD Coin".to_string(),
        symbol: "USDC".to_string(),
        decimals: 6,
    };
    let requests = vec![
        BalanceRequestItem::native(&wallet(), &network),
        BalanceRequestItem::token(&wallet(), &network, &usdc),
    ];

    let results = gateway.get_balances(&requests).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].request_id, requests[0].id);
    assert_eq!(results[1].request_id, requests[1].id);
}
