use async_trait::async_trait;
use serde_json::{json, Value};
use shared::units::parse_hex_quantity;
use shared::{AssetKind, BalanceRequestItem, BalanceResultItem, Error, NetworkDefinition, Result};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::gateway::BlockchainGateway;
use crate::types::{balance_of_calldata, JsonRpcRequest, JsonRpcResponse};

/// JSON-RPC client for one EVM-compatible network.
///
/// Every `get_balances` call is sent as a single JSON-RPC batch. Transport
/// failures fail over from the primary endpoint to each fallback in order.
pub struct EvmClient {
    chain_id: u64,
    network_name: String,
    endpoints: Vec<String>,
    http: reqwest::Client,
}

impl EvmClient {
    /// Create a client for `network` whose HTTP calls time out after `timeout`
    pub fn new(network: &NetworkDefinition, timeout: Duration) -> Result<Self> {
        let endpoints = network.rpc_endpoints();
        if endpoints.is_empty() {
            return Err(Error::EvmRpc(format!(
                "No RPC endpoint configured for {}",
                network.name
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::EvmRpc(format!("Failed to build HTTP client: {}", e)))?;

        info!(
            chain_id = network.chain_id,
            network = %network.name,
            primary = %endpoints[0],
            fallbacks = endpoints.len() - 1,
            "Initializing EVM client"
        );

        Ok(Self {
            chain_id: network.chain_id,
            network_name: network.name.clone(),
            endpoints,
            http,
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Build the batch body. The JSON-RPC id of each call is its index in `requests`.
    pub fn build_batch(requests: &[BalanceRequestItem]) -> Vec<JsonRpcRequest> {
        requests
            .iter()
            .enumerate()
            .map(|(index, request)| match &request.asset {
                AssetKind::Native => JsonRpcRequest {
                    jsonrpc: "2.0",
                    id: index as u64,
                    method: "eth_getBalance",
                    params: json!([request.wallet_address, "latest"]),
                },
                AssetKind::Token { address } => JsonRpcRequest {
                    jsonrpc: "2.0",
                    id: index as u64,
                    method: "eth_call",
                    params: json!([
                        {
                            "to": address,
                            "data": balance_of_calldata(&request.wallet_address),
                        },
                        "latest"
                    ]),
                },
            })
            .collect()
    }

    /// Match batch responses back to their requests by id and decode each one.
    pub fn decode_batch(
        requests: &[BalanceRequestItem],
        responses: Vec<JsonRpcResponse>,
    ) -> Vec<BalanceResultItem> {
        let mut by_id: HashMap<u64, JsonRpcResponse> = responses
            .into_iter()
            .filter_map(|response| response.numeric_id().map(|id| (id, response)))
            .collect();

        requests
            .iter()
            .enumerate()
            .map(|(index, request)| match by_id.remove(&(index as u64)) {
                Some(response) => Self::decode_item(request, response),
                None => BalanceResultItem::failure(request, "No response for request in batch"),
            })
            .collect()
    }

    fn decode_item(request: &BalanceRequestItem, response: JsonRpcResponse) -> BalanceResultItem {
        if let Some(error) = response.error {
            return BalanceResultItem::failure(
                request,
                format!("RPC error {}: {}", error.code, error.message),
            );
        }

        let raw = match response.result {
            Some(Value::String(raw)) => raw,
            Some(Value::Null) | None => {
                return BalanceResultItem::failure(request, "Missing result in RPC response")
            }
            Some(other) => {
                return BalanceResultItem::failure(
                    request,
                    format!("Unexpected result type in RPC response: {}", other),
                )
            }
        };

        match parse_hex_quantity(&raw) {
            Some(amount) => BalanceResultItem::success(request, amount),
            None => BalanceResultItem::failure(request, format!("Malformed hex quantity: {}", raw)),
        }
    }

    async fn post_batch(&self, rpc_url: &str, body: &[JsonRpcRequest]) -> Result<Vec<JsonRpcResponse>> {
        let response = self
            .http
            .post(rpc_url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::EvmRpc(format!("Failed to send RPC request: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::EvmRpc(format!(
                "RPC request failed with status: {}",
                response.status()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| Error::EvmRpc(format!("Failed to parse RPC response: {}", e)))?;

        // Nodes that reject a whole batch answer with a single error object
        if let Some(error) = payload.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error");
            return Err(Error::EvmRpc(format!("RPC batch error: {}", message)));
        }

        serde_json::from_value(payload)
            .map_err(|e| Error::EvmRpc(format!("Unexpected RPC batch response: {}", e)))
    }
}

#[async_trait]
impl BlockchainGateway for EvmClient {
    async fn get_balances(&self, requests: &[BalanceRequestItem]) -> Result<Vec<BalanceResultItem>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let body = Self::build_batch(requests);
        let mut last_error = None;

        for (attempt, url) in self.endpoints.iter().enumerate() {
            if attempt > 0 {
                debug!(chain_id = self.chain_id, endpoint = %url, "Trying fallback RPC endpoint");
            }

            match self.post_batch(url, &body).await {
                Ok(responses) => {
                    debug!(
                        chain_id = self.chain_id,
                        requests = requests.len(),
                        responses = responses.len(),
                        "Balance batch completed"
                    );
                    return Ok(Self::decode_batch(requests, responses));
                }
                Err(e) => {
                    warn!(
                        chain_id = self.chain_id,
                        network = %self.network_name,
                        endpoint = %url,
                        error = %e,
                        "RPC endpoint failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::EvmRpc(format!("No RPC endpoint available for {}", self.network_name))
        }))
    }
}
