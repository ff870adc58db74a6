//! End-to-end tests for the mint recorder
//!
//! Every verification step of the pipeline is exercised: receipt lookup,
//! on-chain status, contract and sender matching, wallet linkage, and the
//! duplicate-submission conflict.

mod common;

use common::{StubChainClient, TestClient, TestServer, TEST_USER};
use reqwest::StatusCode;
use serde_json::json;
use vibezmaster_studio::chain::TxReceipt;
use vibezmaster_studio::user::UserStore;

const WALLET: &str = "0xAb5801a7D398351b8bE11C439e05C5B3259aeC9B";
const CONTRACT: &str = "0x000000000000000000000000000000000000c0de";
const TX_HASH: &str = "0xdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef";

fn good_receipt() -> TxReceipt {
    TxReceipt {
        transaction_hash: TX_HASH.to_string(),
        status: "0x1".to_string(),
        from: WALLET.to_lowercase(),
        to: Some(CONTRACT.to_string()),
    }
}

fn mint_body() -> serde_json::Value {
    json!({
        "transactionHash": TX_HASH,
        "contractAddress": CONTRACT,
        "tokenId": "7"
    })
}

fn link_test_wallet(server: &TestServer, address: &str) {
    let user_id = server.user_store.get_user_id(TEST_USER).unwrap();
    server.user_store.set_wallet_address(user_id, address).unwrap();
}

async fn authenticated_server(chain: StubChainClient) -> (TestServer, TestClient) {
    let server = TestServer::spawn_with(common::ModelScript::Fail, chain).await;
    let client = TestClient::authenticated(server.base_url.clone()).await;
    (server, client)
}

#[tokio::test]
async fn test_successful_mint_then_duplicate_conflict() {
    let (server, client) =
        authenticated_server(StubChainClient::empty().with_receipt(good_receipt())).await;
    link_test_wallet(&server, WALLET);

    let response = client.record_mint(mint_body()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["data"]["transactionHash"], TX_HASH);
    assert_eq!(body["data"]["tokenId"], "7");
    assert_eq!(body["message"], "Mint successfully recorded");

    // Submitting the same transaction hash again conflicts
    let response = client.record_mint(mint_body()).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Only one record was stored
    let records: serde_json::Value = client.mint_records().await.json().await.unwrap();
    assert_eq!(records["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_sender_mismatch_is_rejected_even_for_successful_tx() {
    let (server, client) =
        authenticated_server(StubChainClient::empty().with_receipt(good_receipt())).await;
    // The caller's linked wallet is not the receipt sender
    link_test_wallet(&server, "0x1111111111111111111111111111111111111111");

    let response = client.record_mint(mint_body()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Transaction sender does not match user wallet");

    let records: serde_json::Value = client.mint_records().await.json().await.unwrap();
    assert!(records["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_wallet_addresses_match_case_insensitively() {
    let mut receipt = good_receipt();
    receipt.from = WALLET.to_uppercase().replace("0X", "0x");
    let (server, client) =
        authenticated_server(StubChainClient::empty().with_receipt(receipt)).await;
    link_test_wallet(&server, &WALLET.to_lowercase());

    let response = client.record_mint(mint_body()).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_failed_transaction_is_rejected() {
    let mut receipt = good_receipt();
    receipt.status = "0x0".to_string();
    let (server, client) =
        authenticated_server(StubChainClient::empty().with_receipt(receipt)).await;
    link_test_wallet(&server, WALLET);

    let response = client.record_mint(mint_body()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Transaction failed on-chain");
}

#[tokio::test]
async fn test_contract_address_mismatch_is_rejected() {
    let mut receipt = good_receipt();
    receipt.to = Some("0x9999999999999999999999999999999999999999".to_string());
    let (server, client) =
        authenticated_server(StubChainClient::empty().with_receipt(receipt)).await;
    link_test_wallet(&server, WALLET);

    let response = client.record_mint(mint_body()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Contract address mismatch");
}

#[tokio::test]
async fn test_unknown_transaction_is_rejected() {
    let (server, client) = authenticated_server(StubChainClient::empty()).await;
    link_test_wallet(&server, WALLET);

    let response = client.record_mint(mint_body()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Failed to verify transaction on blockchain");
}

#[tokio::test]
async fn test_chain_outage_is_rejected_not_recorded() {
    let (server, client) = authenticated_server(StubChainClient::failing()).await;
    link_test_wallet(&server, WALLET);

    let response = client.record_mint(mint_body()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let records: serde_json::Value = client.mint_records().await.json().await.unwrap();
    assert!(records["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unlinked_wallet_is_rejected() {
    let (_server, client) =
        authenticated_server(StubChainClient::empty().with_receipt(good_receipt())).await;
    // No wallet linked for the test user

    let response = client.record_mint(mint_body()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "User profile not found or wallet not linked");
}

#[tokio::test]
async fn test_missing_fields_are_rejected() {
    let (_server, client) = authenticated_server(StubChainClient::empty()).await;

    for body in [
        json!({ "contractAddress": CONTRACT }),
        json!({ "transactionHash": TX_HASH }),
        json!({}),
    ] {
        let response = client.record_mint(body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_token_id_is_optional() {
    let (server, client) =
        authenticated_server(StubChainClient::empty().with_receipt(good_receipt())).await;
    link_test_wallet(&server, WALLET);

    let response = client
        .record_mint(json!({
            "transactionHash": TX_HASH,
            "contractAddress": CONTRACT
        }))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["data"]["tokenId"].is_null());
}

#[tokio::test]
async fn test_unauthenticated_mint_is_rejected() {
    let server =
        TestServer::spawn_with(common::ModelScript::Fail, StubChainClient::empty()).await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.record_mint(mint_body()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client.mint_records().await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
