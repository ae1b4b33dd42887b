//! End-to-end tests for the variant listing and server status endpoints

mod common;

use common::*;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn test_home_reports_published_table() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.home().await;
    assert_eq!(response.status(), StatusCode::OK);
    let stats: Value = response.json().await.unwrap();
    assert_eq!(stats["variants"], 360);
    assert!(!stats["build_id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.health().await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_all_variants_are_ranked() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.variants().await;
    assert_eq!(response.status(), StatusCode::OK);
    let export: Value = response.json().await.unwrap();
    assert_eq!(export["subset"], "all");

    let variants = export["variants"].as_array().unwrap();
    assert_eq!(variants.len(), 360);
    assert_eq!(variants[0]["key"], ALL_RANDOM_KEY);
    assert_eq!(variants[0]["matchCount"], CATALOG_SIZE);
    assert_eq!(variants[0]["rank"], 1);
    assert_eq!(variants[0]["infoCount"], 0);

    let counts: Vec<u64> = variants
        .iter()
        .map(|v| v["matchCount"].as_u64().unwrap())
        .collect();
    assert!(counts.windows(2).all(|pair| pair[0] >= pair[1]));

    let ranks: Vec<u64> = variants.iter().map(|v| v["rank"].as_u64().unwrap()).collect();
    assert_eq!(ranks, (1..=360).collect::<Vec<u64>>());
}

#[tokio::test]
async fn test_full_info_subset() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.variants_subset("full-info").await;
    assert_eq!(response.status(), StatusCode::OK);
    let export: Value = response.json().await.unwrap();
    assert_eq!(export["subset"], "full-info");

    let variants = export["variants"].as_array().unwrap();
    assert_eq!(variants.len(), 120);
    for (index, variant) in variants.iter().enumerate() {
        assert_eq!(variant["infoCount"], 4);
        assert_eq!(variant["subsetRank"], index + 1);
        assert!(!variant["key"].as_str().unwrap().contains("RANDOM"));
    }
    let single = variants
        .iter()
        .find(|v| v["key"] == SINGLE_SONG_KEY)
        .unwrap();
    assert_eq!(single["matchCount"], 1);
}

#[tokio::test]
async fn test_unknown_subset_is_rejected() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.variants_subset("most-info").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_SUBSET");
}

#[tokio::test]
async fn test_unpublished_table_lists_nothing() {
    let server = TestServer::spawn_unpublished().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.variants().await;
    assert_eq!(response.status(), StatusCode::OK);
    let export: Value = response.json().await.unwrap();
    assert_eq!(export["buildId"], "");
    assert!(export["variants"].as_array().unwrap().is_empty());
}
