use std::collections::HashSet;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use harvest_core::{AcceptedRecord, FilterCriteria};
use harvest_engine::{
    run_harvest, DetailSettings, HarvestConfig, ListingSettings, NullProgress, RetryPolicy,
    StoreClient,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING: &str = "/IStoreService/GetAppList/v1/";
const DETAILS: &str = "/api/appdetails";

fn config(server: &MockServer, temp: &TempDir, criteria: FilterCriteria) -> HarvestConfig {
    HarvestConfig {
        output_path: temp.path().join("steam.jsonl"),
        criteria,
        listing: ListingSettings {
            endpoint: format!("{}{}", server.uri(), LISTING),
            api_key: "key".to_string(),
            page_delay: Duration::ZERO,
            ..ListingSettings::default()
        },
        detail: DetailSettings {
            endpoint: format!("{}{}", server.uri(), DETAILS),
            ..DetailSettings::default()
        },
        retry: RetryPolicy {
            rate_limit_base: Duration::from_millis(5),
            rate_limit_step: Duration::from_millis(5),
            server_fault_delay: Duration::from_millis(5),
            network_delay: Duration::from_millis(5),
            politeness_delay: Duration::from_millis(1),
            ..RetryPolicy::default()
        },
        concurrency: 3,
    }
}

async fn mount_listing(server: &MockServer, ids: &[u64]) {
    let apps: Vec<_> = ids.iter().map(|id| serde_json::json!({"appid": id})).collect();
    let last = ids.iter().max().copied().unwrap_or(0);
    Mock::given(method("GET"))
        .and(path(LISTING))
        .and(query_param("last_appid", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": {"apps": apps, "have_more_results": true}
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(LISTING))
        .and(query_param("last_appid", last.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"response": {}})))
        .mount(server)
        .await;
}

async fn mount_game(server: &MockServer, app_id: u64, date: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(DETAILS))
        .and(query_param("appids", app_id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            app_id.to_string(): {"success": true, "data": {
                "type": "game",
                "name": format!("Game {app_id}"),
                "release_date": {"date": date},
                "price_overview": {"final": 1999}
            }}
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn stored_ids(path: &std::path::Path) -> Vec<u64> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str::<AcceptedRecord>(line).unwrap().appid)
        .collect()
}

#[tokio::test]
async fn second_run_writes_no_duplicates() {
    engine_logging::initialize_for_tests();
    let server = MockServer::start().await;
    mount_listing(&server, &[1_300_001, 1_300_002, 1_300_003, 1_000_000]).await;
    // Filtered-out items are not stored, so the second run fetches them again.
    mount_game(&server, 1_300_001, "4 Apr 2021", 1).await;
    mount_game(&server, 1_300_002, "9 Sep 2024", 1).await;
    mount_game(&server, 1_300_003, "1 Jan 2018", 2).await;
    mount_game(&server, 1_000_000, "1 Jan 2022", 0).await;

    let temp = TempDir::new().unwrap();
    let config = config(&server, &temp, FilterCriteria::default());
    let client = Arc::new(StoreClient::new(config.listing.clone(), config.detail.clone()).unwrap());

    let first = run_harvest(&config, client.as_ref(), client.clone(), &NullProgress)
        .await
        .unwrap();
    assert_eq!(first.candidates, 3);
    assert_eq!(first.already_done, 0);
    assert_eq!(first.written, 2);
    assert_eq!(first.filtered_out, 1);

    let second = run_harvest(&config, client.as_ref(), client.clone(), &NullProgress)
        .await
        .unwrap();
    assert_eq!(second.candidates, 3);
    assert_eq!(second.already_done, 2);
    assert_eq!(second.queued, 1);
    assert_eq!(second.written, 0);

    let ids = stored_ids(&config.output_path);
    let unique: HashSet<_> = ids.iter().copied().collect();
    assert_eq!(ids.len(), unique.len());
    assert_eq!(unique, HashSet::from([1_300_001, 1_300_002]));
    for record in fs::read_to_string(&config.output_path).unwrap().lines() {
        let record: AcceptedRecord = serde_json::from_str(record).unwrap();
        assert!(config.criteria.accepts_year(record.release_year));
        assert_eq!(record.price, 19.99);
    }
}

#[tokio::test]
async fn checkpointed_ids_are_never_fetched() {
    engine_logging::initialize_for_tests();
    let server = MockServer::start().await;
    mount_listing(&server, &[42, 43]).await;
    mount_game(&server, 42, "1 Jan 2023", 0).await;
    mount_game(&server, 43, "1 Jan 2023", 1).await;

    let temp = TempDir::new().unwrap();
    let config = config(&server, &temp, FilterCriteria::new(0, 2021..=2025));
    fs::write(
        &config.output_path,
        "{\"appid\":42,\"name\":\"Earlier\",\"release_year\":2023}\n",
    )
    .unwrap();
    let client = Arc::new(StoreClient::new(config.listing.clone(), config.detail.clone()).unwrap());

    let summary = run_harvest(&config, client.as_ref(), client.clone(), &NullProgress)
        .await
        .unwrap();

    assert_eq!(summary.candidates, 2);
    assert_eq!(summary.already_done, 1);
    assert_eq!(summary.queued, 1);
    assert_eq!(summary.written, 1);
    assert_eq!(stored_ids_lenient(&config.output_path), vec![42, 43]);
}

#[tokio::test]
async fn forbidden_listing_ends_run_without_fetching() {
    engine_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DETAILS))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let config = config(&server, &temp, FilterCriteria::default());
    let client = Arc::new(StoreClient::new(config.listing.clone(), config.detail.clone()).unwrap());

    let summary = run_harvest(&config, client.as_ref(), client.clone(), &NullProgress)
        .await
        .unwrap();
    assert_eq!(summary.candidates, 0);
    assert_eq!(summary.checked, 0);
}

fn stored_ids_lenient(path: &std::path::Path) -> Vec<u64> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap()["appid"].as_u64().unwrap())
        .collect()
}
