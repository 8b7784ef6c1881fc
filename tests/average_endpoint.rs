//! End-to-end checks of the header handlers against a JSON store on disk.

use std::fs;
use std::path::PathBuf;

use serde_json::{Value, json};
use tally::{Config, DocumentStore, Handler, Status, StoreConfig};
use tempfile::TempDir;

const NOW: i64 = 1_744_662_005;

fn document(subject: &str, ts: i64, temp: f64) -> Value {
    json!({
        "m5Details": { "ax": 0.01, "ay": -0.02, "az": 0.98 },
        "shtDetails": { "temp": temp, "rHum": 45.0 },
        "vcnlDetails": { "prox": 2, "al": 150, "rwl": 300 },
        "otherDetails": { "timeCaptured": ts, "userId": subject }
    })
}

struct Fixture {
    _dir: TempDir,
    config: Config,
}

impl Fixture {
    /// Store seeded with the given collections.
    fn seeded(users: Value) -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, json!({ "users": users }).to_string()).unwrap();
        Self::at(dir, path, false)
    }

    fn empty() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        Self::at(dir, path, true)
    }

    fn at(dir: TempDir, path: PathBuf, create_if_missing: bool) -> Self {
        let config = Config {
            store: StoreConfig {
                path,
                create_if_missing,
            },
            ..Config::default()
        };
        Self { _dir: dir, config }
    }

    fn store(&self) -> DocumentStore {
        DocumentStore::open(&self.config.store)
    }
}

fn request(subject: &str, duration: Value, metric: &str) -> String {
    json!({ "userId": subject, "timeDuration": duration, "dataType": metric }).to_string()
}

fn body(response: &tally::HttpResponse) -> Value {
    serde_json::from_str(&response.body).unwrap()
}

#[test]
fn test_single_subject_summary() {
    let fixture = Fixture::seeded(json!({
        "raz": [
            document("raz", NOW - 100, 20.0),
            document("raz", NOW - 50, 22.0),
            document("raz", NOW - 3000, 18.0),
            document("raz", NOW - 7000, 99.0)
        ]
    }));
    let store = fixture.store();
    let handler = Handler::new(&fixture.config, &store).unwrap();

    let response = handler.average(Some(&request("raz", json!("6000"), "temp")), NOW);
    assert_eq!(response.status, Status::Ok);

    let payload = body(&response);
    assert_eq!(payload["dataType"], "temp");
    assert_eq!(payload["numDataPoints"].as_u64(), Some(3));
    assert_eq!(payload["averageData"].as_f64(), Some(20.0));
    assert_eq!(payload["minData"].as_f64(), Some(18.0));
    assert_eq!(payload["maxData"].as_f64(), Some(22.0));
    assert_eq!(payload["rateDataCollect"].as_f64(), Some(0.0005));
    assert_eq!(
        payload["timeRange"],
        "4/14/2025, 11:40:05 AM - 4/14/2025, 1:20:05 PM"
    );
}

#[test]
fn test_composite_subject_merges_collections() {
    let fixture = Fixture::seeded(json!({
        "raz": [document("raz", NOW - 10, 19.0), document("raz", NOW - 20, 21.0)],
        "taz": [
            document("taz", NOW - 30, 20.0),
            document("taz", NOW - 40, 22.0),
            document("taz", NOW - 50, 24.0)
        ]
    }));
    let store = fixture.store();
    let handler = Handler::new(&fixture.config, &store).unwrap();

    let response = handler.average(Some(&request("all", json!(600), "temp")), NOW);
    assert_eq!(response.status, Status::Ok);

    let payload = body(&response);
    assert_eq!(payload["numDataPoints"].as_u64(), Some(5));
    assert_eq!(payload["averageData"].as_f64(), Some(21.2));
    assert_eq!(payload["minData"].as_f64(), Some(19.0));
    assert_eq!(payload["maxData"].as_f64(), Some(24.0));
}

#[test]
fn test_no_matching_documents() {
    let fixture = Fixture::seeded(json!({ "raz": [document("raz", NOW - 5_000, 20.0)] }));
    let store = fixture.store();
    let handler = Handler::new(&fixture.config, &store).unwrap();

    let response = handler.average(Some(&request("raz", json!(60), "temp")), NOW);
    assert_eq!(response.status, Status::NoContent);
    assert_eq!(response.body, "No matching documents");

    // Known subject without a collection
    let response = handler.average(Some(&request("taz", json!(60), "temp")), NOW);
    assert_eq!(response.status, Status::NoContent);
}

#[test]
fn test_request_errors() {
    let fixture = Fixture::seeded(json!({ "raz": [document("raz", NOW - 5, 20.0)] }));
    let store = fixture.store();
    let handler = Handler::new(&fixture.config, &store).unwrap();

    let response = handler.average(Some(&request("raz", json!(60), "pressure")), NOW);
    assert_eq!(response.status, Status::BadRequest);
    assert_eq!(body(&response)["error"], "UnsupportedMetric");

    let response = handler.average(Some(&request("raz", json!(0), "temp")), NOW);
    assert_eq!(response.status, Status::BadRequest);
    assert_eq!(body(&response)["error"], "InvalidDuration");

    let response = handler.average(Some(&request("tester", json!(60), "temp")), NOW);
    assert_eq!(response.status, Status::NotFound);
    assert_eq!(body(&response)["error"], "UnknownSubject");

    let response = handler.average(Some(r#"{"userId":"raz","dataType":"temp"}"#), NOW);
    assert_eq!(response.status, Status::BadRequest);
    assert_eq!(body(&response)["error"], "MalformedRequest");

    let response = handler.average(None, NOW);
    assert_eq!(response.status, Status::BadRequest);
}

#[test]
fn test_missing_store_is_bad_gateway() {
    let dir = TempDir::new().unwrap();
    let missing = PathBuf::from("/nonexistent/tally/store.json");
    let fixture = Fixture::at(dir, missing, false);
    let store = fixture.store();
    let handler = Handler::new(&fixture.config, &store).unwrap();

    let response = handler.average(Some(&request("raz", json!(60), "temp")), NOW);
    assert_eq!(response.status, Status::BadGateway);
    assert_eq!(body(&response)["error"], "StoreUnavailable");

    // Validation still runs before the store is touched
    let response = handler.average(Some(&request("raz", json!(-5), "temp")), NOW);
    assert_eq!(response.status, Status::BadRequest);
}

#[test]
fn test_document_without_capture_time_is_left_out() {
    let fixture = Fixture::seeded(json!({
        "raz": [
            document("raz", NOW - 5, 20.0),
            { "shtDetails": { "temp": 80.0 }, "otherDetails": { "userId": "raz" } }
        ]
    }));
    let store = fixture.store();
    let handler = Handler::new(&fixture.config, &store).unwrap();

    let response = handler.average(Some(&request("raz", json!(60), "temp")), NOW);
    assert_eq!(response.status, Status::Ok);

    let payload = body(&response);
    assert_eq!(payload["numDataPoints"].as_u64(), Some(1));
    assert_eq!(payload["averageData"].as_f64(), Some(20.0));
}

#[test]
fn test_corrupt_store_is_bad_gateway() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    fs::write(&path, "{ \"users\": [").unwrap();
    let fixture = Fixture::at(dir, path, false);
    let store = fixture.store();
    let handler = Handler::new(&fixture.config, &store).unwrap();

    let response = handler.average(Some(&request("raz", json!(60), "temp")), NOW);
    assert_eq!(response.status, Status::BadGateway);
    assert_eq!(body(&response)["error"], "StoreQueryError");
}

#[test]
fn test_fractional_duration() {
    let fixture = Fixture::seeded(json!({
        "raz": [document("raz", NOW - 1, 20.0), document("raz", NOW - 2, 30.0)]
    }));
    let store = fixture.store();
    let handler = Handler::new(&fixture.config, &store).unwrap();

    let response = handler.average(Some(&request("raz", json!(1.5), "temp")), NOW);
    assert_eq!(response.status, Status::Ok);

    let payload = body(&response);
    assert_eq!(payload["numDataPoints"].as_u64(), Some(1));
    assert_eq!(payload["averageData"].as_f64(), Some(20.0));
    assert_eq!(payload["rateDataCollect"].as_f64(), Some(1.0 / 1.5));

    let response = handler.average(Some(&request("raz", json!("1.5"), "temp")), NOW);
    assert_eq!(response.status, Status::Ok);
}

#[test]
fn test_time_range_follows_pacific_daylight_time() {
    let fixture = Fixture::seeded(json!({ "raz": [document("raz", NOW - 1, 20.0)] }));
    let store = fixture.store();
    let handler = Handler::new(&fixture.config, &store).unwrap();

    let response = handler.average(Some(&request("raz", json!(60), "temp")), NOW);
    assert_eq!(
        body(&response)["timeRange"],
        "4/14/2025, 1:19:05 PM - 4/14/2025, 1:20:05 PM"
    );
}

#[test]
fn test_upload_then_average() {
    let fixture = Fixture::empty();

    {
        let store = fixture.store();
        let handler = Handler::new(&fixture.config, &store).unwrap();

        for (ts, temp) in [(NOW - 30, 10.0), (NOW - 20, 20.0)] {
            let response = handler.upload(Some(&document("taz", ts, temp).to_string()));
            assert_eq!(response.status, Status::Ok);
            assert_eq!(body(&response)["userId"], "taz");
        }

        let response = handler.upload(Some(&document("all", NOW, 1.0).to_string()));
        assert_eq!(response.status, Status::NotFound);

        let response = handler.upload(Some("not json"));
        assert_eq!(response.status, Status::BadRequest);

        drop(handler);
        store.close().unwrap();
    }

    let store = fixture.store();
    let handler = Handler::new(&fixture.config, &store).unwrap();
    let response = handler.average(Some(&request("all", json!(60), "als")), NOW);
    assert_eq!(response.status, Status::Ok);

    let payload = body(&response);
    assert_eq!(payload["dataType"], "als");
    assert_eq!(payload["numDataPoints"].as_u64(), Some(2));
    assert_eq!(payload["averageData"].as_f64(), Some(150.0));
}
