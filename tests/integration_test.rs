//! End-to-end tests against a running service.
//!
//! These talk to a live `vitalflow` instance (plus its database) over HTTP,
//! so they are ignored by default. Start the service, then run:
//!
//! ```text
//! BASE_URL=http://localhost:8080 cargo test -- --ignored
//! ```

use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Reading {
    user_id: String,
    heart_rate: f64,
    spo2: f64,
    temp_c: f64,
    temp_f: f64,
    humidity: f64,
    heat_index: f64,
    status_report: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct LatestEnvelope {
    success: bool,
    data: Option<Reading>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SignupEnvelope {
    success: bool,
    message: String,
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "fullName")]
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct DeleteEnvelope {
    success: bool,
    message: String,
    error: Option<String>,
}

fn base_url() -> String {
    std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8080".into())
}

#[tokio::test]
#[ignore = "requires a running service and database"]
async fn ingest_and_query_round_trip() -> Result<()> {
    // ---
    let base = base_url();
    let client = Client::new();
    let user_id = format!("it-user-{}", Uuid::new_v4());

    // 1) Ingest a calm reading, then one that should trip every category
    let calm = json!({
        "userId": user_id,
        "heartRate": 70,
        "spo2": 98,
        "tempC": 25.0,
        "humidity": 40
    });
    let resp = client
        .post(format!("{}/readings", base))
        .json(&calm)
        .send()
        .await?;
    assert_eq!(resp.status(), 201, "ingest should answer 201 Created");

    let stored: Reading = resp.json().await?;
    assert_eq!(stored.user_id, user_id);
    assert_eq!(
        stored.status_report, "All vitals within normal range",
        "calm vitals should report the stable status"
    );

    let severe = json!({
        "userId": user_id,
        "heartRate": 125,
        "spo2": 90,
        "tempC": 39.5,
        "humidity": 60
    });
    let stored: Reading = client
        .post(format!("{}/readings", base))
        .json(&severe)
        .send()
        .await?
        .json()
        .await?;

    // Derived fields come back with the stored row
    assert!(
        (stored.temp_f - 103.1).abs() < 0.01,
        "39.5°C should be 103.1°F, got {:.2}",
        stored.temp_f
    );
    assert!(
        (stored.heat_index - 60.6).abs() < 0.05,
        "heat index for 39.5°C/60% should be ~60.6°C, got {:.1}",
        stored.heat_index
    );
    assert_eq!(
        stored.status_report.matches(" | ").count(),
        3,
        "all four alert categories should fire: {}",
        stored.status_report
    );

    // 2) Latest returns the most recent row inside the success envelope
    let latest: LatestEnvelope = client
        .get(format!("{}/readings/latest?userId={}", base, user_id))
        .send()
        .await?
        .json()
        .await?;
    assert!(latest.success);
    let data = latest.data.expect("latest should have data after ingest");
    assert_eq!(data.status_report, stored.status_report);

    // 3) History is newest first and echoes the stored derivations
    let history: Vec<Reading> = client
        .get(format!("{}/readings/all?userId={}", base, user_id))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(history.len(), 2, "two readings were ingested");
    assert!(
        history[0].created_at >= history[1].created_at,
        "history should be newest first"
    );
    for r in &history {
        let expected_f = r.temp_c * 9.0 / 5.0 + 32.0;
        assert!(
            (r.temp_f - expected_f).abs() < 0.01,
            "stored temp_f should match the conversion: {}°C vs {:.2}°F",
            r.temp_c,
            r.temp_f
        );
        assert!(r.spo2 > 0.0 && r.heart_rate > 0.0 && r.humidity > 0.0);
    }

    // 4) An unselected user means an empty history, not an error
    let none: Vec<Reading> = client
        .get(format!("{}/readings/all?userId=null", base))
        .send()
        .await?
        .json()
        .await?;
    assert!(none.is_empty(), "literal \"null\" user should see no history");

    // 5) A user with no readings gets the empty-state envelope
    let empty: LatestEnvelope = client
        .get(format!("{}/readings/latest?userId=never-seen-{}", base, Uuid::new_v4()))
        .send()
        .await?
        .json()
        .await?;
    assert!(empty.success);
    assert!(empty.data.is_none());
    assert_eq!(empty.message.as_deref(), Some("no data yet"));

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running service and database"]
async fn signup_or_login_converges_on_one_identity() -> Result<()> {
    // ---
    let base = base_url();
    let client = Client::new();
    let email = format!("it-{}@example.com", Uuid::new_v4());
    let body = json!({ "email": email, "fullName": "Integration Tester" });

    // First call creates the account
    let resp = client
        .post(format!("{}/users/signup-or-login", base))
        .json(&body)
        .send()
        .await?;
    assert_eq!(resp.status(), 201, "first signup should answer 201");
    let created: SignupEnvelope = resp.json().await?;
    assert!(created.success);
    assert_eq!(created.message, "account created");
    assert_eq!(created.full_name, "Integration Tester");

    // Second call logs in and returns the same id
    let resp = client
        .post(format!("{}/users/signup-or-login", base))
        .json(&body)
        .send()
        .await?;
    assert_eq!(resp.status(), 200, "second signup should answer 200");
    let existing: SignupEnvelope = resp.json().await?;
    assert_eq!(existing.message, "welcome back");
    assert_eq!(
        existing.id, created.id,
        "repeat signup must not mint a new identity"
    );

    // The account shows up in the listing
    let users: Vec<serde_json::Value> = client
        .get(format!("{}/users", base))
        .send()
        .await?
        .json()
        .await?;
    assert!(
        users.iter().any(|u| u["email"] == email.as_str()),
        "new account should be listed"
    );

    // Deletion always answers 200 with the outcome in the body
    let deleted: DeleteEnvelope = client
        .delete(format!("{}/users/{}", base, created.id))
        .send()
        .await?
        .json()
        .await?;
    assert!(deleted.success, "delete failed: {:?}", deleted.error);
    assert_eq!(deleted.message, "User deleted successfully");

    // A malformed id is a body-level failure, still HTTP 200
    let resp = client
        .delete(format!("{}/users/not-a-uuid", base))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);
    let failed: DeleteEnvelope = resp.json().await?;
    assert!(!failed.success);
    assert!(failed.error.is_some());

    Ok(())
}
