//! Wire and storage models for the vitals API.
//!
//! Field names on the wire are camelCase to match the mobile client; user
//! ids serialize as `_id` because that is the key the client already reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::alerts::Vitals;

// ---

/// Ingest payload for `POST /readings`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReading {
    // ---
    pub user_id: String,
    pub heart_rate: f64,
    pub spo2: f64,
    pub temp_c: f64,
    pub humidity: f64,
}

/// Stored reading as returned by the API, derived fields included.
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    // ---
    pub user_id: String,
    pub heart_rate: f64,
    pub spo2: f64,
    pub temp_c: f64,
    pub temp_f: f64,
    pub humidity: f64,
    pub heat_index: f64,
    pub status_report: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for `POST /users/signup-or-login`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    // ---
    pub email: String,
    pub full_name: String,
}

/// Stored user as returned by `GET /users`.
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    // ---
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

impl CreateReading {
    // ---
    /// Bundle the raw vitals for the alert engine.
    pub fn vitals(&self) -> Vitals {
        // ---
        Vitals {
            heart_rate: self.heart_rate,
            spo2: self.spo2,
            temp_c: self.temp_c,
            humidity: self.humidity,
        }
    }

    /// Reject non-finite numbers before they reach the engine or the store.
    ///
    /// JSON has no literal for `NaN` or `Infinity`, and serde_json reports
    /// out-of-range numbers such as `1e999` as parse errors, so a payload
    /// that survives deserialization is already finite. This check covers
    /// payloads constructed in code.
    pub fn validate(&self) -> Result<(), String> {
        // ---
        for (name, value) in [
            ("heartRate", self.heart_rate),
            ("spo2", self.spo2),
            ("tempC", self.temp_c),
            ("humidity", self.humidity),
        ] {
            if !value.is_finite() {
                return Err(format!("{name} must be a finite number"));
            }
        }
        Ok(())
    }
}
