use axum::{
    extract::Query,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{debug, error, info};

use crate::alerts;
use crate::{CreateReading, Reading};

// ---

/// Maximum number of rows returned by `GET /readings/all`.
const HISTORY_LIMIT: i64 = 100;

/// Column list shared by every query that returns full reading rows.
const READING_COLUMNS: &str =
    "user_id, heart_rate, spo2, temp_c, temp_f, humidity, heat_index, status_report, created_at";

pub fn router() -> Router<PgPool> {
    // ---
    Router::new()
        .route("/readings", post(create_reading))
        .route("/readings/latest", get(latest_reading))
        .route("/readings/all", get(reading_history))
}

/// Handle `POST /readings`.
///
/// Runs the alert engine over the submitted vitals, stores the enriched row
/// and echoes it back with `201 Created`. Derivation happens exactly once,
/// here; queries later return the stored values verbatim.
async fn create_reading(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateReading>,
) -> impl IntoResponse {
    // ---
    info!("POST /readings - user {}", payload.user_id);

    // Over HTTP the Json extractor already fails out-of-range numbers at
    // parse time; this guard covers payloads constructed in code.
    if let Err(reason) = payload.validate() {
        debug!("POST /readings - rejected: {}", reason);
        return (StatusCode::BAD_REQUEST, Json(reason)).into_response();
    }

    let derived = alerts::derive(&payload.vitals());
    if !derived.alerts.is_empty() {
        info!(
            "POST /readings - {} alert(s) for user {}: {}",
            derived.alerts.len(),
            payload.user_id,
            derived.status_report
        );
    }

    match insert_reading(&pool, &payload, &derived).await {
        Ok(reading) => (StatusCode::CREATED, Json(reading)).into_response(),
        Err(e) => {
            error!("Failed to store reading: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json("Failed to store reading"),
            )
                .into_response()
        }
    }
}

/// Query parameters for `GET /readings/latest`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestQuery {
    user_id: String,
}

/// JSON envelope for `GET /readings/latest`.
///
/// `data` is `null` with an explanatory message while the user has no
/// readings yet; the dashboard treats that as the empty state rather than
/// an error.
#[derive(Serialize)]
struct LatestResponse {
    success: bool,
    data: Option<Reading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

/// Handle `GET /readings/latest?userId=`.
async fn latest_reading(
    Query(params): Query<LatestQuery>,
    State(pool): State<PgPool>,
) -> impl IntoResponse {
    // ---
    debug!("GET /readings/latest - user {}", params.user_id);

    match fetch_latest(&pool, &params.user_id).await {
        Ok(Some(reading)) => (
            StatusCode::OK,
            Json(LatestResponse {
                success: true,
                data: Some(reading),
                message: None,
            }),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::OK,
            Json(LatestResponse {
                success: true,
                data: None,
                message: Some("no data yet"),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to fetch latest reading: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json("Failed to fetch latest reading"),
            )
                .into_response()
        }
    }
}

/// Query parameters for `GET /readings/all`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryQuery {
    user_id: Option<String>,
}

/// Handle `GET /readings/all?userId=`.
///
/// Newest first, capped at [`HISTORY_LIMIT`] rows.
async fn reading_history(
    Query(params): Query<HistoryQuery>,
    State(pool): State<PgPool>,
) -> impl IntoResponse {
    // ---
    // The mobile client sends the literal string "null" while no user is
    // selected; both that and an absent parameter mean an empty history,
    // not an error.
    let user_id = match params.user_id.as_deref() {
        None | Some("null") => {
            debug!("GET /readings/all - no user selected");
            return (StatusCode::OK, Json(Vec::<Reading>::new())).into_response();
        }
        Some(id) => id,
    };

    match fetch_history(&pool, user_id).await {
        Ok(readings) => {
            info!(
                "GET /readings/all - returning {} readings for user {}",
                readings.len(),
                user_id
            );
            (StatusCode::OK, Json(readings)).into_response()
        }
        Err(e) => {
            error!("Failed to fetch readings: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json("Failed to fetch readings"),
            )
                .into_response()
        }
    }
}

// ---

async fn insert_reading(
    pool: &PgPool,
    payload: &CreateReading,
    derived: &alerts::Derived,
) -> Result<Reading, sqlx::Error> {
    // ---
    let query = format!(
        "INSERT INTO readings \
         (user_id, heart_rate, spo2, temp_c, temp_f, humidity, heat_index, status_report) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {READING_COLUMNS}"
    );

    sqlx::query_as::<_, Reading>(&query)
        .bind(&payload.user_id)
        .bind(payload.heart_rate)
        .bind(payload.spo2)
        .bind(payload.temp_c)
        .bind(derived.temp_f)
        .bind(payload.humidity)
        .bind(derived.heat_index)
        .bind(&derived.status_report)
        .fetch_one(pool)
        .await
}

async fn fetch_latest(pool: &PgPool, user_id: &str) -> Result<Option<Reading>, sqlx::Error> {
    // ---
    let query = format!(
        "SELECT {READING_COLUMNS} FROM readings \
         WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1"
    );

    sqlx::query_as::<_, Reading>(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

async fn fetch_history(pool: &PgPool, user_id: &str) -> Result<Vec<Reading>, sqlx::Error> {
    // ---
    let query = format!(
        "SELECT {READING_COLUMNS} FROM readings \
         WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2"
    );

    sqlx::query_as::<_, Reading>(&query)
        .bind(user_id)
        .bind(HISTORY_LIMIT)
        .fetch_all(pool)
        .await
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::json;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    /// Lazily connecting pool; the routes under test here never run a query,
    /// so no database needs to be listening.
    fn test_pool() -> PgPool {
        // ---
        PgPoolOptions::new()
            .connect_lazy("postgres://postgres@127.0.0.1/vitalflow_test")
            .unwrap()
    }

    fn app() -> axum::Router {
        router().with_state(test_pool())
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        // ---
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_history_without_user_returns_empty_list() {
        // ---
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/readings/all")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_history_with_literal_null_user_returns_empty_list() {
        // ---
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/readings/all?userId=null")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_latest_requires_user_id() {
        // ---
        // Missing userId is rejected by the query extractor
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/readings/latest")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_rejects_incomplete_payload() {
        // ---
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/readings")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"userId":"user-42"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_create_rejects_out_of_range_number() {
        // ---
        // serde_json has no representation for 1e999, so the Json extractor
        // rejects the body at parse time. The rejection body is plain text,
        // not JSON; only the status is asserted here.
        let body = r#"{"userId":"user-42","heartRate":1e999,"spo2":97,"tempC":36.6,"humidity":45}"#;
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/readings")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_rejects_non_finite_vitals() {
        // ---
        // The extractor never parses a non-finite number; the guard in
        // create_reading is driven by calling the handler directly.
        let payload = CreateReading {
            user_id: "user-42".to_string(),
            heart_rate: f64::INFINITY,
            spo2: 97.0,
            temp_c: 36.6,
            humidity: 45.0,
        };

        let response = create_reading(State(test_pool()), Json(payload))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json.as_str().unwrap().contains("heartRate"));
    }
}
