use axum::{
    extract::Path,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::{SignupRequest, User};

// ---

/// Column list shared by every query that returns full user rows.
const USER_COLUMNS: &str = "id, email, full_name, created_at";

pub fn router() -> Router<PgPool> {
    // ---
    Router::new()
        .route("/users/signup-or-login", post(signup_or_login))
        .route("/users", get(list_users))
        .route("/users/{id}", delete(remove_user))
}

/// JSON envelope for `POST /users/signup-or-login`.
#[derive(Serialize)]
struct SignupResponse {
    // ---
    success: bool,
    message: &'static str,
    #[serde(rename = "_id")]
    id: Uuid,
    #[serde(rename = "fullName")]
    full_name: String,
}

/// Handle `POST /users/signup-or-login`.
///
/// One endpoint covers both cases: an unknown email creates an account
/// (`201`), a known one logs in (`200`). Either way the client gets the
/// canonical id to tag readings with.
async fn signup_or_login(
    State(pool): State<PgPool>,
    Json(payload): Json<SignupRequest>,
) -> impl IntoResponse {
    // ---
    info!("POST /users/signup-or-login - {}", payload.email);

    match upsert_user(&pool, &payload).await {
        Ok((user, created)) => {
            let (status, message) = if created {
                (StatusCode::CREATED, "account created")
            } else {
                (StatusCode::OK, "welcome back")
            };
            (
                status,
                Json(SignupResponse {
                    success: true,
                    message,
                    id: user.id,
                    full_name: user.full_name,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to sign up or log in {}: {}", payload.email, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json("Failed to sign up or log in"),
            )
                .into_response()
        }
    }
}

/// Handle `GET /users`.
async fn list_users(State(pool): State<PgPool>) -> impl IntoResponse {
    // ---
    match fetch_users(&pool).await {
        Ok(users) => {
            debug!("GET /users - returning {} users", users.len());
            (StatusCode::OK, Json(users)).into_response()
        }
        Err(e) => {
            error!("Failed to list users: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json("Failed to list users"),
            )
                .into_response()
        }
    }
}

/// JSON envelope for `DELETE /users/{id}`.
#[derive(Serialize)]
struct DeleteResponse {
    // ---
    success: bool,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Handle `DELETE /users/{id}`.
///
/// Always answers `200` with a `{success, message}` envelope; failures,
/// including a malformed id, are reported inside the body with the error
/// detail rather than through the HTTP status. Deleting an id that does
/// not exist still counts as success.
async fn remove_user(Path(id): Path<String>, State(pool): State<PgPool>) -> impl IntoResponse {
    // ---
    info!("DELETE /users/{}", id);

    let user_id = match id.parse::<Uuid>() {
        Ok(parsed) => parsed,
        Err(e) => {
            return Json(DeleteResponse {
                success: false,
                message: "Failed to delete user",
                error: Some(e.to_string()),
            })
            .into_response();
        }
    };

    match delete_user(&pool, user_id).await {
        Ok(removed) => {
            if !removed {
                debug!("DELETE /users/{} - no such user", user_id);
            }
            Json(DeleteResponse {
                success: true,
                message: "User deleted successfully",
                error: None,
            })
            .into_response()
        }
        Err(e) => {
            error!("Failed to delete user {}: {}", user_id, e);
            Json(DeleteResponse {
                success: false,
                message: "Failed to delete user",
                error: Some(e.to_string()),
            })
            .into_response()
        }
    }
}

// ---

/// Conditional insert keyed on the unique email index.
///
/// Returns the user row plus whether this call created it. A request that
/// loses the insert race falls through to the select and reads the winner's
/// row, so concurrent signups for one email converge on a single identity.
async fn upsert_user(pool: &PgPool, payload: &SignupRequest) -> Result<(User, bool), sqlx::Error> {
    // ---
    let insert = format!(
        "INSERT INTO users (id, email, full_name) VALUES ($1, $2, $3) \
         ON CONFLICT (email) DO NOTHING \
         RETURNING {USER_COLUMNS}"
    );

    let inserted = sqlx::query_as::<_, User>(&insert)
        .bind(Uuid::new_v4())
        .bind(&payload.email)
        .bind(&payload.full_name)
        .fetch_optional(pool)
        .await?;

    if let Some(user) = inserted {
        return Ok((user, true));
    }

    let select = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    let user = sqlx::query_as::<_, User>(&select)
        .bind(&payload.email)
        .fetch_one(pool)
        .await?;

    Ok((user, false))
}

async fn fetch_users(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    // ---
    let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");

    sqlx::query_as::<_, User>(&query).fetch_all(pool).await
}

async fn delete_user(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    // ---
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
