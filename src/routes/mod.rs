use axum::Router;
use sqlx::PgPool;

mod health;
mod readings;
mod users;

// ---

pub fn router(pool: PgPool) -> Router {
    // ---
    Router::new()
        .merge(readings::router())
        .merge(users::router())
        .merge(health::router())
        .with_state(pool)
}
