//! Database schema management for `vitalflow`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs`.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the `readings` table for ingested vitals and the `users` table
/// for signup-or-login identities. Safe to call on every startup; no-op if
/// the objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // One row per submitted measurement, derived columns written once at
    // creation time. The SERIAL id never appears on the wire.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS readings (
            id            SERIAL PRIMARY KEY,
            user_id       TEXT             NOT NULL,
            heart_rate    DOUBLE PRECISION NOT NULL,
            spo2          DOUBLE PRECISION NOT NULL,
            temp_c        DOUBLE PRECISION NOT NULL,
            temp_f        DOUBLE PRECISION NOT NULL,
            humidity      DOUBLE PRECISION NOT NULL,
            heat_index    DOUBLE PRECISION NOT NULL,
            status_report TEXT             NOT NULL,
            created_at    TIMESTAMPTZ      NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Identities created by `/users/signup-or-login`
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id         UUID        PRIMARY KEY,
            email      TEXT        NOT NULL,
            full_name  TEXT        NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Serves both the latest-reading lookup and the history listing
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_readings_user_id_created_at
            ON readings (user_id, created_at DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Uniqueness guard that keeps concurrent signups for one email from
    // producing two accounts
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS uq_users_email
            ON users (email);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
