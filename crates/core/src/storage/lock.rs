use anyhow::Context;

// Advisory locks are scoped to the Postgres session, so acquire and release must run on the same
// connection. This is a best-effort guard against two importers writing the catalog at once.
const CATALOG_IMPORT_LOCK: i64 = 0x5052_4943_4553; // "PRICES"

pub async fn try_acquire_catalog_lock(conn: &mut sqlx::PgConnection) -> anyhow::Result<bool> {
    let acquired: (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
        .persistent(false)
        .bind(CATALOG_IMPORT_LOCK)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| {
            format!("failed to acquire advisory lock (key={CATALOG_IMPORT_LOCK})")
        })?;
    Ok(acquired.0)
}

pub async fn release_catalog_lock(conn: &mut sqlx::PgConnection) -> anyhow::Result<()> {
    sqlx::query("SELECT pg_advisory_unlock($1)")
        .persistent(false)
        .bind(CATALOG_IMPORT_LOCK)
        .execute(&mut *conn)
        .await
        .with_context(|| {
            format!("failed to release advisory lock (key={CATALOG_IMPORT_LOCK})")
        })?;
    Ok(())
}
