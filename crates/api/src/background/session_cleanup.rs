//! Periodic purge of expired and revoked sessions.
//!
//! Spawns a background task that deletes session rows whose expiry has
//! passed or whose revoked flag is set. The first sweep runs immediately
//! on startup, then on a fixed interval. A failed sweep is logged and the
//! loop carries on; nothing here ever propagates into request handling.

use std::time::Duration;

use chrono::Utc;
use keygate_db::store::AuthStore;
use tokio_util::sync::CancellationToken;

/// Run the session cleanup loop.
///
/// Sweeps once right away, then every `interval`, until `cancel` is
/// triggered. A sweep in progress is not interrupted by cancellation; the
/// token is only checked between ticks.
pub async fn run<S: AuthStore>(store: S, interval: Duration, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        "Session cleanup job started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session cleanup job stopping");
                break;
            }
            _ = ticker.tick() => {
                match sweep_once(&store).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "Session cleanup: purged sessions");
                        } else {
                            tracing::debug!("Session cleanup: nothing to purge");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Session cleanup: sweep failed");
                    }
                }
            }
        }
    }
}

/// Perform one cleanup sweep synchronously.
///
/// Deletes every session that is expired as of now or revoked, in a
/// single transaction, and returns the number of deleted rows. Also the
/// manual trigger for operational tooling.
pub async fn sweep_once<S: AuthStore>(store: &S) -> Result<u64, sqlx::Error> {
    let mut tx = store.begin().await?;
    match store.delete_expired_or_revoked(&mut tx, Utc::now()).await {
        Ok(deleted) => {
            store.commit(tx).await?;
            Ok(deleted)
        }
        Err(err) => {
            let _ = store.rollback(tx).await;
            Err(err)
        }
    }
}
