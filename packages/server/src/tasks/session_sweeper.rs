//! Periodic garbage collection of session rows.
//!
//! Revocation only flips `is_valid`, and expiry is enforced at authentication
//! time, so dead rows pile up until this sweeper deletes them. Losing a sweep
//! is harmless; the next interval catches up.

use std::time::Duration;

use chrono::Utc;
use sea_orm::*;
use tracing::{debug, warn};

use crate::entity::session_token;

/// Run the sweep loop forever. Spawned as a background task at startup.
pub async fn run(db: DatabaseConnection, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(std::cmp::Ord::max(interval_secs, 1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        match sweep(&db).await {
            Ok(0) => {}
            Ok(removed) => debug!(removed, "Swept dead session rows"),
            Err(e) => warn!("Session sweep failed: {e}"),
        }
    }
}

/// Delete every session row that is expired or revoked. Returns the number of
/// rows removed.
pub async fn sweep(db: &DatabaseConnection) -> Result<u64, DbErr> {
    let result = session_token::Entity::delete_many()
        .filter(
            Condition::any()
                .add(session_token::Column::ExpiresAt.lt(Utc::now()))
                .add(session_token::Column::IsValid.eq(false)),
        )
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}
