use std::time::Duration;

use crate::db::DbPool;

/// Spawn the hourly job that prunes expired session rows. Expiry itself is
/// enforced at verification time; this only keeps the table from growing.
pub fn spawn_session_sweeper(pool: DbPool) {
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600)); // 1 hour
        loop {
            interval.tick().await;
            let conn = match pool.get() {
                Ok(c) => c,
                Err(e) => {
                    log::error!("Session sweeper: failed to get DB connection: {}", e);
                    continue;
                }
            };
            match super::token::prune_expired(&conn) {
                Ok(0) => {}
                Ok(n) => log::info!("Session sweeper removed {} expired sessions", n),
                Err(e) => log::error!("Session sweep failed: {}", e),
            }
        }
    });
}
