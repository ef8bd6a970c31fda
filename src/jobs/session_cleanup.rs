// ==================== SESSION CLEANUP ====================
// Remove sessões cuja janela de inatividade expirou. O middleware de auth já
// rejeita essas sessões; o job só evita que a collection cresça sem limite.

use crate::{database::MongoDB, services::session_service};
use tokio::time::{interval, Duration};

pub const CLEANUP_INTERVAL_SECS: u64 = 15 * 60;

/// Inicia o loop de limpeza. O primeiro tick dispara imediatamente, então
/// sessões antigas de antes de um restart são removidas na inicialização.
pub fn start_session_cleanup(db: MongoDB) {
    log::info!(
        "🧹 Starting session cleanup job (every {} min)",
        CLEANUP_INTERVAL_SECS / 60
    );

    tokio::spawn(async move {
        let mut interval = interval(Duration::from_secs(CLEANUP_INTERVAL_SECS));

        loop {
            interval.tick().await;

            match session_service::purge_expired(&db).await {
                Ok(0) => log::debug!("🧹 No expired sessions"),
                Ok(count) => log::info!("🧹 Purged {} expired session(s)", count),
                Err(e) => log::error!("❌ Session cleanup failed: {}", e),
            }
        }
    });
}
