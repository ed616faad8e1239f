// src/background/fichaje_cutoff.rs
//
// Varredura periódica das entradas de fichaje esquecidas abertas de um dia
// para o outro.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::services::fichaje_service::FichajeService;

/// Roda até `cancel` disparar. A primeira passada é imediata.
pub async fn run(service: FichajeService, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Varredura de fichaje iniciada");

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Varredura de fichaje encerrada");
                break;
            }
            _ = interval.tick() => {
                match service.close_stale_entries().await {
                    Ok(0) => tracing::debug!("Varredura de fichaje: nada a fechar"),
                    Ok(closed) => tracing::info!(closed, "Varredura de fichaje: entradas fechadas"),
                    Err(e) => tracing::error!(error = %e, "Varredura de fichaje falhou"),
                }
            }
        }
    }
}
