//src/main.rs

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use reservas_backend::{
    background::fichaje_cutoff,
    config::{AppState, Config},
    router::build_router,
    ws::FichajeHub,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logger: RUST_LOG manda, "info" por padrão
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar
    let config = Config::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(config).await?;

    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Varredura de fichaje em segundo plano
    let cancel = CancellationToken::new();
    let sweep = tokio::spawn(fichaje_cutoff::run(
        app_state.fichaje_service.clone(),
        app_state.config.fichaje_sweep_interval,
        cancel.clone(),
    ));

    let hub = app_state.fichaje_hub.clone();
    let app = build_router(app_state);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone(), hub))
        .await?;

    // Espera a varredura terminar
    if let Err(e) = sweep.await {
        tracing::warn!(error = %e, "Varredura de fichaje terminou com erro");
    }

    tracing::info!("Servidor encerrado");
    Ok(())
}

// WebSockets abertos seguram o graceful shutdown: fechamos todos aqui
async fn shutdown_signal(cancel: CancellationToken, hub: Arc<FichajeHub>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Falha ao escutar o sinal de desligamento");
    }
    tracing::info!("Sinal de desligamento recebido");
    cancel.cancel();
    hub.shutdown_all().await;
}
