// src/ws/handler.rs

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use uuid::Uuid;

use crate::config::AppState;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::rbac::{RequireSection, SecFichaje};
use crate::ws::hub::FichajeHub;

/// Painel ao vivo do fichaje. A sessão já foi validada pelo gate; o
/// restaurante da conexão é o restaurante ativo da sessão.
#[utoipa::path(
    get,
    path = "/api/fichaje/ws",
    tag = "Fichaje",
    responses(
        (status = 101, description = "Conexão WebSocket aberta"),
        (status = 401, description = "Sessão inválida"),
        (status = 403, description = "Sem acesso à seção fichaje")
    )
)]
pub async fn fichaje_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    _guard: RequireSection<SecFichaje>,
) -> impl IntoResponse {
    let hub = state.fichaje_hub.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, hub, ctx.restaurant_id, ctx.user_id))
}

async fn handle_socket(socket: WebSocket, hub: Arc<FichajeHub>, restaurant_id: i32, user_id: i32) {
    let conn_id = Uuid::new_v4();
    tracing::info!(%conn_id, restaurant_id, user_id, "WebSocket de fichaje conectado");

    let mut rx = hub.add(conn_id, restaurant_id, user_id).await;
    let (mut sink, mut stream) = socket.split();

    // Canal do hub -> socket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                break;
            }
        }
    });

    // O cliente não manda nada útil; só esperamos o fechamento
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "Erro de leitura no WebSocket");
                break;
            }
        }
    }

    hub.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(%conn_id, "WebSocket de fichaje desconectado");
}
