// src/ws/hub.rs

use std::collections::HashMap;

use axum::extract::ws::Message;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::models::fichaje::FichajeEvent;

pub type WsSender = mpsc::UnboundedSender<Message>;

/// Uma conexão do painel de fichaje.
pub struct HubConnection {
    pub restaurant_id: i32,
    pub user_id: i32,
    pub sender: WsSender,
    pub connected_at: DateTime<Utc>,
}

/// Conexões abertas, agrupadas pelo restaurante na hora do envio.
/// Eventos de fichaje são raros: canal sem limite, sem backpressure.
pub struct FichajeHub {
    connections: RwLock<HashMap<Uuid, HubConnection>>,
}

impl FichajeHub {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Registra a conexão e devolve o lado que alimenta o socket.
    pub async fn add(
        &self,
        conn_id: Uuid,
        restaurant_id: i32,
        user_id: i32,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = HubConnection {
            restaurant_id,
            user_id,
            sender: tx,
            connected_at: Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    pub async fn remove(&self, conn_id: &Uuid) {
        self.connections.write().await.remove(conn_id);
    }

    /// Envia o evento para as conexões do restaurante do evento. Canais já
    /// fechados são ignorados; a limpeza acontece no loop da conexão.
    pub async fn broadcast(&self, event: &FichajeEvent) -> usize {
        let payload = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Falha ao serializar evento de fichaje");
                return 0;
            }
        };

        let conns = self.connections.read().await;
        let mut count = 0;
        for conn in conns.values().filter(|c| c.restaurant_id == event.restaurant_id) {
            if conn.sender.send(Message::Text(payload.clone().into())).is_ok() {
                count += 1;
            }
        }
        count
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Fecha tudo no desligamento do servidor.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Conexões de fichaje encerradas");
    }
}

impl Default for FichajeHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fichaje::FichajeEventKind;

    fn event(restaurant_id: i32) -> FichajeEvent {
        FichajeEvent {
            kind: FichajeEventKind::ClockIn,
            restaurant_id,
            member_id: 3,
            entry_id: 10,
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn broadcast_only_reaches_the_same_restaurant() {
        let hub = FichajeHub::new();
        let mut a = hub.add(Uuid::new_v4(), 1, 100).await;
        let mut b = hub.add(Uuid::new_v4(), 2, 200).await;

        assert_eq!(hub.broadcast(&event(1)).await, 1);

        match a.try_recv() {
            Ok(Message::Text(text)) => {
                let parsed: FichajeEvent = serde_json::from_str(text.as_str()).unwrap();
                assert_eq!(parsed.kind, FichajeEventKind::ClockIn);
                assert_eq!(parsed.restaurant_id, 1);
            }
            other => panic!("esperava texto, veio {other:?}"),
        }
        assert!(b.try_recv().is_err());
    }

    #[tokio::test]
    async fn removed_and_closed_connections_are_skipped() {
        let hub = FichajeHub::new();
        let id = Uuid::new_v4();
        let rx = hub.add(id, 1, 100).await;
        drop(rx);
        assert_eq!(hub.broadcast(&event(1)).await, 0);

        hub.remove(&id).await;
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn shutdown_sends_close_and_clears() {
        let hub = FichajeHub::new();
        let mut rx = hub.add(Uuid::new_v4(), 1, 100).await;
        hub.shutdown_all().await;
        assert!(matches!(rx.try_recv(), Ok(Message::Close(None))));
        assert_eq!(hub.connection_count().await, 0);
    }
}
