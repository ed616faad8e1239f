// src/models/fichaje.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FichajeEntry {
    pub id: i32,
    #[schema(ignore)]
    pub restaurant_id: i32,
    pub member_id: i32,
    pub clock_in_at: DateTime<Utc>,
    pub clock_out_at: Option<DateTime<Utc>>,
    /// Fechado pela varredura de virada de dia, não pelo membro.
    pub auto_closed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FichajeEventKind {
    ClockIn,
    ClockOut,
    AutoClosed,
}

/// Evento empurrado pelo WebSocket para o painel de fichaje.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FichajeEvent {
    pub kind: FichajeEventKind,
    pub restaurant_id: i32,
    pub member_id: i32,
    pub entry_id: i32,
    pub at: DateTime<Utc>,
}

impl FichajeEvent {
    pub fn from_entry(kind: FichajeEventKind, entry: &FichajeEntry) -> Self {
        let at = match kind {
            FichajeEventKind::ClockIn => entry.clock_in_at,
            _ => entry.clock_out_at.unwrap_or(entry.clock_in_at),
        };
        Self {
            kind,
            restaurant_id: entry.restaurant_id,
            member_id: entry.member_id,
            entry_id: entry.id,
            at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ClockPayload {
    /// Admin pode fichar por outro membro; omitido = o próprio usuário.
    pub member_id: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EntriesQuery {
    #[schema(example = "2025-06-14")]
    pub date: NaiveDate,
}
