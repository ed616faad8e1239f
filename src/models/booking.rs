// src/models/booking.rs

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::common::patch::Patch;

// ---
// 1. Reserva (linha da tabela `bookings`)
// ---
// Os nomes dos campos seguem o contrato que o SPA já consome (snake_case).
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Booking {
    pub id: i32,
    #[schema(ignore)]
    pub restaurant_id: i32,

    #[schema(example = "2025-06-14")]
    pub reservation_date: NaiveDate,
    #[schema(value_type = String, example = "14:30:00")]
    pub reservation_time: NaiveTime,
    #[schema(example = 4)]
    pub party_size: i32,

    #[schema(example = "Marta Soler")]
    pub customer_name: String,
    #[schema(example = "600111222")]
    pub contact_phone: String,
    #[schema(example = "34")]
    pub contact_phone_country_code: String,
    pub contact_email: String,

    pub table_number: Option<String>,
    pub commentary: Option<String>,
    pub baby_strollers: Option<i32>,
    pub high_chairs: Option<i32>,

    // Arrays paralelos serializados como texto JSON
    #[schema(example = r#"["Paella valenciana","Arroz negro"]"#)]
    pub arroz_type: Option<String>,
    #[schema(example = "[2,3]")]
    pub arroz_servings: Option<String>,

    pub special_menu: bool,
    pub menu_de_grupo_id: Option<i32>,
    #[schema(example = r#"[{"name":"bacalao","servings":4}]"#)]
    pub principales_json: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reserva já validada e pronta para gravar (saída do normalizador).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRecord {
    pub reservation_date: NaiveDate,
    pub reservation_time: NaiveTime,
    pub party_size: i32,
    pub customer_name: String,
    pub contact_phone: String,
    pub contact_phone_country_code: String,
    pub contact_email: String,
    pub table_number: Option<String>,
    pub commentary: Option<String>,
    pub baby_strollers: Option<i32>,
    pub high_chairs: Option<i32>,
    pub arroz_type: Option<String>,
    pub arroz_servings: Option<String>,
    pub special_menu: bool,
    pub menu_de_grupo_id: Option<i32>,
    pub principales_json: Option<String>,
}

/// Um principal escolhido para um menu de grupo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PrincipalSelection {
    #[schema(example = "bacalao")]
    pub name: String,
    #[schema(example = 4)]
    pub servings: i32,
}

// ---
// 2. Payloads
// ---

/// O front manda números às vezes como string ("4"). Aceitamos os dois.
fn de_flexible_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flexible {
        Int(i64),
        Text(String),
    }

    // Texto vazio = ausente; texto não numérico vira 0 e a validação decide
    Ok(match Option::<Flexible>::deserialize(deserializer)? {
        Some(Flexible::Int(n)) => Some(i32::try_from(n).unwrap_or(0)),
        Some(Flexible::Text(s)) if s.trim().is_empty() => None,
        Some(Flexible::Text(s)) => Some(s.trim().parse::<i32>().unwrap_or(0)),
        None => None,
    })
}

fn de_flexible_patch_i32<'de, D>(deserializer: D) -> Result<Patch<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match de_flexible_i32(deserializer)? {
        Some(n) => Patch::Value(n),
        None => Patch::Null,
    })
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateBookingPayload {
    #[schema(example = "2025-06-14")]
    pub reservation_date: String,
    #[schema(example = "14:30")]
    pub reservation_time: String,
    #[serde(deserialize_with = "de_flexible_i32")]
    #[schema(value_type = i32, example = 4)]
    pub party_size: Option<i32>,
    pub customer_name: String,
    #[schema(example = "600111222")]
    pub contact_phone: String,
    #[schema(example = "34")]
    pub contact_phone_country_code: Option<String>,
    pub contact_email: Option<String>,
    pub table_number: Option<String>,
    pub commentary: Option<String>,
    #[serde(deserialize_with = "de_flexible_i32")]
    pub baby_strollers: Option<i32>,
    #[serde(deserialize_with = "de_flexible_i32")]
    pub high_chairs: Option<i32>,
    pub arroz_type: Option<Vec<String>>,
    pub arroz_servings: Option<Vec<i32>>,
    pub special_menu: bool,
    #[serde(deserialize_with = "de_flexible_i32")]
    pub menu_de_grupo_id: Option<i32>,
    pub principales: Option<Vec<PrincipalSelection>>,
}

/// Patch do back-office: só os campos presentes sobrescrevem a reserva.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PatchBookingPayload {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub reservation_date: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub reservation_time: Patch<String>,
    #[serde(default)]
    #[serde(deserialize_with = "de_flexible_patch_i32")]
    #[schema(value_type = Option<i32>)]
    pub party_size: Patch<i32>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub customer_name: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub contact_phone: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub contact_phone_country_code: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub contact_email: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub table_number: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub commentary: Patch<String>,
    #[serde(default)]
    #[serde(deserialize_with = "de_flexible_patch_i32")]
    #[schema(value_type = Option<i32>)]
    pub baby_strollers: Patch<i32>,
    #[serde(default)]
    #[serde(deserialize_with = "de_flexible_patch_i32")]
    #[schema(value_type = Option<i32>)]
    pub high_chairs: Patch<i32>,
    #[serde(default)]
    #[schema(value_type = Option<Vec<String>>)]
    pub arroz_type: Patch<Vec<String>>,
    #[serde(default)]
    #[schema(value_type = Option<Vec<i32>>)]
    pub arroz_servings: Patch<Vec<i32>>,
    #[serde(default)]
    #[schema(value_type = Option<bool>)]
    pub special_menu: Patch<bool>,
    #[serde(default)]
    #[serde(deserialize_with = "de_flexible_patch_i32")]
    #[schema(value_type = Option<i32>)]
    pub menu_de_grupo_id: Patch<i32>,
    #[serde(default)]
    #[schema(value_type = Option<Vec<PrincipalSelection>>)]
    pub principales: Patch<Vec<PrincipalSelection>>,
}

impl PatchBookingPayload {
    pub fn touches_arroz(&self) -> bool {
        self.arroz_type.is_present() || self.arroz_servings.is_present()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListBookingsQuery {
    #[schema(example = "2025-06-14")]
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemindersPayload {
    #[schema(example = "2025-06-14")]
    pub date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_payload_accepts_numeric_strings() {
        let p: CreateBookingPayload = serde_json::from_str(
            r#"{"reservation_date":"2025-06-14","reservation_time":"14:30",
                "party_size":"6","customer_name":"Ana","contact_phone":"600111222",
                "high_chairs": 1}"#,
        )
        .unwrap();
        assert_eq!(p.party_size, Some(6));
        assert_eq!(p.high_chairs, Some(1));
        assert!(!p.special_menu);
        assert!(p.arroz_type.is_none());
    }

    #[test]
    fn patch_payload_tracks_touched_fields() {
        let p: PatchBookingPayload =
            serde_json::from_str(r#"{"commentary":"terraza","party_size":"3"}"#).unwrap();
        assert_eq!(p.commentary, Patch::Value("terraza".into()));
        assert_eq!(p.party_size, Patch::Value(3));
        assert!(p.table_number.is_absent());
        assert!(!p.touches_arroz());

        let p: PatchBookingPayload = serde_json::from_str(r#"{"arroz_type":null}"#).unwrap();
        assert!(p.touches_arroz());
    }
}
