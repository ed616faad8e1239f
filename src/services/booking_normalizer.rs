// src/services/booking_normalizer.rs

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::common::error::AppError;
use crate::common::patch::Patch;
use crate::common::phone::normalize_phone;
use crate::common::service_time::parse_time;
use crate::db::{GroupMenuRepository, SettingsRepository};
use crate::models::booking::{
    Booking, BookingRecord, CreateBookingPayload, PatchBookingPayload, PrincipalSelection,
};
use crate::models::group_menu::GroupMenu;

pub const MSG_INVALID_DATE: &str = "Fecha inválida";
pub const MSG_INVALID_PARTY_SIZE: &str = "El número de personas debe ser mayor que 0";
pub const MSG_INVALID_TIME: &str = "Hora inválida";
pub const MSG_NAME_REQUIRED: &str = "El nombre es obligatorio";
pub const MSG_INVALID_PHONE: &str = "Teléfono inválido";
pub const MSG_INVALID_GROUP_MENU: &str = "Menú de grupo inválido o inactivo";
pub const MSG_ARROZ_EXCEEDS: &str = "Las raciones de arroz superan el número de personas";
pub const MSG_PRINCIPALES_EXCEED: &str = "Los principales superan el número de personas";

// ---
// 1. Entrada do normalizador
// ---

/// Seleção de arroz em arrays paralelos. `touched` separa "não mexeu" de
/// "limpou".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrozInput {
    pub touched: bool,
    pub types: Vec<String>,
    pub servings: Vec<i32>,
}

/// Forma única que alimenta o pipeline, venha de um POST ou de um patch
/// aplicado sobre a reserva gravada.
#[derive(Debug, Clone, Default)]
pub struct BookingInput {
    pub reservation_date: String,
    pub reservation_time: String,
    pub party_size: Option<i32>,
    pub customer_name: String,
    pub contact_phone: String,
    pub contact_phone_country_code: Option<String>,
    pub contact_email: Option<String>,
    pub table_number: Option<String>,
    pub commentary: Option<String>,
    pub baby_strollers: Option<i32>,
    pub high_chairs: Option<i32>,
    pub arroz: ArrozInput,
    pub special_menu: bool,
    pub menu_de_grupo_id: Option<i32>,
    pub principales: Vec<PrincipalSelection>,
}

impl From<CreateBookingPayload> for BookingInput {
    fn from(p: CreateBookingPayload) -> Self {
        let touched = p.arroz_type.is_some() || p.arroz_servings.is_some();
        Self {
            reservation_date: p.reservation_date,
            reservation_time: p.reservation_time,
            party_size: p.party_size,
            customer_name: p.customer_name,
            contact_phone: p.contact_phone,
            contact_phone_country_code: p.contact_phone_country_code,
            contact_email: p.contact_email,
            table_number: p.table_number,
            commentary: p.commentary,
            baby_strollers: p.baby_strollers,
            high_chairs: p.high_chairs,
            arroz: ArrozInput {
                touched,
                types: p.arroz_type.unwrap_or_default(),
                servings: p.arroz_servings.unwrap_or_default(),
            },
            special_menu: p.special_menu,
            menu_de_grupo_id: p.menu_de_grupo_id,
            principales: p.principales.unwrap_or_default(),
        }
    }
}

impl BookingInput {
    /// Projeta a reserva gravada de volta na forma de entrada.
    pub fn from_record(record: &BookingRecord) -> Self {
        let types: Vec<String> = record
            .arroz_type
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();
        let servings: Vec<i32> = record
            .arroz_servings
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();
        let principales: Vec<PrincipalSelection> = record
            .principales_json
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();

        Self {
            reservation_date: record.reservation_date.format("%Y-%m-%d").to_string(),
            reservation_time: record.reservation_time.format("%H:%M:%S").to_string(),
            party_size: Some(record.party_size),
            customer_name: record.customer_name.clone(),
            contact_phone: record.contact_phone.clone(),
            contact_phone_country_code: Some(record.contact_phone_country_code.clone()),
            contact_email: Some(record.contact_email.clone()),
            table_number: record.table_number.clone(),
            commentary: record.commentary.clone(),
            baby_strollers: record.baby_strollers,
            high_chairs: record.high_chairs,
            arroz: ArrozInput {
                touched: record.arroz_type.is_some() || record.arroz_servings.is_some(),
                types,
                servings,
            },
            special_menu: record.special_menu,
            menu_de_grupo_id: record.menu_de_grupo_id,
            principales,
        }
    }

    /// Sobrepõe só os campos presentes no patch.
    pub fn overlay(mut self, patch: PatchBookingPayload) -> Self {
        let touches_arroz = patch.touches_arroz();

        self.reservation_date = patch.reservation_date.apply_required(self.reservation_date);
        self.reservation_time = patch.reservation_time.apply_required(self.reservation_time);
        self.party_size = patch.party_size.apply_to(self.party_size);
        self.customer_name = patch.customer_name.apply_required(self.customer_name);
        self.contact_phone = patch.contact_phone.apply_required(self.contact_phone);
        self.contact_phone_country_code = patch
            .contact_phone_country_code
            .apply_to(self.contact_phone_country_code);
        self.contact_email = patch.contact_email.apply_to(self.contact_email);
        self.table_number = patch.table_number.apply_to(self.table_number);
        self.commentary = patch.commentary.apply_to(self.commentary);
        self.baby_strollers = patch.baby_strollers.apply_to(self.baby_strollers);
        self.high_chairs = patch.high_chairs.apply_to(self.high_chairs);
        self.special_menu = patch.special_menu.apply_required(self.special_menu);
        self.menu_de_grupo_id = patch.menu_de_grupo_id.apply_to(self.menu_de_grupo_id);

        match patch.principales {
            Patch::Absent => {}
            Patch::Null => self.principales.clear(),
            Patch::Value(rows) => self.principales = rows,
        }

        // Arroz não tocado fica fora do pipeline; a regra de preservação
        // decide depois o que gravar.
        self.arroz.touched = touches_arroz;
        if touches_arroz {
            self.arroz.types = patch.arroz_type.apply_to(Some(self.arroz.types)).unwrap_or_default();
            self.arroz.servings = patch
                .arroz_servings
                .apply_to(Some(self.arroz.servings))
                .unwrap_or_default();
        }

        self
    }
}

impl From<&Booking> for BookingRecord {
    fn from(b: &Booking) -> Self {
        Self {
            reservation_date: b.reservation_date,
            reservation_time: b.reservation_time,
            party_size: b.party_size,
            customer_name: b.customer_name.clone(),
            contact_phone: b.contact_phone.clone(),
            contact_phone_country_code: b.contact_phone_country_code.clone(),
            contact_email: b.contact_email.clone(),
            table_number: b.table_number.clone(),
            commentary: b.commentary.clone(),
            baby_strollers: b.baby_strollers,
            high_chairs: b.high_chairs,
            arroz_type: b.arroz_type.clone(),
            arroz_servings: b.arroz_servings.clone(),
            special_menu: b.special_menu,
            menu_de_grupo_id: b.menu_de_grupo_id,
            principales_json: b.principales_json.clone(),
        }
    }
}

// ---
// 2. Colaboradores externos
// ---

#[async_trait]
pub trait BookingLookups: Send + Sync {
    async fn fallback_email(&self, restaurant_id: i32) -> Result<Option<String>, AppError>;

    async fn active_group_menu(
        &self,
        restaurant_id: i32,
        menu_id: i32,
    ) -> Result<Option<GroupMenu>, AppError>;
}

pub struct PgBookingLookups {
    settings: SettingsRepository,
    menus: GroupMenuRepository,
}

impl PgBookingLookups {
    pub fn new(settings: SettingsRepository, menus: GroupMenuRepository) -> Self {
        Self { settings, menus }
    }
}

#[async_trait]
impl BookingLookups for PgBookingLookups {
    async fn fallback_email(&self, restaurant_id: i32) -> Result<Option<String>, AppError> {
        self.settings.fallback_email(restaurant_id).await
    }

    async fn active_group_menu(
        &self,
        restaurant_id: i32,
        menu_id: i32,
    ) -> Result<Option<GroupMenu>, AppError> {
        self.menus.find_active(restaurant_id, menu_id).await
    }
}

// ---
// 3. Pipeline
// ---

#[derive(Clone)]
pub struct BookingNormalizer {
    lookups: Arc<dyn BookingLookups>,
}

impl BookingNormalizer {
    pub fn new(lookups: Arc<dyn BookingLookups>) -> Self {
        Self { lookups }
    }

    pub async fn normalize(
        &self,
        restaurant_id: i32,
        input: BookingInput,
    ) -> Result<BookingRecord, AppError> {
        // 1. Data
        let reservation_date = NaiveDate::parse_from_str(input.reservation_date.trim(), "%Y-%m-%d")
            .map_err(|_| AppError::validation(MSG_INVALID_DATE))?;

        // 2. Pessoas
        let party_size = match input.party_size {
            Some(n) if n > 0 => n,
            _ => return Err(AppError::validation(MSG_INVALID_PARTY_SIZE)),
        };

        // 3. Hora
        let reservation_time =
            parse_time(&input.reservation_time).ok_or_else(|| AppError::validation(MSG_INVALID_TIME))?;

        // 4. Nome
        let customer_name = input.customer_name.trim().to_string();
        if customer_name.is_empty() {
            return Err(AppError::validation(MSG_NAME_REQUIRED));
        }

        // 5. Telefone
        let phone = normalize_phone(
            input.contact_phone_country_code.as_deref().unwrap_or_default(),
            &input.contact_phone,
        );
        if !phone.valid {
            return Err(AppError::validation(MSG_INVALID_PHONE));
        }

        // 6. E-mail (cai no e-mail do restaurante)
        let contact_email = match non_blank(input.contact_email) {
            Some(email) => email,
            None => self
                .lookups
                .fallback_email(restaurant_id)
                .await?
                .unwrap_or_default(),
        };

        let mut record = BookingRecord {
            reservation_date,
            reservation_time,
            party_size,
            customer_name,
            contact_phone: phone.national,
            contact_phone_country_code: phone.country_code,
            contact_email,
            table_number: non_blank(input.table_number),
            commentary: non_blank(input.commentary),
            baby_strollers: input.baby_strollers.filter(|n| *n >= 0),
            high_chairs: input.high_chairs.filter(|n| *n >= 0),
            arroz_type: None,
            arroz_servings: None,
            special_menu: input.special_menu,
            menu_de_grupo_id: None,
            principales_json: None,
        };

        // 7. Menu de grupo ou arroz livre
        if input.special_menu {
            let menu = match input.menu_de_grupo_id {
                Some(id) if id > 0 => self.lookups.active_group_menu(restaurant_id, id).await?,
                _ => None,
            }
            .ok_or_else(|| AppError::validation(MSG_INVALID_GROUP_MENU))?;

            record.menu_de_grupo_id = Some(menu.id);
            record.arroz_type = Some(to_json(&[menu.title.as_str()])?);
            record.arroz_servings = Some(to_json(&[party_size])?);

            // 8. Principais
            let principales = reconcile_principales(&menu.principales.items, input.principales, party_size)?;
            record.commentary = principales.summary;
            record.principales_json = principales.json;
        } else if input.arroz.touched {
            let arroz = normalize_arroz(input.arroz.types, input.arroz.servings);
            if servings_total(arroz.iter().map(|(_, s)| *s)) > i64::from(party_size) {
                return Err(AppError::validation(MSG_ARROZ_EXCEEDS));
            }
            if !arroz.is_empty() {
                let (types, servings): (Vec<String>, Vec<i32>) = arroz.into_iter().unzip();
                record.arroz_type = Some(to_json(&types)?);
                record.arroz_servings = Some(to_json(&servings)?);
            }
        }

        Ok(record)
    }

    /// Patch: reserva atual + campos presentes, e o pipeline inteiro de novo.
    pub async fn normalize_patch(
        &self,
        restaurant_id: i32,
        current: &BookingRecord,
        patch: PatchBookingPayload,
    ) -> Result<BookingRecord, AppError> {
        let touches_arroz = patch.touches_arroz();
        let stored_servings = BookingInput::from_record(current).arroz.servings;
        let input = BookingInput::from_record(current).overlay(patch);

        let mut record = self.normalize(restaurant_id, input).await?;

        // Fora de menu de grupo (antes e depois) e sem tocar no arroz: o JSON
        // gravado volta byte a byte, mas ainda cabe no novo número de pessoas.
        if !record.special_menu && !current.special_menu && !touches_arroz {
            if servings_total(stored_servings) > i64::from(record.party_size) {
                return Err(AppError::validation(MSG_ARROZ_EXCEEDS));
            }
            record.arroz_type = current.arroz_type.clone();
            record.arroz_servings = current.arroz_servings.clone();
        }

        Ok(record)
    }
}

// ---
// 4. Regras puras
// ---

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value).map_err(|e| AppError::InternalServerError(e.into()))
}

/// Soma em i64: rações absurdas não podem dar a volta e passar no limite.
fn servings_total(servings: impl IntoIterator<Item = i32>) -> i64 {
    servings.into_iter().map(i64::from).sum()
}

/// Junta os arrays paralelos, descarta tipo vazio ou ração <= 0 e só então
/// remove tipos repetidos (vale o primeiro válido).
pub fn normalize_arroz(types: Vec<String>, servings: Vec<i32>) -> Vec<(String, i32)> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for (i, raw_type) in types.into_iter().enumerate() {
        let arroz_type = raw_type.trim().to_string();
        let count = servings.get(i).copied().unwrap_or(0);
        if arroz_type.is_empty() || count <= 0 {
            continue;
        }
        if seen.insert(arroz_type.clone()) {
            out.push((arroz_type, count));
        }
    }

    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledPrincipales {
    pub rows: Vec<PrincipalSelection>,
    /// "bacalao x 4, paella x 2"
    pub summary: Option<String>,
    /// JSON compacto das linhas mantidas.
    pub json: Option<String>,
}

pub fn reconcile_principales(
    allowed: &[String],
    requested: Vec<PrincipalSelection>,
    party_size: i32,
) -> Result<ReconciledPrincipales, AppError> {
    let allowed: HashSet<&str> = allowed
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    let mut seen = HashSet::new();

    let rows: Vec<PrincipalSelection> = requested
        .into_iter()
        .filter_map(|row| {
            let name = row.name.trim().to_string();
            if name.is_empty() || row.servings <= 0 {
                return None;
            }
            if !allowed.is_empty() && !allowed.contains(name.as_str()) {
                return None;
            }
            if !seen.insert(name.clone()) {
                return None;
            }
            Some(PrincipalSelection { name, servings: row.servings })
        })
        .collect();

    if servings_total(rows.iter().map(|r| r.servings)) > i64::from(party_size) {
        return Err(AppError::validation(MSG_PRINCIPALES_EXCEED));
    }

    if rows.is_empty() {
        return Ok(ReconciledPrincipales { rows, summary: None, json: None });
    }

    let summary = rows
        .iter()
        .map(|r| format!("{} x {}", r.name, r.servings))
        .collect::<Vec<_>>()
        .join(", ");
    let json = to_json(&rows)?;

    Ok(ReconciledPrincipales { rows, summary: Some(summary), json: Some(json) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use sqlx::types::Json;

    use crate::models::group_menu::GroupMenuPrincipales;

    const RESTAURANT: i32 = 7;

    struct FakeLookups {
        fallback: Option<String>,
        menus: Vec<GroupMenu>,
    }

    #[async_trait]
    impl BookingLookups for FakeLookups {
        async fn fallback_email(&self, _: i32) -> Result<Option<String>, AppError> {
            Ok(self.fallback.clone())
        }

        async fn active_group_menu(&self, restaurant_id: i32, id: i32) -> Result<Option<GroupMenu>, AppError> {
            Ok(self
                .menus
                .iter()
                .find(|m| m.id == id && m.restaurant_id == restaurant_id && m.active)
                .cloned())
        }
    }

    fn menu(id: i32, title: &str, active: bool, items: &[&str]) -> GroupMenu {
        GroupMenu {
            id,
            restaurant_id: RESTAURANT,
            title: title.into(),
            price: Decimal::new(3550, 2),
            active,
            principales: Json(GroupMenuPrincipales {
                items: items.iter().map(|s| s.to_string()).collect(),
            }),
            created_at: Utc::now(),
        }
    }

    fn normalizer() -> BookingNormalizer {
        BookingNormalizer::new(Arc::new(FakeLookups {
            fallback: Some("reservas@casapepa.es".into()),
            menus: vec![
                menu(3, "Menú Celebración", true, &["bacalao", "paella", "lubina"]),
                menu(4, "Menú Antiguo", false, &[]),
            ],
        }))
    }

    fn base_input() -> BookingInput {
        BookingInput {
            reservation_date: "2025-06-14".into(),
            reservation_time: "14:30".into(),
            party_size: Some(6),
            customer_name: "  Marta Soler ".into(),
            contact_phone: "600 111 222".into(),
            ..Default::default()
        }
    }

    fn principal(name: &str, servings: i32) -> PrincipalSelection {
        PrincipalSelection { name: name.into(), servings }
    }

    async fn expect_message(input: BookingInput, expected: &str) {
        match normalizer().normalize(RESTAURANT, input).await {
            Err(AppError::Validation(msg)) => assert_eq!(msg, expected),
            other => panic!("esperava validação '{expected}', veio {other:?}"),
        }
    }

    #[tokio::test]
    async fn valid_booking_is_normalized() {
        let record = normalizer().normalize(RESTAURANT, base_input()).await.unwrap();
        assert_eq!(record.reservation_time.format("%H:%M:%S").to_string(), "14:30:00");
        assert_eq!(record.customer_name, "Marta Soler");
        assert_eq!(record.contact_phone, "600111222");
        assert_eq!(record.contact_phone_country_code, "34");
        assert_eq!(record.contact_email, "reservas@casapepa.es");
        assert_eq!(record.arroz_type, None);
        assert_eq!(record.principales_json, None);
    }

    #[tokio::test]
    async fn validation_runs_in_order() {
        let mut input = base_input();
        input.reservation_date = "2025-02-30".into();
        input.party_size = Some(0);
        expect_message(input, MSG_INVALID_DATE).await;

        let mut input = base_input();
        input.party_size = Some(0);
        input.reservation_time = "25:00".into();
        expect_message(input, MSG_INVALID_PARTY_SIZE).await;

        let mut input = base_input();
        input.reservation_time = "mediodía".into();
        expect_message(input, MSG_INVALID_TIME).await;

        let mut input = base_input();
        input.customer_name = "   ".into();
        expect_message(input, MSG_NAME_REQUIRED).await;

        let mut input = base_input();
        input.contact_phone = "123".into();
        input.contact_phone_country_code = Some("1".into());
        expect_message(input, MSG_INVALID_PHONE).await;
    }

    #[tokio::test]
    async fn explicit_email_wins_over_fallback() {
        let mut input = base_input();
        input.contact_email = Some(" marta@example.com ".into());
        let record = normalizer().normalize(RESTAURANT, input).await.unwrap();
        assert_eq!(record.contact_email, "marta@example.com");
    }

    #[tokio::test]
    async fn arroz_is_deduplicated_and_bounded_by_party_size() {
        let mut input = base_input();
        input.arroz = ArrozInput {
            touched: true,
            types: vec!["Paella".into(), "".into(), "Paella".into(), "Arroz negro".into(), "Banda".into()],
            servings: vec![2, 5, 9, 3, 0],
        };
        let record = normalizer().normalize(RESTAURANT, input).await.unwrap();
        assert_eq!(record.arroz_type.as_deref(), Some(r#"["Paella","Arroz negro"]"#));
        assert_eq!(record.arroz_servings.as_deref(), Some("[2,3]"));

        let mut input = base_input();
        input.arroz = ArrozInput { touched: true, types: vec!["Paella".into()], servings: vec![7] };
        expect_message(input, MSG_ARROZ_EXCEEDS).await;
    }

    #[tokio::test]
    async fn group_menu_booking_builds_summary_and_forces_arroz() {
        let mut input = base_input();
        input.special_menu = true;
        input.menu_de_grupo_id = Some(3);
        input.commentary = Some("texto libre".into());
        input.arroz = ArrozInput { touched: true, types: vec!["Paella".into()], servings: vec![2] };
        input.principales = vec![principal("bacalao", 4), principal("paella", 2)];

        let record = normalizer().normalize(RESTAURANT, input).await.unwrap();
        assert_eq!(record.commentary.as_deref(), Some("bacalao x 4, paella x 2"));
        assert_eq!(
            record.principales_json.as_deref(),
            Some(r#"[{"name":"bacalao","servings":4},{"name":"paella","servings":2}]"#)
        );
        assert_eq!(record.arroz_type.as_deref(), Some(r#"["Menú Celebración"]"#));
        assert_eq!(record.arroz_servings.as_deref(), Some("[6]"));
        assert_eq!(record.menu_de_grupo_id, Some(3));
    }

    #[tokio::test]
    async fn inactive_or_missing_group_menu_is_rejected() {
        for id in [None, Some(0), Some(4), Some(99)] {
            let mut input = base_input();
            input.special_menu = true;
            input.menu_de_grupo_id = id;
            expect_message(input, MSG_INVALID_GROUP_MENU).await;
        }
    }

    #[test]
    fn principales_are_filtered_and_bounded() {
        let allowed = vec!["bacalao".to_string(), "lubina".to_string()];
        let out = reconcile_principales(
            &allowed,
            vec![principal("bacalao", 2), principal("pizza", 1), principal("bacalao", 3), principal("lubina", 0)],
            4,
        )
        .unwrap();
        assert_eq!(out.rows, vec![principal("bacalao", 2)]);
        assert_eq!(out.summary.as_deref(), Some("bacalao x 2"));

        let err = reconcile_principales(&[], vec![principal("x", 3), principal("y", 3)], 5);
        assert!(matches!(err, Err(AppError::Validation(m)) if m == MSG_PRINCIPALES_EXCEED));

        let empty = reconcile_principales(&allowed, vec![], 4).unwrap();
        assert_eq!(empty.summary, None);
        assert_eq!(empty.json, None);
    }

    #[tokio::test]
    async fn renormalizing_own_output_is_idempotent() {
        let n = normalizer();

        let mut plain = base_input();
        plain.arroz = ArrozInput { touched: true, types: vec!["Paella".into()], servings: vec![4] };
        plain.table_number = Some("12".into());

        let mut group = base_input();
        group.special_menu = true;
        group.menu_de_grupo_id = Some(3);
        group.principales = vec![principal("lubina", 6)];

        for input in [plain, group] {
            let first = n.normalize(RESTAURANT, input).await.unwrap();
            let second = n.normalize(RESTAURANT, BookingInput::from_record(&first)).await.unwrap();
            assert_eq!(first, second);
        }
    }

    #[tokio::test]
    async fn commentary_patch_keeps_arroz_byte_identical() {
        let n = normalizer();
        let mut current = n.normalize(RESTAURANT, base_input()).await.unwrap();
        // JSON gravado por uma versão antiga, com espaçamento diferente
        current.arroz_type = Some(r#"["Paella", "Arroz negro"]"#.into());
        current.arroz_servings = Some("[2, 3]".into());

        let patch: PatchBookingPayload = serde_json::from_str(r#"{"commentary":"terraza"}"#).unwrap();
        let patched = n.normalize_patch(RESTAURANT, &current, patch).await.unwrap();

        assert_eq!(patched.commentary.as_deref(), Some("terraza"));
        assert_eq!(patched.arroz_type, current.arroz_type);
        assert_eq!(patched.arroz_servings, current.arroz_servings);
    }

    #[tokio::test]
    async fn patch_revalidates_the_merged_booking() {
        let n = normalizer();
        let mut input = base_input();
        input.arroz = ArrozInput { touched: true, types: vec!["Paella".into()], servings: vec![4] };
        let current = n.normalize(RESTAURANT, input).await.unwrap();

        let patch: PatchBookingPayload = serde_json::from_str(r#"{"arroz_servings":[9]}"#).unwrap();
        let err = n.normalize_patch(RESTAURANT, &current, patch).await;
        assert!(matches!(err, Err(AppError::Validation(m)) if m == MSG_ARROZ_EXCEEDS));

        let patch: PatchBookingPayload = serde_json::from_str(r#"{"arroz_type":null}"#).unwrap();
        let cleared = n.normalize_patch(RESTAURANT, &current, patch).await.unwrap();
        assert_eq!(cleared.arroz_type, None);
        assert_eq!(cleared.arroz_servings, None);

        let patch: PatchBookingPayload = serde_json::from_str(r#"{"party_size":0}"#).unwrap();
        let err = n.normalize_patch(RESTAURANT, &current, patch).await;
        assert!(matches!(err, Err(AppError::Validation(m)) if m == MSG_INVALID_PARTY_SIZE));
    }
    fn stored_servings_sum(record: &BookingRecord) -> i64 {
        BookingInput::from_record(record).arroz.servings.into_iter().map(i64::from).sum()
    }

    #[tokio::test]
    async fn arroz_servings_never_exceed_party_size() {
        // (tipos, rações, pessoas, aceita?)
        let cases: Vec<(Vec<&str>, Vec<i32>, i32, bool)> = vec![
            (vec!["A", "B"], vec![i32::MAX, i32::MAX], 6, false),
            (vec!["A"], vec![i32::MAX], 6, false),
            (vec!["A", "B", "C"], vec![i32::MAX, 1, i32::MIN], 6, false),
            (vec!["A", "B"], vec![3, 3], 6, true),
            (vec!["A", "B"], vec![3, 4], 6, false),
            (vec!["A", "A", "B"], vec![3, 4, 3], 6, true),
            (vec!["A", "B"], vec![-5, 6], 6, true),
            (vec!["A", "B"], vec![6], 6, true),
            (vec![], vec![1, 2], 1, true),
        ];

        for (types, servings, party_size, accepted) in cases {
            let mut input = base_input();
            input.party_size = Some(party_size);
            input.arroz = ArrozInput {
                touched: true,
                types: types.iter().map(|t| t.to_string()).collect(),
                servings: servings.clone(),
            };

            match normalizer().normalize(RESTAURANT, input).await {
                Ok(record) => {
                    assert!(accepted, "{types:?} {servings:?} deveria falhar");
                    assert!(stored_servings_sum(&record) <= i64::from(party_size));
                }
                Err(AppError::Validation(msg)) => {
                    assert!(!accepted, "{types:?} {servings:?} deveria passar");
                    assert_eq!(msg, MSG_ARROZ_EXCEEDS);
                }
                Err(other) => panic!("erro inesperado {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn huge_principales_do_not_wrap_around() {
        let err = reconcile_principales(&[], vec![principal("x", i32::MAX), principal("y", i32::MAX)], 6);
        assert!(matches!(err, Err(AppError::Validation(m)) if m == MSG_PRINCIPALES_EXCEED));

        let mut input = base_input();
        input.special_menu = true;
        input.menu_de_grupo_id = Some(3);
        input.principales = vec![principal("bacalao", i32::MAX), principal("paella", i32::MAX)];
        expect_message(input, MSG_PRINCIPALES_EXCEED).await;
    }

    #[test]
    fn empty_allowed_list_accepts_any_name() {
        let out = reconcile_principales(
            &["  ".to_string()],
            vec![principal("chuletón", 2), principal("dorada", 1), principal("chuletón", 1)],
            3,
        )
        .unwrap();
        assert_eq!(out.rows, vec![principal("chuletón", 2), principal("dorada", 1)]);
        assert_eq!(out.summary.as_deref(), Some("chuletón x 2, dorada x 1"));

        let err = reconcile_principales(&[], vec![principal("chuletón", 2), principal("dorada", 2)], 3);
        assert!(matches!(err, Err(AppError::Validation(m)) if m == MSG_PRINCIPALES_EXCEED));
    }

    #[test]
    fn invalid_rows_are_dropped_before_deduplication() {
        let arroz = normalize_arroz(vec!["Paella".into(), "Paella".into()], vec![0, 3]);
        assert_eq!(arroz, vec![("Paella".to_string(), 3)]);

        let out = reconcile_principales(&[], vec![principal("bacalao", 0), principal("bacalao", 3)], 4).unwrap();
        assert_eq!(out.rows, vec![principal("bacalao", 3)]);
    }

    #[tokio::test]
    async fn shrinking_party_size_is_checked_against_stored_arroz() {
        let n = normalizer();
        let mut input = base_input();
        input.arroz = ArrozInput { touched: true, types: vec!["Paella".into()], servings: vec![6] };
        let current = n.normalize(RESTAURANT, input).await.unwrap();
        assert_eq!(current.arroz_servings.as_deref(), Some("[6]"));

        let patch: PatchBookingPayload = serde_json::from_str(r#"{"party_size":2}"#).unwrap();
        let err = n.normalize_patch(RESTAURANT, &current, patch).await;
        assert!(matches!(err, Err(AppError::Validation(m)) if m == MSG_ARROZ_EXCEEDS));

        // Aumentar continua preservando o JSON gravado
        let patch: PatchBookingPayload = serde_json::from_str(r#"{"party_size":"8"}"#).unwrap();
        let grown = n.normalize_patch(RESTAURANT, &current, patch).await.unwrap();
        assert_eq!(grown.party_size, 8);
        assert_eq!(grown.arroz_servings, current.arroz_servings);
        assert_eq!(grown.arroz_type, current.arroz_type);
    }
}
