// src/services/booking_service.rs

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::common::error::AppError;
use crate::common::service_time::service_sort_key_of;
use crate::db::BookingRepository;
use crate::models::auth::AuthContext;
use crate::models::booking::{Booking, BookingRecord, CreateBookingPayload, PatchBookingPayload};
use crate::services::booking_normalizer::{BookingInput, BookingNormalizer};
use crate::services::notifications::{DeliveryReport, Notifier, OutboundMessage};

pub const MSG_BOOKING_NOT_FOUND: &str = "Reserva no encontrada";

#[derive(Clone)]
pub struct BookingService {
    repo: BookingRepository,
    normalizer: BookingNormalizer,
    notifier: Notifier,
    pool: PgPool,
}

impl BookingService {
    pub fn new(
        repo: BookingRepository,
        normalizer: BookingNormalizer,
        notifier: Notifier,
        pool: PgPool,
    ) -> Self {
        Self { repo, normalizer, notifier, pool }
    }

    pub async fn create_booking(
        &self,
        restaurant_id: i32,
        payload: CreateBookingPayload,
    ) -> Result<Booking, AppError> {
        let record = self
            .normalizer
            .normalize(restaurant_id, BookingInput::from(payload))
            .await?;

        let booking = self.repo.insert(restaurant_id, &record).await?;

        tracing::info!(
            restaurant_id,
            booking_id = booking.id,
            date = %booking.reservation_date,
            party_size = booking.party_size,
            "Reserva creada"
        );
        Ok(booking)
    }

    /// Rota tipada: ausência vira 404.
    pub async fn get_booking(&self, restaurant_id: i32, booking_id: i32) -> Result<Booking, AppError> {
        self.repo
            .find(restaurant_id, booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(MSG_BOOKING_NOT_FOUND.into()))
    }

    /// Reservas do dia na ordem do serviço (a madrugada vai para o fim).
    pub async fn list_by_day(&self, restaurant_id: i32, date: NaiveDate) -> Result<Vec<Booking>, AppError> {
        let mut bookings = self.repo.list_by_date(restaurant_id, date).await?;
        sort_by_service_time(&mut bookings);
        Ok(bookings)
    }

    pub async fn patch_booking(
        &self,
        restaurant_id: i32,
        booking_id: i32,
        patch: PatchBookingPayload,
    ) -> Result<Booking, AppError> {
        // 1. Inicia Transação
        let mut tx = self.pool.begin().await?;

        // 2. Trava a reserva atual
        let current = self
            .repo
            .find_for_update(&mut *tx, restaurant_id, booking_id)
            .await?
            .ok_or_else(|| AppError::LegacyNotFound(MSG_BOOKING_NOT_FOUND.into()))?;

        // 3. Revalida o estado mesclado inteiro
        let record = self
            .normalizer
            .normalize_patch(restaurant_id, &BookingRecord::from(&current), patch)
            .await?;

        // 4. Grava
        let booking = self.repo.update(&mut *tx, restaurant_id, booking_id, &record).await?;

        // 5. Commit
        tx.commit().await?;

        tracing::info!(restaurant_id, booking_id, "Reserva actualizada");
        Ok(booking)
    }

    /// Arquiva em `cancelled_bookings` e apaga da tabela viva, tudo ou nada.
    pub async fn cancel_booking(
        &self,
        actor: &AuthContext,
        booking_id: i32,
    ) -> Result<(), AppError> {
        let restaurant_id = actor.restaurant_id;

        let mut tx = self.pool.begin().await?;

        let archived = self
            .repo
            .archive(&mut *tx, restaurant_id, booking_id, &actor.email)
            .await?;
        if !archived {
            return Err(AppError::LegacyNotFound(MSG_BOOKING_NOT_FOUND.into()));
        }

        self.repo.delete(&mut *tx, restaurant_id, booking_id).await?;

        tx.commit().await?;

        tracing::info!(restaurant_id, booking_id, cancelled_by = %actor.email, "Reserva cancelada");
        Ok(())
    }

    /// Lembrete por WhatsApp para todas as reservas do dia. O relatório traz
    /// o resultado de cada destinatário.
    pub async fn send_reminders(
        &self,
        restaurant_id: i32,
        date: NaiveDate,
    ) -> Result<DeliveryReport, AppError> {
        let bookings = self.list_by_day(restaurant_id, date).await?;
        let messages: Vec<OutboundMessage> = bookings.iter().map(reminder_message).collect();

        let report = self.notifier.send_whatsapp_batch(messages).await;

        tracing::info!(
            restaurant_id,
            %date,
            sent = report.sent,
            failed = report.failed,
            "Recordatorios enviados"
        );
        Ok(report)
    }
}

pub fn sort_by_service_time(bookings: &mut [Booking]) {
    bookings.sort_by_key(|b| (service_sort_key_of(b.reservation_time), b.id));
}

fn reminder_message(booking: &Booking) -> OutboundMessage {
    let text = format!(
        "Hola {}, te recordamos tu reserva del {} a las {} para {} personas. ¡Te esperamos!",
        booking.customer_name,
        booking.reservation_date.format("%d/%m/%Y"),
        booking.reservation_time.format("%H:%M"),
        booking.party_size,
    );
    OutboundMessage {
        booking_id: booking.id,
        recipient: format!(
            "{}{}",
            booking.contact_phone_country_code, booking.contact_phone
        ),
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Utc};

    fn booking(id: i32, time: &str) -> Booking {
        Booking {
            id,
            restaurant_id: 1,
            reservation_date: NaiveDate::from_ymd_opt(2025, 6, 14).unwrap(),
            reservation_time: NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
            party_size: 4,
            customer_name: "Marta".into(),
            contact_phone: "600111222".into(),
            contact_phone_country_code: "34".into(),
            contact_email: "m@example.com".into(),
            table_number: None,
            commentary: None,
            baby_strollers: None,
            high_chairs: None,
            arroz_type: None,
            arroz_servings: None,
            special_menu: false,
            menu_de_grupo_id: None,
            principales_json: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn day_listing_follows_service_order() {
        let mut list = vec![
            booking(1, "00:30"),
            booking(2, "21:00"),
            booking(3, "13:30"),
            booking(4, "07:59"),
            booking(5, "08:00"),
        ];
        sort_by_service_time(&mut list);
        let ids: Vec<i32> = list.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![5, 3, 2, 1, 4]);
    }

    #[test]
    fn reminder_targets_e164_number() {
        let msg = reminder_message(&booking(9, "14:30"));
        assert_eq!(msg.recipient, "34600111222");
        assert!(msg.text.contains("14/06/2025"));
        assert!(msg.text.contains("14:30"));
    }
}
