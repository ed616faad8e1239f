// src/common/service_time.rs

use chrono::{NaiveTime, Timelike};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Hora em que começa o "dia de serviço" do restaurante.
const SERVICE_DAY_START_MINUTES: u32 = 8 * 60;

/// Aceita `HH:MM` ou `HH:MM:SS` (com espaços ao redor).
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// Chave de ordenação do dia de serviço: minutos desde a meia-noite, mas
/// tudo antes das 08:00 pertence à noite anterior e vai para o fim
/// (08:00 → 23:59 → 00:00 → 07:59).
pub fn service_sort_key_of(time: NaiveTime) -> u32 {
    let minutes = time.hour() * 60 + time.minute();
    if minutes < SERVICE_DAY_START_MINUTES {
        minutes + MINUTES_PER_DAY
    } else {
        minutes
    }
}

pub fn service_sort_key(raw: &str) -> Option<u32> {
    parse_time(raw).map(service_sort_key_of)
}

/// Normaliza uma lista de horários (`HH:MM`), descarta inválidos e
/// duplicados e ordena pelo dia de serviço.
pub fn normalize_service_hours(hours: &[String]) -> Result<Vec<String>, String> {
    let mut parsed: Vec<NaiveTime> = Vec::with_capacity(hours.len());
    for raw in hours {
        let Some(t) = parse_time(raw) else {
            return Err(format!("Horario inválido: {}", raw.trim()));
        };
        if !parsed.contains(&t) {
            parsed.push(t);
        }
    }
    parsed.sort_by_key(|t| service_sort_key_of(*t));
    Ok(parsed.iter().map(|t| t.format("%H:%M").to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn early_morning_sorts_after_late_night() {
        let k = |s| service_sort_key(s).unwrap();
        assert!(k("07:30") > k("23:30"));
        assert!(k("08:00") < k("23:59"));
        assert!(k("23:59") < k("00:00"));
        assert!(k("00:00") < k("07:59"));
        assert_eq!(k("08:00"), 480);
        assert_eq!(k("00:00"), 1440);
    }

    #[test]
    fn accepts_seconds_and_rejects_garbage() {
        assert_eq!(service_sort_key("13:30:00"), Some(810));
        assert_eq!(service_sort_key("25:00"), None);
        assert_eq!(service_sort_key("mediodía"), None);
    }

    #[test]
    fn normalizes_hours_list() {
        let hours: Vec<String> = ["01:00", "13:00", "20:30", "13:00", "09:15:00"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            normalize_service_hours(&hours).unwrap(),
            vec!["09:15", "13:00", "20:30", "01:00"]
        );
        assert!(normalize_service_hours(&["99:00".to_string()]).is_err());
    }
}
