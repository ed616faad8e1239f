// src/common/phone.rs

/// Prefixo usado quando o cliente não manda código de país (Espanha).
pub const DEFAULT_COUNTRY_CODE: &str = "34";

/// Teto do E.164 (código + número nacional).
const E164_MAX_DIGITS: usize = 15;

/// Resultado da normalização de telefone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNormalization {
    pub country_code: String,
    pub national: String,
    pub e164: String,
    pub valid: bool,
}

impl PhoneNormalization {
    fn invalid(country_code: String, national: String) -> Self {
        let e164 = format!("{country_code}{national}");
        Self { country_code, national, e164, valid: false }
    }
}

fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normaliza (código de país, telefone) para dígitos E.164.
///
/// Quando o telefone já chega com o prefixo do país (a UI às vezes manda o
/// número combinado), o prefixo é separado em vez de ser duplicado. A
/// detecção é heurística: exige entre 8 e 15 dígitos, começar pelo código
/// e ter mais de 9 dígitos.
pub fn normalize_phone(country_code: &str, phone: &str) -> PhoneNormalization {
    let mut cc = digits_only(country_code);
    let phone = digits_only(phone);

    if cc.is_empty() {
        cc = DEFAULT_COUNTRY_CODE.to_string();
    }
    if cc.len() > 4 {
        return PhoneNormalization::invalid(cc, phone);
    }

    let looks_prefixed = (8..=E164_MAX_DIGITS).contains(&phone.len())
        && phone.starts_with(&cc)
        && phone.len() > 9;

    if looks_prefixed {
        let national = phone[cc.len()..].to_string();
        if national.len() < 6 {
            return PhoneNormalization::invalid(cc, national);
        }
        let e164 = format!("{cc}{national}");
        return PhoneNormalization { country_code: cc, national, e164, valid: true };
    }

    if !(6..=E164_MAX_DIGITS).contains(&phone.len()) || cc.len() + phone.len() > E164_MAX_DIGITS {
        return PhoneNormalization::invalid(cc, phone);
    }

    let e164 = format!("{cc}{phone}");
    PhoneNormalization { country_code: cc, national: phone, e164, valid: true }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple(n: &PhoneNormalization) -> (&str, &str, &str, bool) {
        (&n.country_code, &n.national, &n.e164, n.valid)
    }

    #[test]
    fn national_number_with_explicit_country_code() {
        let n = normalize_phone("34", "600111222");
        assert_eq!(tuple(&n), ("34", "600111222", "34600111222", true));
    }

    #[test]
    fn combined_number_is_split_instead_of_double_prefixed() {
        let n = normalize_phone("", "34600111222");
        assert_eq!(tuple(&n), ("34", "600111222", "34600111222", true));
    }

    #[test]
    fn too_short_is_rejected() {
        assert!(!normalize_phone("1", "123").valid);
    }

    #[test]
    fn strips_formatting_characters() {
        let n = normalize_phone("+34", "600 11 12 22");
        assert_eq!(tuple(&n), ("34", "600111222", "34600111222", true));

        let n = normalize_phone("(+351)", "912-345-678");
        assert_eq!(tuple(&n), ("351", "912345678", "351912345678", true));
    }

    #[test]
    fn country_code_longer_than_four_digits_is_rejected() {
        assert!(!normalize_phone("12345", "600111222").valid);
    }

    #[test]
    fn nine_digit_number_starting_with_code_is_not_split() {
        // 9 dígitos não passam do limiar "> 9": fica como número nacional
        let n = normalize_phone("34", "346001112");
        assert_eq!(tuple(&n), ("34", "346001112", "34346001112", true));
    }

    #[test]
    fn e164_ceiling_applies_to_national_numbers() {
        // 14 dígitos que não começam pelo código: 2 + 14 > 15
        assert!(!normalize_phone("34", "12345678901234").valid);
        assert!(normalize_phone("34", "1234567890123").valid);
    }

    #[test]
    fn normalization_is_idempotent_for_its_own_output() {
        let first = normalize_phone("", "34600111222");
        let second = normalize_phone(&first.country_code, &first.national);
        assert_eq!(first, second);
    }
}
