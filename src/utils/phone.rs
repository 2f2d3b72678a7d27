//! Phone number utilities

use once_cell::sync::Lazy;
use regex::Regex;

// Mainland China mobile number. The pattern is a literal, so `Regex::new`
// cannot fail; `test_is_china_mobile` forces it.
static CHINA_MOBILE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^1\d{10}$").expect("static regex"));

// Geographic E.164 country calling codes.
const COUNTRY_CODES: &[u32] = &[
    1, 7, 20, 27, 30, 31, 32, 33, 34, 36, 39, 40, 41, 43, 44, 45, 46, 47, 48, 49, 51, 52, 53, 54,
    55, 56, 57, 58, 60, 61, 62, 63, 64, 65, 66, 81, 82, 84, 86, 90, 91, 92, 93, 94, 95, 98, 211,
    212, 213, 216, 218, 290, 291, 297, 298, 299, 370, 371, 372, 373, 374, 375, 376, 377, 378, 380,
    381, 382, 383, 385, 386, 387, 389, 420, 421, 423, 670, 850, 852, 853, 855, 856, 880, 886, 992,
    993, 994, 995, 996, 998,
];

// Contiguous blocks of assigned codes.
const COUNTRY_CODE_RANGES: &[(u32, u32)] = &[
    (220, 258),
    (260, 269),
    (350, 359),
    (500, 509),
    (590, 599),
    (672, 683),
    (685, 692),
    (960, 968),
    (970, 977),
];

/// Whether `code` is an assigned geographic E.164 country calling code.
pub fn is_valid_country_code(code: u32) -> bool {
    COUNTRY_CODES.contains(&code)
        || COUNTRY_CODE_RANGES
            .iter()
            .any(|(lo, hi)| (*lo..=*hi).contains(&code))
}

/// Remove common formatting characters, keeping digits and a leading `+`.
pub fn normalize_phone_number(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

/// 11 digits starting with `1`, no country prefix.
pub fn is_china_mobile(phone: &str) -> bool {
    CHINA_MOBILE_REGEX.is_match(phone)
}

/// `+<code><number>`, as Huawei expects.
pub fn with_plus_prefix(code: u32, mobile: &str) -> String {
    if mobile.starts_with('+') {
        mobile.to_string()
    } else {
        format!("+{code}{mobile}")
    }
}

/// `<code><number>` without `+`, as CL253 international expects.
///
/// A number already written as `+<code>...` is taken as complete.
pub fn with_bare_prefix(code: u32, mobile: &str) -> String {
    match mobile.strip_prefix('+') {
        Some(rest) => rest.to_string(),
        None => format!("{code}{mobile}"),
    }
}

/// Mask a phone number for logs (e.g., 138****5678)
pub fn mask_phone_number(phone: &str) -> String {
    let normalized = normalize_phone_number(phone);
    if normalized.len() >= 7 {
        format!(
            "{}****{}",
            &normalized[0..3],
            &normalized[normalized.len() - 4..]
        )
    } else {
        "****".to_string()
    }
}

/// Masked, comma-joined recipients for log fields.
pub fn mask_all(mobiles: &[String]) -> String {
    mobiles
        .iter()
        .map(|m| mask_phone_number(m))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_codes() {
        assert!(is_valid_country_code(1));
        assert!(is_valid_country_code(86));
        assert!(is_valid_country_code(44));
        assert!(is_valid_country_code(234));
        assert!(is_valid_country_code(852));
        assert!(!is_valid_country_code(0));
        assert!(!is_valid_country_code(999));
        assert!(!is_valid_country_code(259));
    }

    #[test]
    fn test_normalize_phone_number() {
        assert_eq!(normalize_phone_number("138-1234-5678"), "13812345678");
        assert_eq!(normalize_phone_number("+86 138 1234 5678"), "+8613812345678");
    }

    #[test]
    fn test_is_china_mobile() {
        assert!(is_china_mobile("13800138000"));
        assert!(!is_china_mobile("+13800138000"));
        assert!(!is_china_mobile("1380013800"));
        assert!(!is_china_mobile("23800138000"));
    }

    #[test]
    fn test_prefixes() {
        assert_eq!(with_plus_prefix(1, "5551234567"), "+15551234567");
        assert_eq!(with_plus_prefix(1, "+15551234567"), "+15551234567");
        assert_eq!(with_bare_prefix(852, "91234567"), "85291234567");
        assert_eq!(with_bare_prefix(1, "+15551234567"), "15551234567");
    }

    #[test]
    fn test_mask_phone_number() {
        assert_eq!(mask_phone_number("13812345678"), "138****5678");
        assert_eq!(mask_phone_number("+8613812345678"), "+86****5678");
        assert_eq!(mask_phone_number("12345"), "****");
        assert_eq!(
            mask_all(&["13812345678".to_string(), "13900000000".to_string()]),
            "138****5678,139****0000"
        );
    }
}
