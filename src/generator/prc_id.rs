use chrono::NaiveDate;
use rand::Rng;

/// Substituted whenever the supplied birth date is not a real calendar date
/// in yyyyMMdd form.
pub const FALLBACK_BIRTH_DATE: &str = "19921225";

// 有效的行政区划地址码，进程启动后只读
static VALID_ADDRESS_CODES: &[&str] = &[
    "440101", // 广州荔湾区
    "440105", // 广州海珠区
    "440305", // 深圳南山区
    "440307", // 深圳龙岗区
    "441900", // 东莞
    "450821", // 平南
];

/// Generates a Mainland China style resident identity number: a 6-digit
/// address code, an 8-digit birth date, a 3-digit serial, and a mod-11 check
/// character ('X' stands in for the value 10). Always 18 characters.
pub fn generate_prc_id<T: rand::RngCore>(rng: &mut T, birth_date: &str) -> String {
    let address_code = VALID_ADDRESS_CODES[rng.random_range(0..VALID_ADDRESS_CODES.len())];
    let serial = rng.random_range(100..=999);

    let mut id = String::with_capacity(18);
    id.push_str(address_code);
    id.push_str(validate_birth_date(birth_date));
    id.push_str(&serial.to_string());
    id.push(check_char(&id));
    id
}

// Keeps the supplied date only when it is exactly 8 ASCII digits that parse
// as a real calendar date; everything else degrades to the fallback.
fn validate_birth_date(birth_date: &str) -> &str {
    let plain_digits = birth_date.len() == 8 && birth_date.bytes().all(|b| b.is_ascii_digit());
    if plain_digits && NaiveDate::parse_from_str(birth_date, "%Y%m%d").is_ok() {
        birth_date
    } else {
        FALLBACK_BIRTH_DATE
    }
}

/// Mod-11 check character over the 17-digit prefix. Signed arithmetic keeps
/// the computation total should a caller pass non-digit bytes.
pub fn check_char(base: &str) -> char {
    let mut sum: i64 = 0;
    for (i, b) in base.bytes().take(17).enumerate() {
        sum += (b as i64 - 48) * weight_factor(i as u32 + 1);
    }
    let result = (12 - sum.rem_euclid(11)) % 11;
    if result == 10 {
        'X'
    } else {
        char::from(b'0' + result as u8)
    }
}

// 2^(18-i) mod 11 for the 1-indexed position i; no stored table needed.
fn weight_factor(index: u32) -> i64 {
    2i64.pow(18 - index) % 11
}
