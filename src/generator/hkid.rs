use rand::Rng;

/// Letter pool used when the caller does not supply one.
pub const DEFAULT_INITIAL_RANGE: &str = "QWERTYUIOPASDGFHJKLZXCVBNM";

// 324 是香港身份证校验规则定义的固定偏移量
const CHECKSUM_BASE: i64 = 324;

// 首位字母的加权系数
const INITIAL_WEIGHT: i64 = 8;

/// Generates a Hong Kong style identity number: one leading letter, six
/// digits, and a check value. A blank `initial_range` falls back to the
/// default pool; anything else is used verbatim as the candidate pool.
pub fn generate_hkid<T: rand::RngCore>(rng: &mut T, initial_range: &str) -> String {
    let pool: Vec<char> = if initial_range.trim().is_empty() {
        DEFAULT_INITIAL_RANGE.chars().collect()
    } else {
        initial_range.chars().collect()
    };
    let initial = pool[rng.random_range(0..pool.len())];

    let mut digits = String::with_capacity(6);
    for _ in 0..6 {
        digits.push(char::from(b'0' + rng.random_range(0..10u8)));
    }

    let mut id = String::with_capacity(8);
    id.push(initial);
    id.push_str(&digits);
    id.push_str(&check_value(initial, &digits));
    id
}

/// Check value over the non-random prefix. The leading letter carries weight
/// 8, the six digits carry weights 7 down to 2; a weighted sum with
/// `sum % 11 == 1` maps to 'A', everything else to `11 - sum % 11` in
/// decimal. A sum divisible by 11 therefore yields the two-digit value "11",
/// making the full number 9 characters instead of 8.
pub fn check_value(initial: char, digits: &str) -> String {
    let mut sum = CHECKSUM_BASE + letter_value(initial) * INITIAL_WEIGHT;
    for (i, c) in digits.chars().enumerate() {
        sum += (c as i64 - '0' as i64) * (7 - i as i64);
    }

    // Euclidean remainder keeps the result in 0..=10 even when an unusual
    // letter pool drives the sum negative.
    let remainder = sum.rem_euclid(11);
    if remainder == 1 {
        "A".to_string()
    } else {
        (11 - remainder).to_string()
    }
}

/// A=10 .. Z=35, the slot the Hong Kong scheme assigns to letters. Other
/// characters fall through the same ordinal arithmetic unchanged.
fn letter_value(c: char) -> i64 {
    c as i64 - 55
}
