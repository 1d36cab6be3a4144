//! Mod-11 check-digit validation for CPF numbers.
//!
//! A CPF match from the pattern layer is only accepted once it passes this
//! numeric verification — shape alone is not enough for the primary document
//! detector.

/// Validate the two mod-11 check digits of an 11-digit CPF.
///
/// Check digit 1 is computed from the first 9 digits with weights 10..2,
/// check digit 2 from the first 10 digits with weights 11..2. In both cases
/// `digit = (sum * 10) % 11`, with a result of 10 mapped to 0.
///
/// Sequences of a single repeated digit (e.g. `00000000000`) pass the
/// arithmetic but are not valid documents, so they are rejected up front.
pub fn valid_cpf(digits: &[u8]) -> bool {
    if digits.len() != 11 || digits.iter().any(|&d| d > 9) {
        return false;
    }
    if digits.iter().all(|&d| d == digits[0]) {
        return false;
    }
    check_digit(&digits[..9], 10) == digits[9] && check_digit(&digits[..10], 11) == digits[10]
}

fn check_digit(digits: &[u8], first_weight: u32) -> u8 {
    let sum: u32 = digits
        .iter()
        .zip((2..=first_weight).rev())
        .map(|(&d, w)| u32::from(d) * w)
        .sum();
    let rem = (sum * 10) % 11;
    if rem == 10 {
        0
    } else {
        rem as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digits(s: &str) -> Vec<u8> {
        s.bytes().map(|b| b - b'0').collect()
    }

    #[test]
    fn test_valid_cpf_accepted() {
        // 123.456.789-09: first check digit hits the rem == 10 → 0 mapping.
        assert!(valid_cpf(&digits("12345678909")));
        assert!(valid_cpf(&digits("11144477735")));
    }

    #[test]
    fn test_wrong_check_digits_rejected() {
        assert!(!valid_cpf(&digits("12345678900")), "first digit wrong");
        assert!(!valid_cpf(&digits("12345678908")), "second digit wrong");
        assert!(!valid_cpf(&digits("11144477734")));
    }

    #[test]
    fn test_repeated_digit_sequences_rejected() {
        for d in 0..=9u8 {
            let cpf = vec![d; 11];
            assert!(!valid_cpf(&cpf), "repeated digit {} must be rejected", d);
        }
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(!valid_cpf(&digits("123456789")));
        assert!(!valid_cpf(&digits("123456789091")));
        assert!(!valid_cpf(&[]));
    }
}
