/// Validates the trailing check digit of `number` with the Luhn algorithm.
///
/// Starting from the rightmost digit, every second digit is doubled (subtracting 9 when the result exceeds 9) and the
/// total of all digits must be divisible by 10. Empty strings and strings containing anything other than ASCII digits
/// are never valid.
pub fn is_valid_luhn(number: &str) -> bool {
    if number.is_empty() {
        return false;
    }
    let mut sum = 0u32;
    for (i, c) in number.bytes().rev().enumerate() {
        if !c.is_ascii_digit() {
            return false;
        }
        let mut digit = u32::from(c - b'0');
        if i % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    sum % 10 == 0
}
