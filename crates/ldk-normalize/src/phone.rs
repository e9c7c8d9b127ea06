/// Strip everything that is not an ASCII digit.
pub fn only_digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Dash-grouped display form of a stored phone.
///
/// | digits                      | display              |
/// |-----------------------------|----------------------|
/// | >= 11, leading `7`          | `+7-XXX-XXX-XX-XX`   |
/// | >= 11, leading `8`          | `8-XXX-XXX-XX-XX`    |
/// | >= 11, other leading digit  | `8-` + last ten      |
/// | exactly 10                  | `8-XXX-XXX-XX-XX`    |
/// | anything else               | input, trimmed       |
pub fn format_phone_display(raw: &str) -> String {
    let digits = only_digits(raw);
    let n = digits.len();

    if n >= 11 {
        let (prefix, ten) = match digits.as_bytes()[0] {
            b'7' => ("+7", &digits[1..11]),
            b'8' => ("8", &digits[1..11]),
            _ => ("8", &digits[n - 10..]),
        };
        return group(prefix, ten);
    }
    if n == 10 {
        return group("8", &digits);
    }
    raw.trim().to_string()
}

fn group(prefix: &str, d: &str) -> String {
    format!(
        "{}-{}-{}-{}-{}",
        prefix,
        &d[0..3],
        &d[3..6],
        &d[6..8],
        &d[8..10]
    )
}
