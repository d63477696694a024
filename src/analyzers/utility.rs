/// Computes `part / total * 100`. Returns 0.0 when `total` is zero.
pub fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Computes the arithmetic mean of a slice of values. Returns `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Spreadsheet-style indicator code for a zero-based position: `a`..`z`, `aa`, `ab`, ...
pub fn indicator_code(index: usize) -> String {
    let mut n = index + 1;
    let mut code = Vec::new();
    while n > 0 {
        n -= 1;
        code.push(b'a' + (n % 26) as u8);
        n /= 26;
    }
    code.reverse();
    String::from_utf8(code).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_with_zero_total() {
        assert_eq!(pct(10, 0), 0.0);
        assert_eq!(pct(0, 0), 0.0);
    }

    #[test]
    fn test_pct_normal_values() {
        assert_eq!(pct(50, 100), 50.0);
        assert_eq!(pct(1, 4), 25.0);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
    }

    #[test]
    fn test_indicator_code() {
        assert_eq!(indicator_code(0), "a");
        assert_eq!(indicator_code(2), "c");
        assert_eq!(indicator_code(25), "z");
        assert_eq!(indicator_code(26), "aa");
        assert_eq!(indicator_code(27), "ab");
    }
}
