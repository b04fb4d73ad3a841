/// Format an amount as whole kronor with space-grouped thousands: 1 234 567 kr
pub fn sek(val: f64) -> String {
    let rounded = val.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();

    if negative {
        format!("-{grouped} kr")
    } else {
        format!("{grouped} kr")
    }
}

/// Percentage with one decimal, or a dash when the base is zero.
pub fn percent(part: f64, whole: f64) -> String {
    if whole == 0.0 {
        "-".to_string()
    } else {
        format!("{:.1}%", part / whole * 100.0)
    }
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sek_formatting() {
        assert_eq!(sek(1234567.0), "1 234 567 kr");
        assert_eq!(sek(-10000.0), "-10 000 kr");
        assert_eq!(sek(0.0), "0 kr");
        assert_eq!(sek(999.4), "999 kr");
        assert_eq!(sek(1200.5), "1 201 kr");
        assert_eq!(sek(-0.2), "0 kr");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(50.0, 200.0), "25.0%");
        assert_eq!(percent(1.0, 0.0), "-");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
