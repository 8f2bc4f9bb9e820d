fn with_commas(digits: &str) -> String {
    let mut out = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.chars().rev().collect()
}

/// Format a float as a dollar amount with thousands separators: $1,234.56
pub fn money(val: f64) -> String {
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));
    let int_part = with_commas(int_part);
    if val < 0.0 {
        format!("-${int_part}.{dec_part}")
    } else {
        format!("${int_part}.{dec_part}")
    }
}

/// Format a count with thousands separators: 12,345
pub fn number(val: usize) -> String {
    with_commas(&val.to_string())
}

/// Render a `YYYYMM` key as `YYYY-MM`.
pub fn month_label(month: i64) -> String {
    format!("{}-{:02}", month / 100, month % 100)
}

/// Three-letter month name for 1-12.
pub fn month_abbr(month_n: u32) -> &'static str {
    match month_n {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        12 => "Dec",
        _ => "?",
    }
}

/// Compact dollar label for chart bars: $950, $12.5k, $3M.
pub fn format_k(val: f64) -> String {
    let abs = val.abs();
    let sign = if val < 0.0 { "-" } else { "" };
    if abs >= 1_000_000.0 {
        let m = abs / 1_000_000.0;
        if m == m.floor() {
            format!("{sign}${}M", m as u64)
        } else {
            format!("{sign}${:.1}M", m)
        }
    } else if abs >= 1000.0 {
        let k = abs / 1000.0;
        if k == k.floor() {
            format!("{sign}${}k", k as u64)
        } else {
            format!("{sign}${:.1}k", k)
        }
    } else {
        format!("{sign}${}", abs.round() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.56), "$1,234.56");
        assert_eq!(money(-500.00), "-$500.00");
        assert_eq!(money(0.0), "$0.00");
        assert_eq!(money(1000000.99), "$1,000,000.99");
        assert_eq!(money(42.10), "$42.10");
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(number(0), "0");
        assert_eq!(number(999), "999");
        assert_eq!(number(12345), "12,345");
    }

    #[test]
    fn test_month_label() {
        assert_eq!(month_label(201805), "2018-05");
        assert_eq!(month_label(202012), "2020-12");
    }

    #[test]
    fn test_format_k() {
        assert_eq!(format_k(950.0), "$950");
        assert_eq!(format_k(12_500.0), "$12.5k");
        assert_eq!(format_k(3_000_000.0), "$3M");
        assert_eq!(format_k(-2000.0), "-$2k");
    }
}
