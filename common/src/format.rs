//! 表示用の数値・文字列整形
//!
//! 数値は es-CO 形式（桁区切り `.`、小数点 `,`）で出す。

/// es-CO 形式で数値を整形
///
/// 小数は最大 `max_fraction_digits` 桁に丸め、末尾の0は落とす。
///
/// # Examples
/// ```
/// use ecobalance_common::format::format_number;
///
/// assert_eq!(format_number(1234567.891, 0), "1.234.568");
/// assert_eq!(format_number(-1234.5, 3), "-1.234,5");
/// ```
pub fn format_number(value: f64, max_fraction_digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let rounded = format!("{:.*}", max_fraction_digits, value.abs());
    let (int_part, frac_part) = match rounded.split_once('.') {
        Some((int_part, frac)) => (int_part, frac.trim_end_matches('0')),
        None => (rounded.as_str(), ""),
    };

    let mut out = String::new();
    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();
    if value < 0.0 && !is_zero {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if !frac_part.is_empty() {
        out.push(',');
        out.push_str(frac_part);
    }
    out
}

/// 正の値に `+` を付けて整形（収支表示用）
pub fn format_signed(value: f64, max_fraction_digits: usize) -> String {
    let body = format_number(value, max_fraction_digits);
    if value > 0.0 && body != "0" {
        format!("+{}", body)
    } else {
        body
    }
}

/// 固定小数点（per cápita 表示用、区切りなし）
pub fn format_fixed(value: f64, digits: usize) -> String {
    format!("{:.*}", digits, value)
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// HTML特殊文字のエスケープ
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
