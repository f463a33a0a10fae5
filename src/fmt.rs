use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

const BULAN: [&str; 12] = [
    "Januari", "Februari", "Mac", "April", "Mei", "Jun", "Julai", "Ogos", "September", "Oktober",
    "November", "Disember",
];

/// Plain two-decimal amount: 1234.5 -> "1234.50".
pub fn amount(val: Decimal) -> String {
    format!(
        "{:.2}",
        val.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// Format an amount in ringgit with thousands separators: RM1,234.56
pub fn money(val: Decimal) -> String {
    let negative = val.is_sign_negative() && !val.is_zero();
    let cents = amount(val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-RM{with_commas}.{dec_part}")
    } else {
        format!("RM{with_commas}.{dec_part}")
    }
}

/// Long Malay date as printed on receipts: 01 Mac 2024
pub fn tarikh(date: NaiveDate) -> String {
    format!("{:02} {} {}", date.day(), BULAN[date.month0() as usize], date.year())
}

/// `YYYY-MM-DD`, or empty when the receipt carries no date.
pub fn iso_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
