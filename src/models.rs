use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::numbering::{next_receipt_number, Clock};

pub const DEFAULT_SCHOOL_NAME: &str = "SEKOLAH KEBANGSAAN CONTOH";
pub const DEFAULT_SCHOOL_ADDRESS: &str = "Jalan Pendidikan, 43000 Kajang, Selangor Darul Ehsan";
pub const DEFAULT_ORG_NAME: &str = "Badan Kebajikan Guru dan Kakitangan";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Blue,
    Red,
    Yellow,
}

/// Colors a theme resolves to on the rendered receipt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeStyle {
    pub accent: &'static str,
    pub rgb: (u8, u8, u8),
    pub terminal: colored::Color,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Blue, Theme::Red, Theme::Yellow];

    pub fn style(self) -> ThemeStyle {
        match self {
            Theme::Blue => ThemeStyle {
                accent: "#2563eb",
                rgb: (0x25, 0x63, 0xeb),
                terminal: colored::Color::Blue,
            },
            Theme::Red => ThemeStyle {
                accent: "#dc2626",
                rgb: (0xdc, 0x26, 0x26),
                terminal: colored::Color::Red,
            },
            Theme::Yellow => ThemeStyle {
                accent: "#eab308",
                rgb: (0xea, 0xb3, 0x08),
                terminal: colored::Color::Yellow,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Blue => "blue",
            Theme::Red => "red",
            Theme::Yellow => "yellow",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown theme '{s}' (expected blue, red or yellow)"))
    }
}

/// Organization identity and branding printed on every receipt.
///
/// Image fields hold data URIs and are never decoded here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrgSettings {
    pub school_name: String,
    pub school_address: String,
    pub org_name: String,
    pub logo: Option<String>,
    pub stamp: Option<String>,
    pub signature: Option<String>,
    pub show_paid_stamp: bool,
    pub theme: Theme,
}

impl Default for OrgSettings {
    fn default() -> Self {
        Self {
            school_name: DEFAULT_SCHOOL_NAME.to_string(),
            school_address: DEFAULT_SCHOOL_ADDRESS.to_string(),
            org_name: DEFAULT_ORG_NAME.to_string(),
            logo: None,
            stamp: None,
            signature: None,
            show_paid_stamp: true,
            theme: Theme::Blue,
        }
    }
}

/// A receipt being filled in. Only reaches storage through finalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptData {
    pub received_from: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub for_payment: String,
    /// `None` for records whose date was cleared or cannot be read.
    #[serde(default, with = "lenient_date")]
    pub date: Option<NaiveDate>,
    pub receipt_no: String,
    pub treasurer_name: String,
}

impl ReceiptData {
    /// Blank draft dated today carrying the next candidate receipt number.
    pub fn draft(state: &StorageState, clock: &dyn Clock, treasurer: &str) -> Self {
        Self {
            received_from: String::new(),
            amount: Decimal::ZERO,
            for_payment: String::new(),
            date: Some(clock.today()),
            receipt_no: state.next_receipt_number(clock),
            treasurer_name: treasurer.to_string(),
        }
    }

    /// Sample payment used to try the generator out. Keeps the draft's number.
    pub fn demo(receipt_no: &str, clock: &dyn Clock) -> Self {
        Self {
            received_from: "Ahmad bin Ali".to_string(),
            amount: Decimal::new(15000, 2),
            for_payment: format!("Yuran Tahunan BKGK {}", clock.year()),
            date: Some(clock.today()),
            receipt_no: receipt_no.to_string(),
            treasurer_name: "Aida Nordila Bt. Abdul Hadi".to_string(),
        }
    }
}

/// Receipt dates travel as `YYYY-MM-DD`. Blank or unreadable dates read as
/// `None` and are written back as an empty string.
mod lenient_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.collect_str(&d.format(FORMAT)),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(d)?.unwrap_or_default();
        let raw = raw.trim();
        // full timestamps keep only their date part
        Ok(NaiveDate::parse_from_str(raw, FORMAT)
            .ok()
            .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, FORMAT).ok())))
    }
}

/// Finalized receipt as kept in history. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedReceipt {
    #[serde(flatten)]
    pub receipt: ReceiptData,
    pub id: String,
    /// Unix epoch milliseconds at finalization.
    pub timestamp: i64,
}

impl SavedReceipt {
    pub fn created_at(&self) -> Option<chrono::DateTime<chrono::Local>> {
        chrono::DateTime::<chrono::Utc>::from_timestamp_millis(self.timestamp)
            .map(|utc| utc.with_timezone(&chrono::Local))
    }
}

/// The single persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageState {
    #[serde(default)]
    pub settings: OrgSettings,
    pub last_receipt_number: u32,
    pub last_year: i32,
    /// Most recent first. Absent in records written before history existed.
    #[serde(default)]
    pub history: Vec<SavedReceipt>,
}

impl StorageState {
    pub fn default_for(year: i32) -> Self {
        Self {
            settings: OrgSettings::default(),
            last_receipt_number: 0,
            last_year: year,
            history: Vec::new(),
        }
    }

    pub fn next_receipt_number(&self, clock: &dyn Clock) -> String {
        next_receipt_number(self.last_receipt_number, self.last_year, clock)
    }

    /// Move the counter into the clock's year, restarting it at zero.
    /// Returns true when a rollover happened.
    pub fn roll_year(&mut self, clock: &dyn Clock) -> bool {
        let year = clock.year();
        if year == self.last_year {
            return false;
        }
        tracing::info!(from = self.last_year, to = year, "receipt sequence rolled over");
        self.last_year = year;
        self.last_receipt_number = 0;
        true
    }
}

/// Read-only pairing handed to renderers.
#[derive(Debug, Clone, Copy)]
pub struct ReceiptView<'a> {
    pub settings: &'a OrgSettings,
    pub receipt: &'a ReceiptData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numbering::FixedClock;

    #[test]
    fn test_theme_parse_and_display() {
        assert_eq!("red".parse::<Theme>().unwrap(), Theme::Red);
        assert_eq!(" Yellow ".parse::<Theme>().unwrap(), Theme::Yellow);
        assert!("green".parse::<Theme>().is_err());
        assert_eq!(Theme::Blue.to_string(), "blue");
        assert_eq!(Theme::Red.style().accent, "#dc2626");
    }

    #[test]
    fn test_settings_wire_format_uses_camel_case() {
        let json = serde_json::to_value(OrgSettings::default()).unwrap();
        assert_eq!(json["schoolName"], DEFAULT_SCHOOL_NAME);
        assert_eq!(json["showPaidStamp"], true);
        assert_eq!(json["theme"], "blue");
        assert!(json["logo"].is_null());
    }

    #[test]
    fn test_saved_receipt_reads_original_record() {
        let json = r#"{
            "receivedFrom": "Ali",
            "amount": 150,
            "forPayment": "Yuran",
            "date": "2024-03-01",
            "receiptNo": "BKGK/2024/0001",
            "treasurerName": "Aida",
            "id": "0f8fad5b-d9cb-469f-a165-70867728950e",
            "timestamp": 1709280000000
        }"#;
        let saved: SavedReceipt = serde_json::from_str(json).unwrap();
        assert_eq!(saved.receipt.amount, Decimal::new(150, 0));
        assert_eq!(saved.receipt.date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(saved.receipt.receipt_no, "BKGK/2024/0001");
        assert_eq!(saved.timestamp, 1709280000000);
    }

    #[test]
    fn test_blank_or_odd_dates_still_read() {
        let entry = |date: &str| {
            format!(
                r#"{{"receivedFrom":"Ali","amount":5,"forPayment":"","date":{date},
                "receiptNo":"BKGK/2024/0001","treasurerName":"","id":"x","timestamp":0}}"#
            )
        };
        let blank: SavedReceipt = serde_json::from_str(&entry(r#""""#)).unwrap();
        assert_eq!(blank.receipt.date, None);
        let null: SavedReceipt = serde_json::from_str(&entry("null")).unwrap();
        assert_eq!(null.receipt.date, None);
        let stamped: SavedReceipt =
            serde_json::from_str(&entry(r#""2024-03-01T08:00:00.000Z""#)).unwrap();
        assert_eq!(stamped.receipt.date, NaiveDate::from_ymd_opt(2024, 3, 1));

        let json = serde_json::to_value(&blank).unwrap();
        assert_eq!(json["date"], "");
    }

    #[test]
    fn test_amount_written_as_number() {
        let clock = FixedClock::on(2024, 3, 1);
        let receipt = ReceiptData::demo("BKGK/2024/0001", &clock);
        let json = serde_json::to_value(&receipt).unwrap();
        assert!(json["amount"].is_number());
        assert_eq!(json["amount"].as_f64(), Some(150.0));
    }

    #[test]
    fn test_partial_settings_fill_from_defaults() {
        let json = r#"{"schoolName": "SK Bukit"}"#;
        let s: OrgSettings = serde_json::from_str(json).unwrap();
        assert_eq!(s.school_name, "SK Bukit");
        assert_eq!(s.org_name, DEFAULT_ORG_NAME);
        assert!(s.show_paid_stamp);
        assert_eq!(s.theme, Theme::Blue);
    }

    #[test]
    fn test_roll_year() {
        let mut state = StorageState::default_for(2024);
        state.last_receipt_number = 31;
        assert!(!state.roll_year(&FixedClock::on(2024, 12, 31)));
        assert_eq!(state.last_receipt_number, 31);

        assert!(state.roll_year(&FixedClock::on(2025, 1, 1)));
        assert_eq!(state.last_year, 2025);
        assert_eq!(state.last_receipt_number, 0);
    }

    #[test]
    fn test_draft_carries_next_number() {
        let clock = FixedClock::on(2024, 6, 15);
        let mut state = StorageState::default_for(2024);
        state.last_receipt_number = 6;
        let draft = ReceiptData::draft(&state, &clock, "Aida");
        assert_eq!(draft.receipt_no, "BKGK/2024/0007");
        assert_eq!(draft.date, Some(clock.date));
        assert_eq!(draft.amount, Decimal::ZERO);
        assert_eq!(draft.treasurer_name, "Aida");
    }
}
