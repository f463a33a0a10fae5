use std::io::Write;

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::error::Result;
use crate::fmt::{amount, iso_date};
use crate::models::SavedReceipt;

pub const HEADERS: [&str; 6] = [
    "No. Resit",
    "Tarikh",
    "Diterima Daripada",
    "Amaun (RM)",
    "Untuk Bayaran",
    "Bendahari",
];

pub fn default_file_name(year: i32) -> String {
    format!("REKOD_KUTIPAN_BKGK_{year}.csv")
}

/// Write the collection record: a bare header line, then one fully quoted
/// row per receipt in history order. Write failures surface as CSV errors.
pub fn write_history<W: Write>(history: &[SavedReceipt], mut out: W) -> Result<()> {
    writeln!(out, "{}", HEADERS.join(",")).map_err(csv::Error::from)?;
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(&mut out);
    for r in history {
        let row = &r.receipt;
        let date = iso_date(row.date);
        let amt = amount(row.amount);
        wtr.write_record([
            row.receipt_no.as_str(),
            date.as_str(),
            row.received_from.as_str(),
            amt.as_str(),
            row.for_payment.as_str(),
            row.treasurer_name.as_str(),
        ])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn history_csv(history: &[SavedReceipt]) -> Result<String> {
    let mut buf = Vec::new();
    write_history(history, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
