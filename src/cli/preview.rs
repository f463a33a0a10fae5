use colored::Colorize;

use crate::cli::Context;
use crate::error::{ResitError, Result};
use crate::fmt::{amount, tarikh};
use crate::ledger::find;
use crate::models::{ReceiptData, ReceiptView};

const WIDTH: usize = 72;
const LABEL_W: usize = 20;
const BLANK: &str = "................................";

/// Left and right text on one line, the right part flush with WIDTH.
fn spread(left: &str, right: &str) -> String {
    let used = left.chars().count() + right.chars().count();
    let gap = WIDTH.saturating_sub(used).max(1);
    format!("{left}{}{right}", " ".repeat(gap))
}

fn labeled(label: &str, value: &str) -> Vec<String> {
    let shown = if value.trim().is_empty() { BLANK } else { value };
    let indent = " ".repeat(LABEL_W);
    textwrap::wrap(shown, WIDTH - LABEL_W)
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                format!("{label:<width$}{line}", width = LABEL_W)
            } else {
                format!("{indent}{line}")
            }
        })
        .collect()
}

/// Terminal rendition of a receipt, accent lines in the theme color.
pub fn render_text(view: ReceiptView<'_>, session_year: i32) -> String {
    let settings = view.settings;
    let receipt = view.receipt;
    let accent = settings.theme.style().terminal;
    let rule = "\u{2500}".repeat(WIDTH);
    let mut out: Vec<String> = Vec::new();

    out.push(rule.color(accent).to_string());
    let logo = if settings.logo.is_some() { "[logo]" } else { "[logo sekolah]" };
    out.push(logo.dimmed().to_string());
    out.push(spread(&settings.school_name, "RESIT RASMI").bold().to_string());
    out.push(spread(
        &settings.school_address.to_uppercase(),
        &format!("NO. RESIT {}", receipt.receipt_no),
    ));
    out.push(settings.org_name.to_uppercase().color(accent).bold().to_string());
    out.push(rule.color(accent).to_string());
    out.push(String::new());

    out.extend(labeled("DITERIMA DARIPADA", &receipt.received_from));
    out.extend(labeled("UNTUK BAYARAN", &receipt.for_payment));
    out.push(String::new());
    let total = format!("JUMLAH RM {} Sahaja", amount(receipt.amount));
    let date = match receipt.date {
        Some(d) => format!("TARIKH {}", tarikh(d)),
        None => format!("TARIKH {BLANK}"),
    };
    out.push(spread(&total, &date).color(accent).bold().to_string());
    out.push(String::new());

    if settings.show_paid_stamp {
        out.push("[ PAID / LUNAS ]".red().bold().to_string());
    }
    let pad = " ".repeat(LABEL_W);
    match settings.signature {
        Some(_) => out.push(format!("{pad}{}", "[tandatangan]".dimmed())),
        None => out.push(format!("{pad}{}", "Tandatangan Bendahari".italic().dimmed())),
    }
    out.push(format!("{pad}{}", "_".repeat(32)));
    let treasurer = if receipt.treasurer_name.trim().is_empty() {
        "BENDAHARI BKGK".to_string()
    } else {
        receipt.treasurer_name.to_uppercase()
    };
    out.push(format!("{pad}{}", treasurer.bold()));
    out.push(format!("{pad}BENDAHARI {}", settings.org_name.to_uppercase()));
    let stamp = if settings.stamp.is_some() { "[cop]" } else { "(COP RASMI)" };
    out.push(spread("", stamp).dimmed().to_string());

    out.push(rule.color(accent).to_string());
    out.push(spread(
        &format!("SESI {} / {}", session_year, session_year + 1),
        "ORIGINAL",
    ));
    out.join("\n")
}

/// Print a saved receipt, or a blank draft carrying the next number.
pub fn run(ctx: &Context, id: Option<String>) -> Result<()> {
    let state = ctx.state();
    let year = state.last_year;
    let draft;
    let receipt: &ReceiptData = match id {
        Some(key) => {
            let saved = find(&state.history, &key)?.ok_or(ResitError::NotFound(key))?;
            if let Some(at) = saved.created_at() {
                println!("Recorded {} (ID {})\n", at.format("%Y-%m-%d %H:%M"), saved.id);
            }
            &saved.receipt
        }
        None => {
            draft = ReceiptData::draft(&state, &ctx.clock, &ctx.app.default_treasurer);
            &draft
        }
    };
    let view = ReceiptView {
        settings: &state.settings,
        receipt,
    };
    println!("{}", render_text(view, year));
    Ok(())
}
