use colored::Colorize;

use crate::cli::preview::render_text;
use crate::cli::{Context, NewArgs};
use crate::error::Result;
use crate::fmt::money;
use crate::ledger;
use crate::models::{ReceiptData, ReceiptView, StorageState};
use crate::numbering::Clock;

/// Fill a draft from the command line, over the blank or sample draft.
pub fn build_draft(
    state: &StorageState,
    clock: &dyn Clock,
    default_treasurer: &str,
    args: &NewArgs,
) -> ReceiptData {
    let blank = ReceiptData::draft(state, clock, default_treasurer);
    let mut draft = if args.demo {
        ReceiptData::demo(&blank.receipt_no, clock)
    } else {
        blank
    };
    if let Some(v) = &args.from {
        draft.received_from = v.trim().to_string();
    }
    if let Some(v) = args.amount {
        draft.amount = v;
    }
    if let Some(v) = &args.for_payment {
        draft.for_payment = v.trim().to_string();
    }
    if let Some(v) = args.date {
        draft.date = Some(v);
    }
    if let Some(v) = &args.treasurer {
        draft.treasurer_name = v.trim().to_string();
    }
    if let Some(v) = &args.receipt_no {
        draft.receipt_no = v.trim().to_string();
    }
    draft
}

pub fn run(ctx: &Context, args: NewArgs) -> Result<()> {
    let state = ctx.state();
    let draft = build_draft(&state, &ctx.clock, &ctx.app.default_treasurer, &args);

    let view = ReceiptView {
        settings: &state.settings,
        receipt: &draft,
    };
    println!("{}\n", render_text(view, state.last_year));

    if args.dry_run {
        ledger::validate(&draft)?;
        println!("{}", "Dry run: receipt not recorded.".yellow());
        return Ok(());
    }

    let saved = ledger::record(&ctx.store, &ctx.clock, &draft)?;
    println!(
        "{} {} ({}) recorded. ID: {}",
        "Receipt".green(),
        saved.receipt.receipt_no.bold(),
        money(saved.receipt.amount),
        saved.id
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::numbering::FixedClock;

    fn args() -> NewArgs {
        NewArgs {
            from: None,
            amount: None,
            for_payment: None,
            date: None,
            treasurer: None,
            receipt_no: None,
            demo: false,
            dry_run: false,
        }
    }

    #[test]
    fn test_build_draft_from_args() {
        let clock = FixedClock::on(2024, 3, 1);
        let mut state = StorageState::default_for(2024);
        state.last_receipt_number = 4;
        let a = NewArgs {
            from: Some(" Ali ".to_string()),
            amount: Some(Decimal::new(2050, 2)),
            for_payment: Some("Derma".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 2, 29),
            ..args()
        };
        let d = build_draft(&state, &clock, "Aida", &a);
        assert_eq!(d.received_from, "Ali");
        assert_eq!(d.amount, Decimal::new(2050, 2));
        assert_eq!(d.receipt_no, "BKGK/2024/0005");
        assert_eq!(d.date, NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(d.treasurer_name, "Aida");
    }

    #[test]
    fn test_build_draft_demo_keeps_number() {
        let clock = FixedClock::on(2026, 1, 10);
        let state = StorageState::default_for(2026);
        let a = NewArgs { demo: true, ..args() };
        let d = build_draft(&state, &clock, "", &a);
        assert_eq!(d.received_from, "Ahmad bin Ali");
        assert_eq!(d.for_payment, "Yuran Tahunan BKGK 2026");
        assert_eq!(d.receipt_no, "BKGK/2026/0001");
        assert!(ledger::validate(&d).is_ok());
    }

    #[test]
    fn test_build_draft_manual_number() {
        let clock = FixedClock::on(2024, 3, 1);
        let state = StorageState::default_for(2024);
        let a = NewArgs {
            receipt_no: Some("BKGK/2024/0050".to_string()),
            ..args()
        };
        let d = build_draft(&state, &clock, "", &a);
        assert_eq!(d.receipt_no, "BKGK/2024/0050");
    }
}
