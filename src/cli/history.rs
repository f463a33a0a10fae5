use std::io::IsTerminal;

use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};
use dialoguer::Confirm;

use crate::cli::Context;
use crate::error::{ResitError, Result};
use crate::fmt::{amount, iso_date, money};
use crate::ledger::{self, find, total_collected};
use crate::models::SavedReceipt;

pub fn list(ctx: &Context) -> Result<()> {
    let state = ctx.state();
    if state.history.is_empty() {
        println!("{}", "No receipts recorded yet.".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "No. Resit",
        "Tarikh",
        "Diterima Daripada",
        "Untuk Bayaran",
        "Amaun (RM)",
        "ID",
    ]);
    for r in &state.history {
        let row = &r.receipt;
        table.add_row(vec![
            Cell::new(&row.receipt_no),
            Cell::new(iso_date(row.date)),
            Cell::new(&row.received_from),
            Cell::new(&row.for_payment),
            Cell::new(amount(row.amount)).set_alignment(CellAlignment::Right),
            Cell::new(short_id(&r.id)),
        ]);
    }
    println!("Receipts ({})\n{table}", state.history.len());
    println!("Total collected: {}", money(total_collected(&state.history)).green().bold());
    Ok(())
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

pub fn total(ctx: &Context) -> Result<()> {
    let state = ctx.state();
    println!("{}", money(total_collected(&state.history)));
    Ok(())
}

/// Ask before deleting. Without a terminal to ask on, refuse.
fn confirm_delete(entry: &SavedReceipt) -> Result<bool> {
    if !std::io::stdin().is_terminal() {
        return Err(ResitError::Cancelled(
            "Refusing to delete without confirmation; re-run with --yes.".to_string(),
        ));
    }
    Confirm::new()
        .with_prompt(format!(
            "Delete {} ({}, {})? This cannot be undone",
            entry.receipt.receipt_no,
            entry.receipt.received_from,
            money(entry.receipt.amount)
        ))
        .default(false)
        .interact()
        .map_err(|e| ResitError::Other(e.to_string()))
}

pub fn delete(ctx: &Context, key: &str, yes: bool) -> Result<()> {
    let state = ctx.state();
    let Some(entry) = find(&state.history, key)? else {
        println!("{}", format!("No receipt matching '{key}'; nothing deleted.").yellow());
        return Ok(());
    };

    if !yes && !confirm_delete(entry)? {
        println!("{}", "Deletion cancelled.".yellow());
        return Ok(());
    }

    let removed = ledger::remove(&ctx.store, &ctx.clock, &entry.id)?;
    println!("Deleted {}", removed.receipt.receipt_no);
    Ok(())
}
