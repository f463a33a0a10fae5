use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::cli::Context;
use crate::csv_export;
use crate::error::{ResitError, Result};
use crate::numbering::Clock;

fn default_path(ctx: &Context, name: &str) -> PathBuf {
    ctx.data_dir.join("exports").join(name)
}

fn write_file(bytes: &[u8], path: &Path) -> Result<String> {
    let display = path.display().to_string();
    let written = match path.parent() {
        Some(parent) => std::fs::create_dir_all(parent).and_then(|_| std::fs::write(path, bytes)),
        None => std::fs::write(path, bytes),
    };
    written.map_err(|source| ResitError::Export {
        path: display.clone(),
        source,
    })?;
    println!("Wrote {display}");
    Ok(display)
}

pub fn csv(ctx: &Context, output: Option<String>) -> Result<()> {
    let state = ctx.state();
    if state.history.is_empty() {
        println!("{}", "No receipts to export.".yellow());
        return Ok(());
    }
    let content = csv_export::history_csv(&state.history)?;
    let path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| default_path(ctx, &csv_export::default_file_name(ctx.clock.year())));
    write_file(content.as_bytes(), &path)?;
    Ok(())
}

#[cfg(feature = "pdf")]
pub fn pdf(ctx: &Context, key: &str, output: Option<String>) -> Result<()> {
    let state = ctx.state();
    let entry = crate::ledger::find(&state.history, key)?
        .ok_or_else(|| ResitError::NotFound(key.to_string()))?;
    let view = crate::models::ReceiptView {
        settings: &state.settings,
        receipt: &entry.receipt,
    };
    let bytes = crate::pdf::render_receipt(view, state.last_year)?;
    let path = output.map(PathBuf::from).unwrap_or_else(|| {
        default_path(ctx, &crate::pdf::receipt_file_name(&entry.receipt.receipt_no))
    });
    write_file(&bytes, &path)?;
    Ok(())
}

#[cfg(feature = "pdf")]
pub fn summary(ctx: &Context, output: Option<String>) -> Result<()> {
    let state = ctx.state();
    if state.history.is_empty() {
        println!("{}", "No receipts to export.".yellow());
        return Ok(());
    }
    let generated = chrono::Local::now().format("%d/%m/%Y %H:%M").to_string();
    let bytes = crate::pdf::render_summary(&state.history, &state.settings, &generated)?;
    let path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| default_path(ctx, crate::pdf::SUMMARY_FILE));
    write_file(&bytes, &path)?;
    Ok(())
}
