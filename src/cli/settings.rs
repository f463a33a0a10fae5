use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{Context, SettingsArgs};
use crate::error::{ResitError, Result};
use crate::ledger;
use crate::models::OrgSettings;

fn image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Read an image file into a `data:` URI, the form images are stored in.
pub fn image_data_uri(path: &Path) -> Result<String> {
    let mime = image_mime(path).ok_or_else(|| {
        ResitError::Validation(format!(
            "Unsupported image type: {} (use PNG, JPEG, GIF, WebP or SVG)",
            path.display()
        ))
    })?;
    let bytes = std::fs::read(path)?;
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

fn image_slot(current: &mut Option<String>, file: Option<&Path>, clear: bool) -> Result<()> {
    if clear {
        *current = None;
    } else if let Some(path) = file {
        *current = Some(image_data_uri(path)?);
    }
    Ok(())
}

/// Apply the given changes to `settings`. Untouched fields keep their values.
pub fn apply(settings: &mut OrgSettings, args: &SettingsArgs) -> Result<bool> {
    let before = settings.clone();
    if let Some(v) = &args.school_name {
        settings.school_name = v.trim().to_string();
    }
    if let Some(v) = &args.school_address {
        settings.school_address = v.trim().to_string();
    }
    if let Some(v) = &args.org_name {
        settings.org_name = v.trim().to_string();
    }
    if let Some(theme) = args.theme {
        settings.theme = theme;
    }
    if let Some(toggle) = args.paid_stamp {
        settings.show_paid_stamp = toggle.into();
    }
    image_slot(&mut settings.logo, args.logo.as_deref(), args.clear_logo)?;
    image_slot(&mut settings.stamp, args.stamp.as_deref(), args.clear_stamp)?;
    image_slot(&mut settings.signature, args.signature.as_deref(), args.clear_signature)?;
    Ok(*settings != before)
}

fn describe_image(slot: &Option<String>) -> String {
    match slot {
        Some(uri) => {
            let kind = uri
                .strip_prefix("data:")
                .and_then(|rest| rest.split(';').next())
                .unwrap_or("image");
            format!("{kind} ({} chars)", uri.len())
        }
        None => "(none)".to_string(),
    }
}

pub fn show(ctx: &Context) -> Result<()> {
    let s = ctx.state().settings;
    let mut table = Table::new();
    table.set_header(vec!["Setting", "Value"]);
    table.add_row(vec![Cell::new("School name"), Cell::new(&s.school_name)]);
    table.add_row(vec![Cell::new("School address"), Cell::new(&s.school_address)]);
    table.add_row(vec![Cell::new("Organization"), Cell::new(&s.org_name)]);
    table.add_row(vec![
        Cell::new("Theme"),
        Cell::new(format!("{} ({})", s.theme, s.theme.style().accent)),
    ]);
    table.add_row(vec![
        Cell::new("Paid stamp"),
        Cell::new(if s.show_paid_stamp { "on" } else { "off" }),
    ]);
    table.add_row(vec![Cell::new("Logo"), Cell::new(describe_image(&s.logo))]);
    table.add_row(vec![Cell::new("Stamp"), Cell::new(describe_image(&s.stamp))]);
    table.add_row(vec![Cell::new("Signature"), Cell::new(describe_image(&s.signature))]);
    println!("Organization settings\n{table}");
    Ok(())
}

pub fn set(ctx: &Context, args: SettingsArgs) -> Result<()> {
    let mut settings = ctx.state().settings;
    if !apply(&mut settings, &args)? {
        println!("{}", "Nothing to change.".yellow());
        return Ok(());
    }
    ledger::update_settings(&ctx.store, &ctx.clock, settings)?;
    println!("{}", "Settings saved.".green());
    Ok(())
}
