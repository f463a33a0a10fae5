use crate::cli::Context;
use crate::error::Result;
use crate::fmt::{format_bytes, money};
use crate::ledger::total_collected;

pub fn run(ctx: &Context) -> Result<()> {
    let state = ctx.state();
    let path = ctx.store.path();

    println!("Data dir:     {}", ctx.data_dir.display());
    println!("Record:       {}", path.display());
    if ctx.store.exists() {
        let size = std::fs::metadata(path)?.len();
        println!("Record size:  {}", format_bytes(size));
    } else {
        println!("Record size:  (not created yet, run `resit init`)");
    }

    println!();
    println!("Organization: {}", state.settings.org_name);
    println!("School:       {}", state.settings.school_name);
    println!(
        "Treasurer:    {}",
        if ctx.app.default_treasurer.is_empty() { "(not set)" } else { &ctx.app.default_treasurer }
    );

    println!();
    println!("Year:         {}", state.last_year);
    println!("Last issued:  {}", state.last_receipt_number);
    println!("Next number:  {}", state.next_receipt_number(&ctx.clock));
    println!("Receipts:     {}", state.history.len());
    println!("Collected:    {}", money(total_collected(&state.history)));
    Ok(())
}
