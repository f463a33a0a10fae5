mod cli;
mod csv_export;
mod error;
mod fmt;
mod ledger;
mod logging;
mod models;
mod numbering;
#[cfg(feature = "pdf")]
mod pdf;
mod settings;
mod store;

use clap::Parser;

use cli::{Cli, Commands, Context, ExportCommands, HistoryCommands, SettingsCommands};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let ctx = Context::new(cli.data_dir.clone());

    let result = match cli.command {
        Commands::Init { treasurer } => cli::init::run(cli.data_dir, treasurer),
        Commands::Status => cli::status::run(&ctx),
        Commands::Settings { command } => match command {
            SettingsCommands::Show => cli::settings::show(&ctx),
            SettingsCommands::Set(args) => cli::settings::set(&ctx, args),
        },
        Commands::Next => {
            println!("{}", ctx.state().next_receipt_number(&ctx.clock));
            Ok(())
        }
        Commands::New(args) => cli::new::run(&ctx, args),
        Commands::Preview { id } => cli::preview::run(&ctx, id),
        Commands::History { command } => match command {
            HistoryCommands::List => cli::history::list(&ctx),
            HistoryCommands::Delete { id, yes } => cli::history::delete(&ctx, &id, yes),
        },
        Commands::Total => cli::history::total(&ctx),
        Commands::Export { command } => match command {
            ExportCommands::Csv { output } => cli::export::csv(&ctx, output),
            #[cfg(feature = "pdf")]
            ExportCommands::Pdf { id, output } => cli::export::pdf(&ctx, &id, output),
            #[cfg(feature = "pdf")]
            ExportCommands::Summary { output } => cli::export::summary(&ctx, output),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
