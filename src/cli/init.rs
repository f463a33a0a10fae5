use std::path::PathBuf;

use colored::Colorize;

use crate::error::Result;
use crate::ledger;
use crate::numbering::SystemClock;
use crate::settings::{load_settings, save_settings, shellexpand_path};
use crate::store::{JsonStore, Store};

pub fn run(data_dir: Option<PathBuf>, treasurer: Option<String>) -> Result<()> {
    let mut settings = load_settings();

    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir.to_string_lossy());
    }
    if let Some(name) = treasurer {
        settings.default_treasurer = name.trim().to_string();
    }
    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;
    std::fs::create_dir_all(resolved.join("exports"))?;

    let store = JsonStore::open(&resolved);
    if store.exists() {
        println!("Using existing receipt record at {}", store.path().display());
    } else {
        let state = ledger::open(&store, &SystemClock);
        store.save(&state)?;
        println!("Created receipt record at {}", store.path().display());
    }

    println!("{} {}", "Initialized resit at".green(), resolved.display());
    Ok(())
}
