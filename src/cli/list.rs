//! List command implementation.
//!
//! Prints the saved palettes, oldest first.

use clap::Args;

use crate::discovery::Manifest;
use crate::error::{Result, SwatchError};
use crate::output::{plural, Printer};
use crate::types::{PaletteEntry, Rgb};

use super::open_repository;

/// List saved palettes
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print the saved palettes as a JSON array on stdout
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ListArgs, manifest: &Manifest, printer: &Printer) -> Result<()> {
    let repo = open_repository(manifest)?;
    let entries = repo.read_all()?;

    if args.json {
        let json = serde_json::to_string_pretty(&entries).map_err(|e| SwatchError::Export {
            message: format!("Failed to encode palettes: {}", e),
            help: None,
        })?;
        println!("{}", json);
        return Ok(());
    }

    if entries.is_empty() {
        printer.info("Empty", "no saved palettes");
        return Ok(());
    }

    for entry in &entries {
        print_entry(entry, printer);
    }
    printer.info("Listed", &plural(entries.len(), "palette", "palettes"));

    Ok(())
}

fn print_entry(entry: &PaletteEntry, printer: &Printer) {
    println!("{}\t{}\t{}", entry.id, entry.image, entry.colors.join(" "));

    let colors: Vec<Rgb> = entry
        .colors
        .iter()
        .filter_map(|hex| Rgb::from_hex(hex).ok())
        .collect();
    let regions = plural(entry.regions.len(), "region", "regions");
    printer.info(
        &entry.id,
        &format!("{} {}", printer.cyan(&entry.image), printer.dim(&regions)),
    );
    if !colors.is_empty() {
        printer.palette(&colors);
    }
}
