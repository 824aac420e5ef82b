//! Export command implementation.
//!
//! Writes a saved palette as a PNG card, or prints it as JSON for another
//! program to pick up.

use std::path::PathBuf;

use clap::Args;

use crate::discovery::Manifest;
use crate::error::{Result, SwatchError};
use crate::output::{display_path, Printer};
use crate::render::{write_palette_card, CardOptions, MAX_SWATCH_SIZE};

use super::open_repository;

/// Export a saved palette as a PNG card or JSON
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Identifier shown by `swatchcam list`
    pub id: String,

    /// Output file (default: palette-<id>.png)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Side length of each swatch in pixels
    #[arg(
        long,
        default_value = "64",
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_SWATCH_SIZE))
    )]
    pub swatch_size: u32,

    /// Leave the photo off the card
    #[arg(long)]
    pub no_photo: bool,

    /// Print the palette as JSON on stdout instead of writing a card
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ExportArgs, manifest: &Manifest, printer: &Printer) -> Result<()> {
    let repo = open_repository(manifest)?;
    let entry = repo
        .get(&args.id)?
        .ok_or_else(|| SwatchError::NotFound { id: args.id.clone() })?;

    if args.json {
        let json = serde_json::to_string_pretty(&entry).map_err(|e| SwatchError::Export {
            message: format!("Failed to encode palette: {}", e),
            help: None,
        })?;
        println!("{}", json);
        return Ok(());
    }

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("palette-{}.png", entry.id)));
    let options = CardOptions {
        swatch_size: args.swatch_size,
        thumbnail: !args.no_photo,
    };

    write_palette_card(&entry, &output, &options)?;
    printer.success("Exported", &display_path(&output));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaletteEntry;
    use tempfile::tempdir;

    fn setup(dir: &std::path::Path) -> Manifest {
        let manifest = Manifest {
            data_dir: dir.join("data"),
            ..Manifest::default()
        };
        open_repository(&manifest)
            .unwrap()
            .commit(PaletteEntry {
                id: "p1".to_string(),
                image: dir.join("missing.jpg").display().to_string(),
                regions: vec![],
                colors: vec!["#ff0000".to_string(), "#00ff00".to_string()],
            })
            .unwrap();
        manifest
    }

    fn args(id: &str, output: Option<PathBuf>) -> ExportArgs {
        ExportArgs {
            id: id.to_string(),
            output,
            swatch_size: 8,
            no_photo: false,
            json: false,
        }
    }

    #[test]
    fn test_export_card() {
        let dir = tempdir().unwrap();
        let manifest = setup(dir.path());
        let output = dir.path().join("card.png");

        run(args("p1", Some(output.clone())), &manifest, &Printer::plain()).unwrap();

        let img = image::open(&output).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (16, 8));
        assert_eq!(img.get_pixel(12, 4).0, [0, 255, 0, 255]);
    }

    #[test]
    fn test_export_json() {
        let dir = tempdir().unwrap();
        let manifest = setup(dir.path());

        let mut json_args = args("p1", None);
        json_args.json = true;

        run(json_args, &manifest, &Printer::plain()).unwrap();
    }

    #[test]
    fn test_swatch_size_is_bounded() {
        use crate::cli::{Cli, Commands};
        use clap::Parser;

        let parsed = Cli::try_parse_from(["swatchcam", "export", "p1", "--swatch-size", "1024"]).unwrap();
        let Commands::Export(export) = parsed.command else {
            panic!("expected export command");
        };
        assert_eq!(export.swatch_size, 1024);

        for size in ["0", "1025", "4294967295"] {
            let result = Cli::try_parse_from(["swatchcam", "export", "p1", "--swatch-size", size]);
            assert!(result.is_err(), "swatch size {} should be rejected", size);
        }
    }

    #[test]
    fn test_export_oversized_card_is_an_error() {
        let dir = tempdir().unwrap();
        let manifest = setup(dir.path());
        let output = dir.path().join("card.png");

        let mut big = args("p1", Some(output.clone()));
        big.swatch_size = u32::MAX;

        let result = run(big, &manifest, &Printer::plain());
        assert!(matches!(result, Err(SwatchError::Export { .. })));
        assert!(!output.exists());
    }

    #[test]
    fn test_export_unknown_id() {
        let dir = tempdir().unwrap();
        let manifest = setup(dir.path());

        let result = run(args("nope", None), &manifest, &Printer::plain());
        assert!(matches!(result, Err(SwatchError::NotFound { .. })));
    }
}
