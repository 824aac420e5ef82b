//! Delete command implementation.

use clap::Args;

use crate::discovery::Manifest;
use crate::error::Result;
use crate::output::Printer;

use super::open_repository;

/// Delete a saved palette
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Identifier shown by `swatchcam list`
    pub id: String,
}

/// Deleting an id that is not saved only warns; the store is untouched.
pub fn run(args: DeleteArgs, manifest: &Manifest, printer: &Printer) -> Result<()> {
    let repo = open_repository(manifest)?;

    if repo.delete(&args.id)? {
        printer.success("Deleted", &args.id);
    } else {
        printer.warning("Missing", &format!("no saved palette {}", args.id));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaletteEntry;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn entry(id: &str) -> PaletteEntry {
        PaletteEntry {
            id: id.to_string(),
            image: "beach.jpg".to_string(),
            regions: vec![],
            colors: vec!["#112233".to_string()],
        }
    }

    #[test]
    fn test_delete_saved_palette() {
        let dir = tempdir().unwrap();
        let manifest = Manifest {
            data_dir: dir.path().to_path_buf(),
            ..Manifest::default()
        };
        let repo = open_repository(&manifest).unwrap();
        repo.write_all(&[entry("a"), entry("b")]).unwrap();

        run(DeleteArgs { id: "a".to_string() }, &manifest, &Printer::plain()).unwrap();

        assert_eq!(repo.read_all().unwrap(), vec![entry("b")]);
    }

    #[test]
    fn test_delete_unknown_is_not_an_error() {
        let dir = tempdir().unwrap();
        let manifest = Manifest {
            data_dir: dir.path().to_path_buf(),
            ..Manifest::default()
        };
        let repo = open_repository(&manifest).unwrap();
        repo.write_all(&[entry("a")]).unwrap();

        run(DeleteArgs { id: "zz".to_string() }, &manifest, &Printer::plain()).unwrap();

        assert_eq!(repo.read_all().unwrap(), vec![entry("a")]);
    }
}
