pub mod completions;
pub mod delete;
pub mod export;
pub mod init;
pub mod list;
pub mod sample;
pub mod watch;

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};

use crate::discovery::{load_manifest, Manifest};
use crate::error::Result;
use crate::store::{FileStore, PaletteRepository};

/// swatchcam - Sample colour palettes from photos
#[derive(Parser, Debug)]
#[command(name = "swatchcam")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Manifest to use instead of ./swatchcam.yaml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log pipeline progress (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sample a palette from photos
    Sample(sample::SampleArgs),

    /// Sample every new photo that lands in a directory
    Watch(watch::WatchArgs),

    /// List saved palettes
    List(list::ListArgs),

    /// Delete a saved palette
    Delete(delete::DeleteArgs),

    /// Export a saved palette as a PNG card or JSON
    Export(export::ExportArgs),

    /// Initialize a swatchcam project (generates swatchcam.yaml)
    Init(init::InitArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Load the manifest for a command run from the current directory.
pub fn load_config(config: Option<&Path>) -> Result<Manifest> {
    let (manifest, _) = load_manifest(config, Path::new("."))?;
    Ok(manifest)
}

/// Open the palette store the manifest points at.
pub fn open_repository(manifest: &Manifest) -> Result<PaletteRepository<FileStore>> {
    Ok(PaletteRepository::new(FileStore::open(manifest.store_dir())?))
}

/// A name for the regions of a palette that is not being saved.
fn scratch_id(n: usize) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("{:x}-{}", millis, n)
}
