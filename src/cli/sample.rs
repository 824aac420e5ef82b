//! Sample command implementation.
//!
//! Builds a palette for each photo and optionally saves it.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};

use clap::Args;
use log::debug;

use crate::discovery::{scan_paths, Manifest};
use crate::error::{Result, SwatchError};
use crate::output::{display_path, plural, Printer};
use crate::sampling::{DecoderKind, PaletteBuilder, Sampler, Strategy};
use crate::store::{FileStore, PaletteRepository};
use crate::types::{Image, PaletteEntry, PaletteResult, RegionPolicy, Rgb};

use super::{open_repository, scratch_id};

/// Sample a palette from photos
#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Photos or directories of photos
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub overrides: SamplingOverrides,

    /// Save each palette to the store
    #[arg(long)]
    pub save: bool,

    /// Print results as JSON lines on stdout
    #[arg(long)]
    pub json: bool,
}

/// Flags that override the manifest for one run.
#[derive(Args, Debug, Default, Clone)]
pub struct SamplingOverrides {
    /// Sampling strategy
    #[arg(long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Decode regions by reading RGB at this byte offset
    #[arg(long)]
    pub offset: Option<usize>,

    /// Keep or discard cropped regions of saved palettes
    #[arg(long, value_enum)]
    pub regions: Option<RegionPolicy>,
}

impl SamplingOverrides {
    pub fn apply(&self, manifest: &mut Manifest) {
        if let Some(strategy) = self.strategy {
            manifest.strategy = strategy;
        }
        if let Some(offset) = self.offset {
            manifest.decoder = DecoderKind::FixedOffset;
            manifest.pixel_offset = offset;
        }
        if let Some(policy) = self.regions {
            manifest.region_policy = policy;
        }
    }
}

/// The outcome of sampling one photo.
#[derive(Debug)]
pub struct Sampled {
    pub image: Image,
    pub result: PaletteResult,
    /// The saved entry, when saving and the palette was not empty.
    pub entry: Option<PaletteEntry>,
}

/// Sample one photo and, with a repository, save the palette.
///
/// The entry is committed only once the build has finished. Nothing awaits
/// between the build and the commit, so a cancelled build saves nothing.
pub async fn process_image(
    path: &Path,
    manifest: &Manifest,
    repo: Option<&PaletteRepository<FileStore>>,
    n: usize,
) -> Result<Sampled> {
    let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let image = Image::open(&path)?;

    let id = match repo {
        Some(repo) => repo.next_id()?,
        None => scratch_id(n),
    };
    let region_dir = manifest.region_dir(repo.is_some()).join(&id);
    let builder = PaletteBuilder::new(Sampler::from_manifest(manifest, &region_dir)?);

    let result = builder.build_palette(&image).await?;

    let entry = match repo {
        Some(repo) if !result.is_empty() => {
            let entry = PaletteEntry::from_result(id, &image, &result, manifest.region_policy);
            repo.commit(entry.clone())?;
            Some(entry)
        }
        _ => None,
    };

    // Saved runs keep what the entry records; unsaved runs keep what is reported
    let keep = match (repo, &entry) {
        (None, _) => result.region_uris(),
        (Some(_), Some(entry)) => entry.regions.clone(),
        (Some(_), None) => Vec::new(),
    };
    prune_regions(&region_dir, &keep);

    Ok(Sampled { image, result, entry })
}

/// Delete region files under `dir` that are not in `keep`, then `dir`
/// itself once it is empty.
fn prune_regions(dir: &Path, keep: &[String]) {
    let Ok(files) = fs::read_dir(dir) else {
        return;
    };

    for file in files.flatten() {
        let path = file.path();
        if keep.iter().any(|uri| Path::new(uri) == path) {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => debug!("removed unused region {}", path.display()),
            Err(e) => debug!("could not remove {}: {}", path.display(), e),
        }
    }

    // Only removes an empty directory
    let _ = fs::remove_dir(dir);
}

/// Print one photo's palette: colours on stdout, status on stderr.
pub fn report(printer: &Printer, path: &Path, sampled: &Sampled, json: bool) -> Result<()> {
    if json {
        let line = serde_json::json!({
            "id": sampled.entry.as_ref().map(|e| e.id.as_str()),
            "image": sampled.image.reference(),
            "colors": sampled.result.colors,
            "regions": match &sampled.entry {
                Some(entry) => entry.regions.clone(),
                None => sampled.result.region_uris(),
            },
        });
        println!("{}", line);
    } else {
        println!("{}", sampled.result.colors.join(" "));
    }

    let colors: Vec<Rgb> = sampled
        .result
        .colors
        .iter()
        .filter_map(|hex| Rgb::from_hex(hex).ok())
        .collect();

    if colors.is_empty() {
        printer.warning("Empty", &format!("no colours sampled from {}", display_path(path)));
        return Ok(());
    }

    printer.success(
        "Sampled",
        &format!(
            "{} ({})",
            display_path(path),
            plural(colors.len(), "colour", "colours")
        ),
    );
    printer.palette(&colors);

    if let Some(entry) = &sampled.entry {
        printer.info("Saved", &entry.id);
    }

    Ok(())
}

pub async fn run(args: SampleArgs, mut manifest: Manifest, printer: &Printer) -> Result<()> {
    args.overrides.apply(&mut manifest);

    let photos = scan_paths(&args.files, &manifest)?;
    if photos.is_empty() {
        printer.warning("Skipping", "no photos found");
        return Ok(());
    }

    let repo = if args.save {
        Some(open_repository(&manifest)?)
    } else {
        None
    };

    let tally = sample_photos(
        &photos,
        &manifest,
        repo.as_ref(),
        printer,
        args.json,
        tokio::signal::ctrl_c(),
    )
    .await?;

    if !tally.cancelled && tally.failed == photos.len() {
        return Err(SwatchError::InvalidImage {
            message: format!("{} could not be sampled", plural(tally.failed, "photo", "photos")),
        });
    }

    Ok(())
}

/// How a batch of photos went.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub sampled: usize,
    pub failed: usize,
    pub cancelled: bool,
}

/// Sample `photos` in order until they are done or `cancel` completes.
///
/// `cancel` is raced against each build. A photo whose build loses the race
/// is not saved, and no later photo is started.
pub async fn sample_photos<F: Future>(
    photos: &[PathBuf],
    manifest: &Manifest,
    repo: Option<&PaletteRepository<FileStore>>,
    printer: &Printer,
    json: bool,
    cancel: F,
) -> Result<Tally> {
    tokio::pin!(cancel);

    let mut tally = Tally::default();
    for (n, photo) in photos.iter().enumerate() {
        printer.status("Sampling", &display_path(photo));

        tokio::select! {
            biased;

            _ = &mut cancel => {
                printer.warning("Cancelled", &format!("{} was not saved", display_path(photo)));
                tally.cancelled = true;
                break;
            }
            outcome = process_image(photo, manifest, repo, n) => match outcome {
                Ok(sampled) => {
                    report(printer, photo, &sampled, json)?;
                    tally.sampled += 1;
                }
                Err(e) => {
                    tally.failed += 1;
                    printer.error("Failed", &format!("{}: {}", display_path(photo), e));
                }
            }
        }
    }

    Ok(tally)
}
