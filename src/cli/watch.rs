//! Watch command implementation.
//!
//! Samples each photo that appears in a directory, the way a camera roll
//! picks up new shots.

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};

use clap::Args;
use log::{debug, warn};
use notify::event::{AccessKind, AccessMode, ModifyKind};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::discovery::{is_photo, Manifest};
use crate::error::{Result, SwatchError};
use crate::output::{display_path, plural, Printer};
use crate::store::{FileStore, PaletteRepository};

use super::open_repository;
use super::sample::{process_image, report, SamplingOverrides};

/// Sample every new photo that lands in a directory
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Directory to watch
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    #[command(flatten)]
    pub overrides: SamplingOverrides,

    /// Print palettes without saving them
    #[arg(long)]
    pub no_save: bool,

    /// Print results as JSON lines on stdout
    #[arg(long)]
    pub json: bool,
}

/// Photos named by a file system event that are worth sampling.
///
/// A photo counts once it has been created, renamed into place or closed
/// after writing. Other events, and files the manifest excludes, are
/// ignored.
pub fn new_photos(event: &Event, manifest: &Manifest) -> Vec<PathBuf> {
    let relevant = matches!(
        event.kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Name(_))
            | EventKind::Access(AccessKind::Close(AccessMode::Write))
    );
    if !relevant {
        return Vec::new();
    }

    event
        .paths
        .iter()
        .filter(|p| p.is_file() && is_photo(p) && !manifest.is_excluded(p))
        .cloned()
        .collect()
}

pub async fn run(args: WatchArgs, mut manifest: Manifest, printer: &Printer) -> Result<()> {
    args.overrides.apply(&mut manifest);

    if !args.dir.is_dir() {
        return Err(SwatchError::Io {
            path: args.dir.clone(),
            message: "Not a directory".to_string(),
        });
    }

    let repo = if args.no_save {
        None
    } else {
        Some(open_repository(&manifest)?)
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let _ = tx.send(res);
    })
    .map_err(|e| watch_error(&args.dir, e))?;
    watcher
        .watch(&args.dir, RecursiveMode::Recursive)
        .map_err(|e| watch_error(&args.dir, e))?;

    printer.status("Watching", &display_path(&args.dir));

    let sampled = sample_events(
        &mut rx,
        &manifest,
        repo.as_ref(),
        printer,
        args.json,
        tokio::signal::ctrl_c(),
    )
    .await?;

    printer.info("Stopped", &plural(sampled, "photo sampled", "photos sampled"));
    Ok(())
}

/// Sample photos as watcher events arrive, until the channel closes or
/// `cancel` completes. Returns how many photos were sampled.
///
/// `cancel` is raced against each build as well as the wait for events.
pub async fn sample_events<F: Future>(
    rx: &mut mpsc::UnboundedReceiver<notify::Result<Event>>,
    manifest: &Manifest,
    repo: Option<&PaletteRepository<FileStore>>,
    printer: &Printer,
    json: bool,
    cancel: F,
) -> Result<usize> {
    tokio::pin!(cancel);

    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut sampled = 0;

    'watch: loop {
        let event = tokio::select! {
            biased;

            _ = &mut cancel => break,
            event = rx.recv() => event,
        };
        let Some(event) = event else { break };
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                warn!("watch error: {}", e);
                continue;
            }
        };
        debug!("{:?}", event);

        for photo in new_photos(&event, manifest) {
            if !seen.insert(photo.clone()) {
                continue;
            }
            printer.status("Sampling", &display_path(&photo));

            let outcome = tokio::select! {
                biased;

                _ = &mut cancel => {
                    printer.warning("Cancelled", &format!("{} was not saved", display_path(&photo)));
                    break 'watch;
                }
                outcome = process_image(&photo, manifest, repo, seen.len()) => outcome,
            };

            match outcome {
                Ok(result) => {
                    report(printer, &photo, &result, json)?;
                    sampled += 1;
                }
                Err(e) => {
                    // Likely still being written; a later close event retries it
                    seen.remove(&photo);
                    printer.error("Failed", &format!("{}: {}", display_path(&photo), e));
                }
            }
        }
    }

    Ok(sampled)
}

fn watch_error(dir: &Path, e: notify::Error) -> SwatchError {
    SwatchError::Io {
        path: dir.to_path_buf(),
        message: format!("Failed to watch directory: {}", e),
    }
}
