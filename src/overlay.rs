use crate::{bottle::Bottle, runner::WineLayout};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};
use walkdir::WalkDir;

const LIBRARY_EXTENSION: &str = "dll";

/// Replacement libraries copied over the stock ones of a prefix
#[derive(Debug, Clone)]
pub struct DllOverlay {
    x64: PathBuf,
    x32: PathBuf,
}

#[derive(Debug)]
pub struct OverlayFailure {
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
    pub error: io::Error,
}

/// Outcome of an overlay pass, every library is attempted regardless of
/// earlier failures
#[derive(Debug, Default)]
pub struct OverlayReport {
    installed: Vec<PathBuf>,
    failures: Vec<OverlayFailure>,
}

impl OverlayReport {
    /// Destination paths that now hold the overlay library
    pub fn installed(&self) -> &[PathBuf] {
        &self.installed
    }

    pub fn failures(&self) -> &[OverlayFailure] {
        &self.failures
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn merge(&mut self, other: OverlayReport) {
        self.installed.extend(other.installed);
        self.failures.extend(other.failures);
    }
}

impl DllOverlay {
    pub fn new(x64: impl Into<PathBuf>, x32: impl Into<PathBuf>) -> Self {
        Self {
            x64: x64.into(),
            x32: x32.into(),
        }
    }

    pub fn from_layout(layout: &WineLayout) -> Self {
        Self::new(layout.dxvk_x64(), layout.dxvk_x32())
    }

    /// Copy the 64-bit libraries into `system32`, then the 32-bit ones into `syswow64`
    pub fn install(&self, bottle: &Bottle) -> OverlayReport {
        let mut report = overlay_directory(&self.x64, &bottle.system32());
        report.merge(overlay_directory(&self.x32, &bottle.syswow64()));
        report
    }
}

/// Copy every library found below `source` into `destination`, flattening
/// the source tree. Symlinked libraries are copied as the file they point to.
pub fn overlay_directory(source: &Path, destination: &Path) -> OverlayReport {
    let mut report = OverlayReport::default();

    for entry in WalkDir::new(source).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Failed to read {}: {}", source.display(), e);
                report.failures.push(OverlayFailure {
                    source: e.path().unwrap_or(source).to_path_buf(),
                    destination: None,
                    error: e.into(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_library(entry.path()) {
            continue;
        }

        let target = destination.join(entry.file_name());
        match replace_file(entry.path(), &target) {
            Ok(()) => {
                debug!("Replaced {}", target.display());
                report.installed.push(target);
            }
            Err(error) => {
                warn!(
                    "Failed to replace {}: {}",
                    entry.file_name().to_string_lossy(),
                    error
                );
                report.failures.push(OverlayFailure {
                    source: entry.path().to_path_buf(),
                    destination: Some(target),
                    error,
                });
            }
        }
    }

    report
}

fn is_library(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(LIBRARY_EXTENSION))
}

fn replace_file(source: &Path, target: &Path) -> io::Result<()> {
    match fs::remove_file(target) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::copy(source, target)?;
    Ok(())
}
