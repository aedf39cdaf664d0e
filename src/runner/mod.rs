mod command;
mod environment;
mod wine;

pub use command::WineCommand;
pub use environment::{Environment, WINEBOOT_HIDE_DIALOG, WINEDEBUG, WINEPREFIX};
pub use wine::{
    bottle_environment, parse_windows_version, parse_wine_version, PrefixArch, Wine,
    WindowsVersion,
};

use crate::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where the bundled wine build and DXVK libraries live
///
/// Every path is explicit, a [`Wine`] never looks anything up on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WineLayout {
    bin_dir: PathBuf,
    wine_binary: PathBuf,
    wineserver_binary: PathBuf,
    dxvk_dir: PathBuf,
}

impl WineLayout {
    pub fn new(
        bin_dir: impl Into<PathBuf>,
        wine_binary: impl Into<PathBuf>,
        wineserver_binary: impl Into<PathBuf>,
        dxvk_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            bin_dir: bin_dir.into(),
            wine_binary: wine_binary.into(),
            wineserver_binary: wineserver_binary.into(),
            dxvk_dir: dxvk_dir.into(),
        }
    }

    /// Conventional layout below a libraries directory:
    ///
    /// ```text
    /// <libraries>/Wine/bin/wine64
    /// <libraries>/Wine/bin/wineserver
    /// <libraries>/DXVK/x64/*.dll
    /// <libraries>/DXVK/x32/*.dll
    /// ```
    pub fn from_libraries(libraries: &Path) -> Self {
        let bin_dir = libraries.join("Wine").join("bin");
        Self {
            wine_binary: bin_dir.join("wine64"),
            wineserver_binary: bin_dir.join("wineserver"),
            dxvk_dir: libraries.join("DXVK"),
            bin_dir,
        }
    }

    /// Check that both binaries exist and are files
    pub fn validate(&self) -> Result<(), Error> {
        if !self.bin_dir.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("'{}' does not exist", self.bin_dir.display()),
            )
            .into());
        }

        for executable in [&self.wine_binary, &self.wineserver_binary] {
            if !executable.is_file() {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!(
                        "Executable '{}' not found in directory '{}'",
                        executable.display(),
                        self.bin_dir.display()
                    ),
                )
                .into());
            }
        }

        Ok(())
    }

    /// Working directory of every invocation
    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    pub fn wine_binary(&self) -> &Path {
        &self.wine_binary
    }

    pub fn wineserver_binary(&self) -> &Path {
        &self.wineserver_binary
    }

    pub fn dxvk_dir(&self) -> &Path {
        &self.dxvk_dir
    }

    /// 64-bit overlay libraries, installed into `system32`
    pub fn dxvk_x64(&self) -> PathBuf {
        self.dxvk_dir.join("x64")
    }

    /// 32-bit overlay libraries, installed into `syswow64`
    pub fn dxvk_x32(&self) -> PathBuf {
        self.dxvk_dir.join("x32")
    }
}
