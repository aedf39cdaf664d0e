use super::{Environment, WineCommand, WineLayout};
use crate::{
    bottle::{Bottle, Program},
    overlay::{DllOverlay, OverlayReport},
    Error,
};
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, str::FromStr};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Wine {
    layout: WineLayout,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrefixArch {
    Win32,
    #[default]
    Win64,
}

/// Windows versions `winecfg -v` reports and accepts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowsVersion {
    #[serde(rename = "winxp")]
    WinXP,
    #[serde(rename = "winxp64")]
    WinXP64,
    #[serde(rename = "vista")]
    Vista,
    #[serde(rename = "win7")]
    Win7,
    #[serde(rename = "win8")]
    Win8,
    #[serde(rename = "win81")]
    Win81,
    #[default]
    #[serde(rename = "win10")]
    Win10,
    #[serde(rename = "win11")]
    Win11,
}

impl WindowsVersion {
    pub const ALL: [WindowsVersion; 8] = [
        WindowsVersion::WinXP,
        WindowsVersion::WinXP64,
        WindowsVersion::Vista,
        WindowsVersion::Win7,
        WindowsVersion::Win8,
        WindowsVersion::Win81,
        WindowsVersion::Win10,
        WindowsVersion::Win11,
    ];

    /// Identifier as understood by winecfg
    pub fn as_str(self) -> &'static str {
        match self {
            WindowsVersion::WinXP => "winxp",
            WindowsVersion::WinXP64 => "winxp64",
            WindowsVersion::Vista => "vista",
            WindowsVersion::Win7 => "win7",
            WindowsVersion::Win8 => "win8",
            WindowsVersion::Win81 => "win81",
            WindowsVersion::Win10 => "win10",
            WindowsVersion::Win11 => "win11",
        }
    }
}

impl fmt::Display for WindowsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindowsVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|version| version.as_str() == s)
            .ok_or_else(|| Error::InvalidResponse {
                output: s.to_string(),
            })
    }
}

impl TryFrom<&Path> for Wine {
    type Error = Error;

    /// Build a runner from a libraries directory laid out as described by
    /// [`WineLayout::from_libraries`], checking that the binaries are there
    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let layout = WineLayout::from_libraries(path);
        layout.validate()?;
        Ok(Wine::new(layout))
    }
}

impl Wine {
    pub fn new(layout: WineLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &WineLayout {
        &self.layout
    }

    /// Run wine with `args`
    ///
    /// Without a bottle the process inherits our environment untouched. With
    /// one, the environment is built from the prefix defaults, then
    /// `environment`, then whatever the bottle settings derive. If the bottle
    /// has DXVK enabled the overlay is installed before launching.
    pub async fn run<I, S>(
        &self,
        args: I,
        bottle: Option<&Bottle>,
        environment: Option<&Environment>,
    ) -> Result<String, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_in(args, bottle, environment, self.layout.bin_dir())
            .await
    }

    async fn run_in<I, S>(
        &self,
        args: I,
        bottle: Option<&Bottle>,
        environment: Option<&Environment>,
        working_dir: &Path,
    ) -> Result<String, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut command = WineCommand::new(self.layout.wine_binary())
            .args(args)
            .current_dir(working_dir);

        if let Some(bottle) = bottle {
            if bottle.settings().dxvk {
                self.enable_dxvk(bottle);
            }
            command = command.environment(bottle_environment(bottle, environment));
        }

        command.output().await
    }

    /// Run wineserver for `bottle`, whose environment only carries the prefix
    pub async fn run_wineserver<I, S>(&self, args: I, bottle: &Bottle) -> Result<String, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        WineCommand::new(self.layout.wineserver_binary())
            .args(args)
            .current_dir(self.layout.bin_dir())
            .environment(Environment::prefix_only(bottle.path()))
            .output()
            .await
    }

    /// Wine's version number, e.g. `8.0.2`
    pub async fn version(&self) -> Result<String, Error> {
        let output = self.run(["--version"], None, None).await?;
        Ok(parse_wine_version(&output))
    }

    pub async fn windows_version(&self, bottle: &Bottle) -> Result<WindowsVersion, Error> {
        let output = self.run(["winecfg", "-v"], Some(bottle), None).await?;
        parse_windows_version(&output)
    }

    /// Open the configuration dialog
    pub async fn cfg(&self, bottle: &Bottle) -> Result<String, Error> {
        self.run(["winecfg"], Some(bottle), None).await
    }

    pub async fn change_windows_version(
        &self,
        bottle: &Bottle,
        version: WindowsVersion,
    ) -> Result<String, Error> {
        self.run(["winecfg", "-v", version.as_str()], Some(bottle), None)
            .await
    }

    pub async fn run_program(&self, program: &Program) -> Result<String, Error> {
        let path = program.path().to_string_lossy().into_owned();
        let working_dir = program
            .path()
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(self.layout.bin_dir());
        let environment = program.environment();
        self.run_in(
            ["start".to_string(), "/unix".to_string(), path],
            Some(program.bottle()),
            Some(&environment),
            working_dir,
        )
        .await
    }

    /// Ask wineserver to kill every process running in the bottle
    pub async fn kill_bottle(&self, bottle: &Bottle) -> Result<String, Error> {
        self.run_wineserver(["-k"], bottle).await
    }

    /// Install the bundled DXVK libraries into the bottle
    pub fn enable_dxvk(&self, bottle: &Bottle) -> OverlayReport {
        let report = DllOverlay::from_layout(&self.layout).install(bottle);
        if report.is_complete() {
            info!(
                "Installed {} DXVK libraries into {}",
                report.installed().len(),
                bottle.path().display()
            );
        } else {
            warn!(
                "DXVK partially installed into {}: {} replaced, {} failed",
                bottle.path().display(),
                report.installed().len(),
                report.failures().len()
            );
        }
        report
    }
}

/// Environment for a bottle invocation: prefix defaults, caller overrides,
/// then the bottle's settings
pub fn bottle_environment(bottle: &Bottle, overrides: Option<&Environment>) -> Environment {
    let mut env = Environment::for_prefix(bottle.path());
    if let Some(overrides) = overrides {
        env.extend(overrides);
    }
    bottle.settings().environment_variables(&mut env);
    env
}

/// Strip the `wine-` prefix from `wine --version` output
///
/// Some builds append a description after the number (`wine-8.0.2 (Staging)`),
/// so everything from the first whitespace on is dropped.
pub fn parse_wine_version(output: &str) -> String {
    let version = output.strip_prefix("wine-").unwrap_or(output);
    match version.find(char::is_whitespace) {
        Some(index) => version[..index].to_string(),
        None => version.trim().to_string(),
    }
}

/// Interpret the last non-empty line of `winecfg -v` output
pub fn parse_windows_version(output: &str) -> Result<WindowsVersion, Error> {
    let invalid = || Error::InvalidResponse {
        output: output.to_string(),
    };
    let last = output
        .lines()
        .map(str::trim)
        .rev()
        .find(|line| !line.is_empty())
        .ok_or_else(invalid)?;
    last.parse().map_err(|_| invalid())
}
