use crate::{runner::Environment, settings::BottleSettings, Error};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// A wine prefix together with its settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bottle {
    path: PathBuf,
    settings: BottleSettings,
}

impl Bottle {
    /// Open the prefix at `path`, reading its settings file if there is one
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let settings = BottleSettings::load(&path)?;
        Ok(Self { path, settings })
    }

    pub fn with_settings(path: impl Into<PathBuf>, settings: BottleSettings) -> Self {
        Self {
            path: path.into(),
            settings,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &BottleSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut BottleSettings {
        &mut self.settings
    }

    pub fn save_settings(&self) -> Result<(), Error> {
        self.settings.save(&self.path)
    }

    pub fn drive_c(&self) -> PathBuf {
        self.path.join("drive_c")
    }

    /// 64-bit system libraries
    pub fn system32(&self) -> PathBuf {
        self.drive_c().join("windows").join("system32")
    }

    /// 32-bit system libraries
    pub fn syswow64(&self) -> PathBuf {
        self.drive_c().join("windows").join("syswow64")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramSettings {
    pub environment: BTreeMap<String, String>,
}

/// A Windows executable living inside a bottle
#[derive(Debug, Clone)]
pub struct Program {
    path: PathBuf,
    bottle: Bottle,
    settings: ProgramSettings,
}

impl Program {
    pub fn new(path: impl Into<PathBuf>, bottle: Bottle) -> Self {
        Self::with_settings(path, bottle, ProgramSettings::default())
    }

    pub fn with_settings(
        path: impl Into<PathBuf>,
        bottle: Bottle,
        settings: ProgramSettings,
    ) -> Self {
        Self {
            path: path.into(),
            bottle,
            settings,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bottle(&self) -> &Bottle {
        &self.bottle
    }

    pub fn settings(&self) -> &ProgramSettings {
        &self.settings
    }

    /// Variables this program adds on top of the bottle defaults
    pub fn environment(&self) -> Environment {
        self.settings.environment.iter().collect()
    }
}
