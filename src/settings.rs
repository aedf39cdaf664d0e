use crate::{
    runner::{Environment, PrefixArch, WindowsVersion},
    Error,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};
use tracing::{debug, info};

/// File inside a prefix holding its [`BottleSettings`]
pub const SETTINGS_FILE: &str = "Metadata.json";

const DXVK_DLL_OVERRIDES: &str = "dxgi,d3d9,d3d10core,d3d11=n,b";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DxvkHud {
    #[default]
    Off,
    Fps,
    Partial,
    Full,
}

impl DxvkHud {
    fn value(self) -> Option<&'static str> {
        match self {
            DxvkHud::Off => None,
            DxvkHud::Fps => Some("fps"),
            DxvkHud::Partial => Some("devinfo,fps,frametimes"),
            DxvkHud::Full => Some("full"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhancedSync {
    None,
    #[default]
    Esync,
    Msync,
}

/// Per-bottle settings, persisted as JSON next to the prefix
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BottleSettings {
    pub windows_version: WindowsVersion,
    pub arch: PrefixArch,
    pub dxvk: bool,
    pub dxvk_async: bool,
    pub dxvk_hud: DxvkHud,
    pub enhanced_sync: EnhancedSync,
    pub metal_hud: bool,
    pub metal_trace: bool,
    pub avx: bool,
    /// Extra variables applied after everything derived from the flags above
    pub environment: BTreeMap<String, String>,
}

impl BottleSettings {
    /// Load the settings stored in `prefix`, falling back to defaults when
    /// the prefix has none yet
    pub fn load(prefix: &Path) -> Result<Self, Error> {
        let path = prefix.join(SETTINGS_FILE);
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, prefix: &Path) -> Result<(), Error> {
        let path = prefix.join(SETTINGS_FILE);
        info!("Saving bottle settings to {}", path.display());
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Layer the variables these settings imply on top of `env`
    pub fn environment_variables(&self, env: &mut Environment) {
        if self.dxvk {
            env.set("WINEDLLOVERRIDES", DXVK_DLL_OVERRIDES);
            if let Some(hud) = self.dxvk_hud.value() {
                env.set("DXVK_HUD", hud);
            }
        }

        if self.dxvk_async {
            env.set("DXVK_ASYNC", "1");
        }

        match self.enhanced_sync {
            EnhancedSync::None => {}
            EnhancedSync::Esync => env.set("WINEESYNC", "1"),
            EnhancedSync::Msync => {
                env.set("WINEMSYNC", "1");
                env.set("WINEESYNC", "1");
            }
        }

        if self.metal_hud {
            env.set("MTL_HUD_ENABLED", "1");
        }

        if self.metal_trace {
            env.set("METAL_CAPTURE_ENABLED", "1");
        }

        if self.avx {
            env.set("ROSETTA_ADVERTISE_AVX", "1");
        }

        env.extend(&self.environment);
    }
}
