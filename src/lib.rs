pub mod bottle;
mod error;
pub mod overlay;
pub mod runner;
pub mod settings;

pub use bottle::{Bottle, Program, ProgramSettings};
pub use error::Error;
pub use overlay::{DllOverlay, OverlayReport};
pub use runner::{Environment, Wine, WineLayout, WindowsVersion};
pub use settings::BottleSettings;
