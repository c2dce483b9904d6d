//! # stl2step-freecad
//!
//! Converts STL meshes to STEP solids by driving FreeCAD's headless
//! `freecadcmd` interpreter with one generated Python script per file.
//!
//! ## FreeCAD Discovery
//!
//! When no executable is configured, the backend looks for `freecadcmd`
//! in the Windows uninstall registry, in common installation directories
//! (including the macOS application bundle) and finally on `PATH`.

pub mod converter;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod scripting;

pub use converter::FreeCadConverter;
pub use discovery::{DiscoveryMethod, FreeCadDiscovery, FreeCadInstallation};
pub use error::FreeCadError;
