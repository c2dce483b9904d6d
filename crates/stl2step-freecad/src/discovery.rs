//! FreeCAD installation discovery and validation.
//!
//! Locates the `freecadcmd` console interpreter by querying:
//! 1. The Windows registry (uninstall entries whose display name starts with "FreeCAD")
//! 2. Common installation directories, including the macOS app bundle
//! 3. The system PATH

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Registry subkey holding uninstall entries.
#[cfg(windows)]
const UNINSTALL_KEY_PATH: &str = r"SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall";

/// Display-name prefix of FreeCAD installer entries.
#[cfg(windows)]
const FREECAD_DISPLAY_PREFIX: &str = "FreeCAD";

/// Executable names of the headless interpreter, in preference order.
#[cfg(windows)]
const LAUNCHER_NAMES: &[&str] = &["FreeCADCmd.exe", "freecadcmd.exe"];
#[cfg(not(windows))]
const LAUNCHER_NAMES: &[&str] = &["freecadcmd", "FreeCADCmd"];

/// Errors from FreeCAD discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// FreeCAD was not found anywhere.
    #[error("FreeCAD installation not found. Searched: registry, common paths, and PATH")]
    NotFound,

    /// Registry access failed (Windows only).
    #[error("Failed to access Windows registry: {reason}")]
    RegistryError {
        /// Description of the failure.
        reason: String,
    },

    /// A directory was given but holds no interpreter.
    #[error("FreeCAD directory found at {install_dir} but no freecadcmd inside")]
    LauncherMissing {
        /// The directory that was searched.
        install_dir: PathBuf,
    },

    /// The configured path does not exist.
    #[error("Configured FreeCAD path does not exist: {path}")]
    PathMissing {
        /// The configured path.
        path: PathBuf,
    },

    /// The interpreter file is unusable.
    #[error("freecadcmd at {path} is unusable: {reason}")]
    Invalid {
        /// The interpreter path.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },
}

/// Information about a discovered FreeCAD installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreeCadInstallation {
    /// Full path to the `freecadcmd` executable.
    pub executable_path: PathBuf,
    /// Installation directory.
    pub install_dir: PathBuf,
    /// Display name from the registry (e.g., "FreeCAD 1.0.0").
    pub display_name: Option<String>,
    /// Version from the registry.
    pub display_version: Option<String>,
    /// How the installation was discovered.
    pub discovery_method: DiscoveryMethod,
}

impl FreeCadInstallation {
    fn found(executable_path: PathBuf, install_dir: PathBuf, method: DiscoveryMethod) -> Self {
        Self {
            executable_path,
            install_dir,
            display_name: None,
            display_version: None,
            discovery_method: method,
        }
    }

    /// Human-readable one-line summary.
    pub fn summary(&self) -> String {
        let name = self.display_name.as_deref().unwrap_or("FreeCAD");
        let method = match self.discovery_method {
            DiscoveryMethod::WindowsRegistry => "registry",
            DiscoveryMethod::CommonPath => "common path",
            DiscoveryMethod::SystemPath => "system PATH",
            DiscoveryMethod::ExplicitConfig => "explicit config",
        };
        match &self.display_version {
            Some(version) => format!(
                "{} v{} at {} (found via {})",
                name,
                version,
                self.executable_path.display(),
                method
            ),
            None => format!(
                "{} at {} (found via {})",
                name,
                self.executable_path.display(),
                method
            ),
        }
    }
}

/// How the FreeCAD installation was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    /// Found via a Windows uninstall registry entry.
    WindowsRegistry,
    /// Found in a common installation directory.
    CommonPath,
    /// Found via the system PATH environment variable.
    SystemPath,
    /// Explicitly configured by the user.
    ExplicitConfig,
}

/// FreeCAD installation discovery engine.
pub struct FreeCadDiscovery;

impl FreeCadDiscovery {
    /// Resolve an installation: the explicit path when given, otherwise
    /// auto-discovery.
    pub fn resolve(explicit: Option<&Path>) -> Result<FreeCadInstallation, DiscoveryError> {
        match explicit.filter(|p| !p.as_os_str().is_empty()) {
            Some(path) => {
                info!(path = %path.display(), "Using explicitly configured FreeCAD path");
                Self::from_explicit_path(path)
            }
            None => Self::discover(),
        }
    }

    /// Attempt to discover a FreeCAD installation.
    ///
    /// Returns the first valid installation found in registry, common
    /// paths, then PATH.
    pub fn discover() -> Result<FreeCadInstallation, DiscoveryError> {
        info!("Searching for FreeCAD installation...");

        #[cfg(windows)]
        {
            match Self::discover_from_registry() {
                Ok(installation) => {
                    info!(
                        path = %installation.executable_path.display(),
                        version = ?installation.display_version,
                        "Found FreeCAD via Windows registry"
                    );
                    return Ok(installation);
                }
                Err(e) => {
                    debug!(error = %e, "Registry discovery failed, trying fallbacks");
                }
            }
        }

        match Self::discover_from_common_paths() {
            Ok(installation) => {
                info!(
                    path = %installation.executable_path.display(),
                    "Found FreeCAD in common installation path"
                );
                return Ok(installation);
            }
            Err(e) => {
                debug!(error = %e, "Common path discovery failed, trying PATH");
            }
        }

        match Self::discover_from_path() {
            Ok(installation) => {
                info!(
                    path = %installation.executable_path.display(),
                    "Found FreeCAD in system PATH"
                );
                Ok(installation)
            }
            Err(e) => {
                debug!(error = %e, "PATH discovery failed");
                Err(DiscoveryError::NotFound)
            }
        }
    }

    /// Discover FreeCAD from uninstall entries in the Windows registry.
    #[cfg(windows)]
    fn discover_from_registry() -> Result<FreeCadInstallation, DiscoveryError> {
        use winreg::RegKey;
        use winreg::enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, KEY_READ};

        let roots = [(HKEY_LOCAL_MACHINE, "HKLM"), (HKEY_CURRENT_USER, "HKCU")];

        for (root_key, root_name) in &roots {
            let uninstall_key = match RegKey::predef(*root_key)
                .open_subkey_with_flags(UNINSTALL_KEY_PATH, KEY_READ)
            {
                Ok(key) => key,
                Err(e) => {
                    debug!(root = root_name, error = %e, "Cannot open Uninstall registry key");
                    continue;
                }
            };

            for subkey_name in uninstall_key.enum_keys().flatten() {
                let Ok(app_key) = uninstall_key.open_subkey_with_flags(&subkey_name, KEY_READ)
                else {
                    continue;
                };

                let display_name: Option<String> = app_key.get_value("DisplayName").ok();
                let is_freecad = display_name
                    .as_deref()
                    .is_some_and(|n| n.starts_with(FREECAD_DISPLAY_PREFIX));
                if !is_freecad {
                    continue;
                }

                debug!(root = root_name, key = %subkey_name, "Found FreeCAD registry entry");

                let Some(install_dir) = Self::read_registry_install_path(&app_key) else {
                    continue;
                };

                if let Some(executable_path) = Self::find_launcher_recursive(&install_dir, 1) {
                    return Ok(FreeCadInstallation {
                        executable_path,
                        install_dir,
                        display_name,
                        display_version: app_key.get_value("DisplayVersion").ok(),
                        discovery_method: DiscoveryMethod::WindowsRegistry,
                    });
                }
            }
        }

        Err(DiscoveryError::RegistryError {
            reason: "No FreeCAD entry found in HKLM or HKCU uninstall registry".to_string(),
        })
    }

    /// Read the installation path from an uninstall entry.
    #[cfg(windows)]
    fn read_registry_install_path(key: &winreg::RegKey) -> Option<PathBuf> {
        for name in ["InstallLocation", "UninstallString"] {
            let Ok(value) = key.get_value::<String, _>(name) else {
                continue;
            };
            let value = value.trim_matches('"');
            let path = if name == "UninstallString" {
                // "C:\Program Files\FreeCAD 1.0\uninstall.exe"
                PathBuf::from(value)
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(value))
            } else {
                PathBuf::from(value)
            };

            if path.is_dir() {
                return Some(path);
            }
        }
        None
    }

    /// Discover FreeCAD from common installation directories.
    fn discover_from_common_paths() -> Result<FreeCadInstallation, DiscoveryError> {
        for candidate_dir in Self::common_install_paths() {
            if !candidate_dir.is_dir() {
                continue;
            }

            if let Some(found) = Self::find_launcher_recursive(&candidate_dir, 1) {
                let install_dir = found
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| candidate_dir.clone());
                return Ok(FreeCadInstallation::found(
                    found,
                    install_dir,
                    DiscoveryMethod::CommonPath,
                ));
            }
        }

        Err(DiscoveryError::NotFound)
    }

    /// Generate common installation path candidates.
    fn common_install_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        #[cfg(windows)]
        {
            for var in ["ProgramFiles", "ProgramFiles(x86)", "LOCALAPPDATA"] {
                let Ok(root) = std::env::var(var) else {
                    continue;
                };
                let root = PathBuf::from(root);
                // Installers use versioned folders such as "FreeCAD 1.0"
                if let Ok(entries) = std::fs::read_dir(&root) {
                    for entry in entries.flatten() {
                        let name = entry.file_name();
                        if name.to_string_lossy().starts_with("FreeCAD") {
                            paths.push(entry.path().join("bin"));
                        }
                    }
                }
            }
        }

        #[cfg(target_os = "macos")]
        {
            paths.push(PathBuf::from("/Applications/FreeCAD.app/Contents/Resources/bin"));
            if let Ok(home) = std::env::var("HOME") {
                paths.push(
                    PathBuf::from(home).join("Applications/FreeCAD.app/Contents/Resources/bin"),
                );
            }
        }

        #[cfg(all(unix, not(target_os = "macos")))]
        {
            paths.push(PathBuf::from("/usr/bin"));
            paths.push(PathBuf::from("/usr/local/bin"));
            paths.push(PathBuf::from("/usr/lib/freecad/bin"));
            paths.push(PathBuf::from("/usr/lib/freecad-daily/bin"));
            paths.push(PathBuf::from("/opt/freecad/bin"));
        }

        paths
    }

    /// Discover FreeCAD from the system PATH.
    fn discover_from_path() -> Result<FreeCadInstallation, DiscoveryError> {
        let path_var = std::env::var_os("PATH").unwrap_or_default();

        for dir_path in std::env::split_paths(&path_var) {
            if let Some(found) = Self::launcher_in(&dir_path) {
                return Ok(FreeCadInstallation::found(
                    found,
                    dir_path,
                    DiscoveryMethod::SystemPath,
                ));
            }
        }

        Err(DiscoveryError::NotFound)
    }

    /// Return the first launcher present directly inside `dir`.
    fn launcher_in(dir: &Path) -> Option<PathBuf> {
        LAUNCHER_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    /// Recursively search for the launcher within a directory.
    fn find_launcher_recursive(dir: &Path, max_depth: usize) -> Option<PathBuf> {
        Self::find_launcher_inner(dir, max_depth, 0)
    }

    fn find_launcher_inner(dir: &Path, max_depth: usize, current_depth: usize) -> Option<PathBuf> {
        if current_depth > max_depth {
            return None;
        }

        if let Some(found) = Self::launcher_in(dir) {
            return Some(found);
        }

        let entries = std::fs::read_dir(dir).ok()?;

        // Sorted so the result does not depend on directory iteration order
        let mut subdirs: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        subdirs.sort();

        subdirs
            .iter()
            .find_map(|sub| Self::find_launcher_inner(sub, max_depth, current_depth + 1))
    }

    /// Create an installation from an explicitly configured path.
    ///
    /// Accepts either the interpreter itself or an install directory, in
    /// which case `bin/` and other direct subdirectories are searched.
    pub fn from_explicit_path(path: &Path) -> Result<FreeCadInstallation, DiscoveryError> {
        if !path.exists() {
            return Err(DiscoveryError::PathMissing {
                path: path.to_path_buf(),
            });
        }

        if path.is_file() {
            let install_dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| path.to_path_buf());
            return Ok(FreeCadInstallation::found(
                path.to_path_buf(),
                install_dir,
                DiscoveryMethod::ExplicitConfig,
            ));
        }

        match Self::find_launcher_recursive(path, 1) {
            Some(found) => Ok(FreeCadInstallation::found(
                found,
                path.to_path_buf(),
                DiscoveryMethod::ExplicitConfig,
            )),
            None => Err(DiscoveryError::LauncherMissing {
                install_dir: path.to_path_buf(),
            }),
        }
    }

    /// Validate that an installation looks functional.
    ///
    /// Checks that the executable exists and is non-empty.
    pub fn validate(installation: &FreeCadInstallation) -> Result<(), DiscoveryError> {
        let exe = &installation.executable_path;

        let metadata = std::fs::metadata(exe).map_err(|e| DiscoveryError::Invalid {
            path: exe.clone(),
            reason: format!("cannot read metadata: {}", e),
        })?;

        if !metadata.is_file() {
            return Err(DiscoveryError::Invalid {
                path: exe.clone(),
                reason: "not a regular file".to_string(),
            });
        }

        if metadata.len() == 0 {
            return Err(DiscoveryError::Invalid {
                path: exe.clone(),
                reason: "file is empty".to_string(),
            });
        }

        Ok(())
    }

    /// Executable names searched for.
    pub fn launcher_names() -> &'static [&'static str] {
        LAUNCHER_NAMES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launcher() -> &'static str {
        FreeCadDiscovery::launcher_names()[0]
    }

    #[test]
    fn test_explicit_path_nonexistent() {
        let result = FreeCadDiscovery::from_explicit_path(Path::new("/nonexistent/freecad"));
        assert!(matches!(result, Err(DiscoveryError::PathMissing { .. })));
    }

    #[test]
    fn test_explicit_path_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let exe = temp.path().join(launcher());
        std::fs::write(&exe, "#!/bin/sh\n").expect("write");

        let installation = FreeCadDiscovery::from_explicit_path(&exe).expect("ok");
        assert_eq!(installation.executable_path, exe);
        assert_eq!(installation.install_dir, temp.path());
        assert_eq!(
            installation.discovery_method,
            DiscoveryMethod::ExplicitConfig
        );
    }

    #[test]
    fn test_explicit_install_dir_searches_bin() {
        let temp = tempfile::tempdir().expect("tempdir");
        let bin = temp.path().join("bin");
        std::fs::create_dir_all(&bin).expect("mkdir");
        let exe = bin.join(launcher());
        std::fs::write(&exe, "#!/bin/sh\n").expect("write");

        let installation = FreeCadDiscovery::from_explicit_path(temp.path()).expect("ok");
        assert_eq!(installation.executable_path, exe);
        assert_eq!(installation.install_dir, temp.path());
    }

    #[test]
    fn test_explicit_dir_without_launcher() {
        let temp = tempfile::tempdir().expect("tempdir");
        let result = FreeCadDiscovery::from_explicit_path(temp.path());
        assert!(matches!(
            result,
            Err(DiscoveryError::LauncherMissing { .. })
        ));
    }

    #[test]
    fn test_find_launcher_depth_limit() {
        let temp = tempfile::tempdir().expect("tempdir");
        let deep = temp.path().join("a").join("b").join("c");
        std::fs::create_dir_all(&deep).expect("mkdir");
        std::fs::write(deep.join(launcher()), "echo").expect("write");

        assert!(FreeCadDiscovery::find_launcher_recursive(temp.path(), 1).is_none());
        assert!(FreeCadDiscovery::find_launcher_recursive(temp.path(), 3).is_some());
    }

    #[test]
    fn test_resolve_prefers_explicit() {
        let temp = tempfile::tempdir().expect("tempdir");
        let exe = temp.path().join(launcher());
        std::fs::write(&exe, "#!/bin/sh\n").expect("write");

        let installation = FreeCadDiscovery::resolve(Some(&exe)).expect("resolve");
        assert_eq!(installation.executable_path, exe);
    }

    #[test]
    fn test_validate_empty_executable() {
        let temp = tempfile::tempdir().expect("tempdir");
        let exe = temp.path().join(launcher());
        std::fs::write(&exe, "").expect("write");

        let installation = FreeCadDiscovery::from_explicit_path(&exe).expect("ok");
        assert!(matches!(
            FreeCadDiscovery::validate(&installation),
            Err(DiscoveryError::Invalid { .. })
        ));
    }

    #[test]
    fn test_validate_missing_executable() {
        let installation = FreeCadInstallation::found(
            PathBuf::from("/nonexistent/freecadcmd"),
            PathBuf::from("/nonexistent"),
            DiscoveryMethod::ExplicitConfig,
        );
        assert!(FreeCadDiscovery::validate(&installation).is_err());
    }

    #[test]
    fn test_summary_mentions_method() {
        let installation = FreeCadInstallation {
            executable_path: PathBuf::from("/opt/freecad/bin/freecadcmd"),
            install_dir: PathBuf::from("/opt/freecad"),
            display_name: Some("FreeCAD 1.0.0".to_string()),
            display_version: Some("1.0.0".to_string()),
            discovery_method: DiscoveryMethod::WindowsRegistry,
        };
        let summary = installation.summary();
        assert!(summary.contains("FreeCAD 1.0.0"));
        assert!(summary.contains("v1.0.0"));
        assert!(summary.contains("registry"));
    }

    #[test]
    fn test_installation_serialization() {
        let installation = FreeCadInstallation::found(
            PathBuf::from("/usr/bin/freecadcmd"),
            PathBuf::from("/usr/bin"),
            DiscoveryMethod::SystemPath,
        );
        let json = serde_json::to_string(&installation).expect("serialize");
        assert!(json.contains("system_path"));
    }
}
