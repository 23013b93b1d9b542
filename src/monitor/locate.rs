//! Monitor tool discovery
//!
//! Resolution order: configured path, well-known per-user install
//! locations, then the bare executable name left for search-path lookup
//! at call time.

use super::MonitorTool;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Executable name used when nothing better is found
pub const DEFAULT_EXECUTABLE: &str = "Twinkle Tray.exe";

/// Locate the monitor tool using the current user's local data directory
pub fn locate(configured: Option<&Path>) -> MonitorTool {
    let local_data = dirs::data_local_dir();
    locate_in(configured, local_data.as_deref())
}

/// Locate the monitor tool relative to an explicit local data directory
pub fn locate_in(configured: Option<&Path>, local_data: Option<&Path>) -> MonitorTool {
    if let Some(path) = configured {
        if path.exists() {
            debug!("Using configured monitor tool at {:?}", path);
            return MonitorTool::new(path.to_path_buf(), true);
        }
        warn!(
            "Configured monitor tool {:?} does not exist, trying install locations",
            path
        );
    }

    if let Some(base) = local_data {
        for candidate in well_known_locations(base) {
            debug!("Checking monitor tool candidate {:?}", candidate);
            if candidate.exists() {
                return MonitorTool::new(candidate, true);
            }
        }
    }

    MonitorTool::new(PathBuf::from(DEFAULT_EXECUTABLE), false)
}

fn well_known_locations(base: &Path) -> [PathBuf; 2] {
    [
        base.join("Programs").join("twinkle-tray").join(DEFAULT_EXECUTABLE),
        base.join("twinkle-tray").join(DEFAULT_EXECUTABLE),
    ]
}
