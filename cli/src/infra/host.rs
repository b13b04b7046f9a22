//! Host inspection: implements `HostInspector` against the running system.

use std::io::IsTerminal as _;
use std::path::{Path, PathBuf};

use crate::application::ports::HostInspector;

/// Location of the Linux distribution release metadata.
pub const OS_RELEASE: &str = "/etc/os-release";

/// Production `HostInspector`.
pub struct SystemHost;

impl HostInspector for SystemHost {
    fn os_release(&self) -> Option<String> {
        std::fs::read_to_string(OS_RELEASE).ok()
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        self.search_path()
            .into_iter()
            .map(|dir| dir.join(program))
            .find(|candidate| is_executable_file(candidate))
    }

    fn is_interactive(&self) -> bool {
        std::io::stdin().is_terminal()
    }

    fn search_path(&self) -> Vec<PathBuf> {
        std::env::var_os("PATH")
            .map(|p| std::env::split_paths(&p).collect())
            .unwrap_or_default()
    }
}

fn is_executable_file(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.is_file() && meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        meta.is_file()
    }
}
