use std::path::PathBuf;

use updater_core::platform::AppContext;

/// Maps app-scoped storage onto the desktop's per-user data directories.
pub struct DesktopContext {
    app_name: String,
    package_name: String,
}

impl DesktopContext {
    pub fn new(app_name: String, package_name: String) -> Self {
        Self {
            app_name,
            package_name,
        }
    }
}

impl AppContext for DesktopContext {
    fn external_files_dirs(&self, kind: &str) -> Vec<PathBuf> {
        dirs_next::data_local_dir()
            .map(|dir| dir.join(&self.package_name).join(kind))
            .into_iter()
            .collect()
    }

    fn primary_external_files_dir(&self, kind: &str) -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(format!(".{}", self.package_name)).join(kind))
    }

    fn app_name(&self) -> String {
        self.app_name.clone()
    }

    fn package_name(&self) -> String {
        self.package_name.clone()
    }

    fn app_icon(&self) -> i32 {
        0
    }

    fn supports_notification_channels(&self) -> bool {
        false
    }
}
