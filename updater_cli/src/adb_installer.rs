use std::path::Path;
use std::process::Command;

use updater_core::installer::Installer;
use updater_core::types::types::DownloadError;

/// Installs onto a connected device with `adb` and reads package versions
/// with `aapt`.
pub struct AdbInstaller;

impl Installer for AdbInstaller {
    fn install_apk(&self, file: &Path, authority: &str) -> Result<(), DownloadError> {
        log::info!("[AdbInstaller] installing {} ({})", file.display(), authority);
        let output = Command::new("adb").arg("install").arg("-r").arg(file).output()?;
        if !output.status.success() {
            return Err(DownloadError::Install(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(())
    }

    fn apk_version_matches(&self, version_code: i64, file: &Path) -> Result<bool, DownloadError> {
        let output = Command::new("aapt").arg("dump").arg("badging").arg(file).output()?;
        if !output.status.success() {
            return Err(DownloadError::Install(format!(
                "aapt could not read {}",
                file.display()
            )));
        }
        let badging = String::from_utf8_lossy(&output.stdout);
        Ok(parse_version_code(&badging) == Some(version_code))
    }
}

/// Extracts `versionCode='N'` from `aapt dump badging` output.
fn parse_version_code(badging: &str) -> Option<i64> {
    let key = "versionCode='";
    let start = badging.find(key)? + key.len();
    let rest = &badging[start..];
    let end = rest.find('\'')?;
    rest[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_code() {
        let line = "package: name='com.example.demo' versionCode='42' versionName='1.4.2'";
        assert_eq!(parse_version_code(line), Some(42));
        assert_eq!(parse_version_code("package: name='x'"), None);
    }
}
