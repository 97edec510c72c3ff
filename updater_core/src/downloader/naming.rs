use reqwest::Url;

use crate::types::types::DownloadError;

const APK_SUFFIX: &str = ".apk";

/// Derives a filename for a download that has none configured.
///
/// Uses the last path segment when it already names an `.apk`, otherwise
/// falls back to `<app name>.apk`.
pub fn app_full_name(url: &str, app_name: &str) -> Result<String, DownloadError> {
    let parsed = Url::parse(url).map_err(|e| DownloadError::InvalidUrl(format!("{}: {}", url, e)))?;

    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    if segment.len() > APK_SUFFIX.len() && segment.to_ascii_lowercase().ends_with(APK_SUFFIX) {
        return Ok(segment.to_string());
    }

    let base: String = app_name
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() || c == '/' || c == '\\' { '_' } else { c })
        .collect();
    let base = if base.is_empty() { "app".to_string() } else { base };
    Ok(format!("{}{}", base, APK_SUFFIX))
}
