//! Output directory handling and file naming

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use url::Url;

/// Number of digest hex characters appended to every file name
pub const DIGEST_PREFIX_LEN: usize = 8;

/// Used when a URL has no usable basename
const DEFAULT_STEM: &str = "image";

/// Used when the basename carries no recognized image extension
const DEFAULT_EXTENSION: &str = "jpg";

/// Creates the output directory and empties it
///
/// Files are removed; sub-directories are removed only when empty. Individual
/// removal failures are logged and do not abort the run.
pub async fn prepare_output_dir(dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;

    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut removed = 0usize;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let result = match entry.file_type().await {
            Ok(kind) if kind.is_dir() => tokio::fs::remove_dir(&path).await,
            Ok(_) => tokio::fs::remove_file(&path).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!("Could not remove {}: {}", path.display(), e),
        }
    }

    tracing::info!("Output directory ready: {} ({} entries cleared)", dir.display(), removed);
    Ok(())
}

/// Derives `{prefix}{basename}_{digest_prefix}.{ext}` for a media URL
///
/// The basename is the last path segment, restricted to `[A-Za-z0-9._-]`.
///
/// # Examples
///
/// ```
/// use pixel_harvest::output::output_file_name;
///
/// let exts = vec!["png".to_string(), "jpg".to_string()];
/// assert_eq!(
///     output_file_name("site_", "https://cdn.example.com/img/Weapons List.PNG?v=2", "0123456789abcdef", &exts),
///     "site_Weapons_List_01234567.png"
/// );
/// ```
pub fn output_file_name(prefix: &str, url: &str, digest: &str, extensions: &[String]) -> String {
    let basename = url_basename(url);
    let sanitized: String = basename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let (stem, ext) = match sanitized.rsplit_once('.') {
        Some((stem, ext)) if extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) => {
            (stem.to_string(), ext.to_ascii_lowercase())
        }
        _ => (sanitized.clone(), DEFAULT_EXTENSION.to_string()),
    };

    let stem = stem.trim_matches('.');
    let stem = if stem.is_empty() { DEFAULT_STEM } else { stem };
    let digest_prefix = &digest[..digest.len().min(DIGEST_PREFIX_LEN)];

    format!("{}{}_{}.{}", prefix, stem, digest_prefix, ext)
}

/// Writes an accepted payload into the output directory
///
/// A partially written file is removed before the error is returned.
pub async fn persist(dir: &Path, file_name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    let path = dir.join(file_name);
    if let Err(e) = tokio::fs::write(&path, bytes).await {
        let _ = tokio::fs::remove_file(&path).await;
        return Err(e);
    }
    Ok(path)
}

/// Last path segment of a URL, percent-decoded
fn url_basename(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
            .unwrap_or_default(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .unwrap_or_default()
            .to_string(),
    }
}
