//! Content-addressed media downloader
//!
//! Every candidate goes through the same gate sequence:
//!
//! 1. URL noise check (no page context is available at this point)
//! 2. Bounded fetch through the media [`BoundedFetcher`], abandoned as soon
//!    as the body passes the byte ceiling
//! 3. SHA-256 digest of the payload, checked against the run's [`DigestSet`]
//! 4. Dimension gate (pixel probe, or a byte-size floor without one)
//! 5. Digest reservation, then the file write
//!
//! The digest is only reserved once a payload has passed every gate, and the
//! reservation is released if the write fails, so a digest in the set always
//! corresponds to a file on disk.

use crate::classify::Classifier;
use crate::config::LimitsConfig;
use crate::crawler::fetcher::{BoundedFetcher, FetchError};
use crate::output::{output_file_name, persist, RejectCategory};
use crate::state::DigestSet;
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::PathBuf;
use thiserror::Error;

/// Reports the pixel dimensions of an encoded image
pub trait DimensionProbe: Send + Sync {
    fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32), String>;
}

/// Header-only dimension probe backed by the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageProbe;

impl DimensionProbe for ImageProbe {
    fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32), String> {
        image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| e.to_string())?
            .into_dimensions()
            .map_err(|e| e.to_string())
    }
}

/// Why a media candidate was not saved
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RejectReason {
    #[error("matched noise rule '{rule}'")]
    Noise { rule: String },

    #[error("fetch failed: {0}")]
    Transport(FetchError),

    #[error("cancelled")]
    Cancelled,

    #[error("payload of {len} bytes exceeds the byte ceiling")]
    TooManyBytes { len: usize },

    #[error("duplicate content {digest}")]
    Duplicate { digest: String },

    #[error("{width}x{height} is below the minimum dimension")]
    TooSmall { width: u32, height: u32 },

    #[error("{width}x{height} exceeds the maximum dimensions")]
    TooLarge { width: u32, height: u32 },

    #[error("payload of {len} bytes is below the minimum size")]
    BelowMinBytes { len: usize },

    #[error("could not read image dimensions: {0}")]
    Decode(String),

    #[error("could not save file: {0}")]
    Io(String),
}

impl RejectReason {
    /// Stats counter this rejection is folded into
    pub fn category(&self) -> RejectCategory {
        match self {
            RejectReason::Duplicate { .. } => RejectCategory::Duplicate,
            RejectReason::TooManyBytes { .. }
            | RejectReason::TooSmall { .. }
            | RejectReason::TooLarge { .. }
            | RejectReason::BelowMinBytes { .. } => RejectCategory::SizeOrDimension,
            RejectReason::Noise { .. }
            | RejectReason::Transport(_)
            | RejectReason::Decode(_)
            | RejectReason::Io(_)
            | RejectReason::Cancelled => RejectCategory::Other,
        }
    }
}

impl From<FetchError> for RejectReason {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::TooLarge { len, .. } => RejectReason::TooManyBytes { len },
            FetchError::Cancelled => RejectReason::Cancelled,
            other => RejectReason::Transport(other),
        }
    }
}

/// Result of one download attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Accepted {
        url: String,
        path: PathBuf,
        digest: String,
    },
    Rejected {
        url: String,
        reason: RejectReason,
    },
}

impl DownloadOutcome {
    pub fn url(&self) -> &str {
        match self {
            DownloadOutcome::Accepted { url, .. } | DownloadOutcome::Rejected { url, .. } => url,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, DownloadOutcome::Accepted { .. })
    }
}

/// Downloads, gates and persists media candidates
pub struct Downloader {
    fetcher: BoundedFetcher,
    classifier: Classifier,
    probe: Option<Box<dyn DimensionProbe>>,
    limits: LimitsConfig,
    output_dir: PathBuf,
    file_prefix: String,
    extensions: Vec<String>,
}

impl Downloader {
    pub fn new(
        fetcher: BoundedFetcher,
        classifier: Classifier,
        limits: LimitsConfig,
        output_dir: impl Into<PathBuf>,
        file_prefix: impl Into<String>,
        extensions: Vec<String>,
    ) -> Self {
        let probe: Option<Box<dyn DimensionProbe>> = if limits.decode_dimensions {
            Some(Box::new(ImageProbe))
        } else {
            None
        };

        Self {
            fetcher,
            classifier,
            probe,
            limits,
            output_dir: output_dir.into(),
            file_prefix: file_prefix.into(),
            extensions,
        }
    }

    /// Replaces the dimension probe; `None` selects the byte-size heuristic
    pub fn with_probe(mut self, probe: Option<Box<dyn DimensionProbe>>) -> Self {
        self.probe = probe;
        self
    }

    /// Runs one candidate through the full gate sequence
    pub async fn download(&self, url: &str, digests: &DigestSet) -> DownloadOutcome {
        match self.try_download(url, digests).await {
            Ok((path, digest)) => {
                tracing::info!("Saved {} -> {}", url, path.display());
                DownloadOutcome::Accepted {
                    url: url.to_string(),
                    path,
                    digest,
                }
            }
            Err(reason) => {
                match (&reason, reason.category()) {
                    (RejectReason::Cancelled, _) => tracing::debug!("Skipped {}: cancelled", url),
                    (_, RejectCategory::Other) => tracing::warn!("Rejected {}: {}", url, reason),
                    _ => tracing::debug!("Rejected {}: {}", url, reason),
                }
                DownloadOutcome::Rejected {
                    url: url.to_string(),
                    reason,
                }
            }
        }
    }

    async fn try_download(&self, url: &str, digests: &DigestSet) -> Result<(PathBuf, String), RejectReason> {
        if let Some(rule) = self.classifier.noise_rule(url, "") {
            return Err(RejectReason::Noise {
                rule: rule.to_string(),
            });
        }

        let bytes = self.fetcher.fetch_media(url, self.limits.max_bytes).await?.bytes;

        let digest = hex::encode(Sha256::digest(&bytes));
        if digests.contains(&digest) {
            return Err(RejectReason::Duplicate { digest });
        }

        self.check_dimensions(&bytes)?;

        // A concurrent download of the same payload may have won the race
        if !digests.reserve(&digest) {
            return Err(RejectReason::Duplicate { digest });
        }

        let file_name = output_file_name(&self.file_prefix, url, &digest, &self.extensions);
        match persist(&self.output_dir, &file_name, &bytes).await {
            Ok(path) => Ok((path, digest)),
            Err(e) => {
                digests.release(&digest);
                Err(RejectReason::Io(e.to_string()))
            }
        }
    }

    fn check_dimensions(&self, bytes: &[u8]) -> Result<(), RejectReason> {
        let probe = match &self.probe {
            Some(probe) => probe,
            None => {
                if bytes.len() < self.limits.min_bytes_without_decoder {
                    return Err(RejectReason::BelowMinBytes { len: bytes.len() });
                }
                return Ok(());
            }
        };

        let (width, height) = probe.dimensions(bytes).map_err(RejectReason::Decode)?;

        if width < self.limits.min_dimension || height < self.limits.min_dimension {
            return Err(RejectReason::TooSmall { width, height });
        }

        if width > self.limits.max_width || height > self.limits.max_height {
            return Err(RejectReason::TooLarge { width, height });
        }

        Ok(())
    }
}
