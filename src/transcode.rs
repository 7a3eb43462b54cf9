use async_trait::async_trait;
use tracing::warn;

use crate::error::CatalogResult;
use crate::models::ConversionCandidate;

/// Converts a local video into the canonical container format
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, candidate: &ConversionCandidate) -> CatalogResult<()>;
}

/// Stand-in until a real conversion worker exists
///
/// Logs the request and reports success without touching the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderTranscoder;

#[async_trait]
impl Transcoder for PlaceholderTranscoder {
    async fn transcode(&self, candidate: &ConversionCandidate) -> CatalogResult<()> {
        warn!(
            "Transcoding not implemented; pretending to convert {} ({} -> {})",
            candidate.file_path, candidate.original_format, candidate.target_format
        );
        Ok(())
    }
}
