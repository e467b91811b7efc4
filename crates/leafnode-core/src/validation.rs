//! Candidate validation before a resolver accepts a result

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::ProviderError;

/// Images smaller than this are treated as placeholders
pub const MIN_IMAGE_BYTES: u64 = 1000;

/// Gate applied to each candidate before the resolver accepts it
#[async_trait]
pub trait CandidateValidator<T: Sync>: Send + Sync {
    async fn validate(&self, candidate: &T) -> bool;
}

/// Response metadata from a HEAD request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHead {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

/// Issues lightweight existence checks against image URLs
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn head(&self, url: &str) -> Result<ImageHead, ProviderError>;
}

/// Candidate that points at an image
pub trait ImageCandidate {
    fn image_url(&self) -> &str;
}

/// Outcome of checking one image URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageCheck {
    Valid,
    /// The server answered but the response is not a usable image
    Broken(String),
    /// The server could not be reached
    Unreachable(String),
}

impl ImageCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, ImageCheck::Valid)
    }
}

impl fmt::Display for ImageCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageCheck::Valid => write!(f, "valid"),
            ImageCheck::Broken(reason) => write!(f, "broken: {}", reason),
            ImageCheck::Unreachable(reason) => write!(f, "unreachable: {}", reason),
        }
    }
}

/// Checks that a URL serves a non-trivial image
#[derive(Clone)]
pub struct ImageValidator {
    probe: Arc<dyn ImageProbe>,
}

impl ImageValidator {
    pub fn new(probe: Arc<dyn ImageProbe>) -> Self {
        Self { probe }
    }

    /// Classify an image URL
    pub async fn check(&self, url: &str) -> ImageCheck {
        let head = match self.probe.head(url).await {
            Ok(head) => head,
            Err(e) => return ImageCheck::Unreachable(e.to_string()),
        };

        let check = classify(&head);
        debug!("Image check for {}: {}", url, check);
        check
    }
}

fn classify(head: &ImageHead) -> ImageCheck {
    if !(200..300).contains(&head.status) {
        return ImageCheck::Broken(format!("HTTP {}", head.status));
    }

    match head.content_type.as_deref() {
        Some(ct) if ct.trim().to_ascii_lowercase().starts_with("image/") => {}
        Some(ct) => return ImageCheck::Broken(format!("content-type {}", ct)),
        None => return ImageCheck::Broken("missing content-type".to_string()),
    }

    // Chunked responses carry no length; only reject lengths we can see
    if let Some(len) = head.content_length
        && len < MIN_IMAGE_BYTES
    {
        return ImageCheck::Broken(format!("content-length {} too small", len));
    }

    ImageCheck::Valid
}

#[async_trait]
impl<T> CandidateValidator<T> for ImageValidator
where
    T: ImageCandidate + Sync + 'static,
{
    async fn validate(&self, candidate: &T) -> bool {
        self.check(candidate.image_url()).await.is_valid()
    }
}
