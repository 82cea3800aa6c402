//! Profile picture upload.
//!
//! [`UploadGateway`] turns an [`ImageFile`] into a durable URL. Every
//! implementation runs [`preflight`] first, so unsupported or oversized files
//! never reach the network.
//!
//! [`HttpUploadGateway`] posts a multipart form with a single `file` field and
//! reads `secure_url` from the JSON response. Transport errors, timeouts and
//! 5xx responses are retried with backoff; anything else fails immediately.

use crate::config::UploadConfig;
use futures::future::BoxFuture;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::collections::VecDeque;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::oneshot;
use wizard_runtime::{RetryPolicy, retry_if};

/// Largest accepted image (5 MiB)
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Accepted MIME types
pub const ACCEPTED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];

/// Upload failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// Not a JPEG, PNG or GIF
    #[error("unsupported image type {mime_type}")]
    UnsupportedType {
        /// Rejected MIME type
        mime_type: String,
    },

    /// Bigger than [`MAX_IMAGE_BYTES`]
    #[error("image is {size} bytes, limit is {limit}")]
    TooLarge {
        /// File size in bytes
        size: usize,
        /// Allowed size in bytes
        limit: usize,
    },

    /// The upload service did not produce a URL
    #[error("upload failed: {0}")]
    UploadFailed(String),
}

/// A file picked for upload
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// Original file name
    pub file_name: String,
    /// Declared MIME type
    pub mime_type: String,
    /// File contents
    pub bytes: Arc<[u8]>,
}

impl ImageFile {
    /// Creates a file from its parts
    #[must_use]
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Creates a file whose MIME type is guessed from the path's extension
    #[must_use]
    pub fn from_path_bytes(path: &Path, bytes: Vec<u8>) -> Self {
        let file_name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
        Self::new(file_name, mime_for_path(path), bytes)
    }

    /// Size in bytes
    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size())
            .finish()
    }
}

/// MIME type for a path, by extension
#[must_use]
pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Checks type and size before any network call
///
/// # Errors
///
/// Returns [`UploadError::UnsupportedType`] or [`UploadError::TooLarge`].
pub fn preflight(file: &ImageFile) -> Result<(), UploadError> {
    if !ACCEPTED_MIME_TYPES.contains(&file.mime_type.as_str()) {
        return Err(UploadError::UnsupportedType {
            mime_type: file.mime_type.clone(),
        });
    }
    if file.size() > MAX_IMAGE_BYTES {
        return Err(UploadError::TooLarge {
            size: file.size(),
            limit: MAX_IMAGE_BYTES,
        });
    }
    Ok(())
}

/// Resolves an image to a durable URL
pub trait UploadGateway: Send + Sync {
    /// Uploads `file` and returns its URL
    ///
    /// The returned future owns everything it needs, so it can be moved into
    /// an effect and awaited after the caller's borrow ends.
    ///
    /// # Errors
    ///
    /// Returns a preflight error for invalid files, otherwise
    /// [`UploadError::UploadFailed`].
    fn upload(&self, file: ImageFile) -> BoxFuture<'static, Result<String, UploadError>>;
}

/// Outcome of a single HTTP attempt
#[derive(Debug, Error)]
enum AttemptError {
    #[error("{0}")]
    Transient(String),
    #[error("{0}")]
    Permanent(String),
}

impl AttemptError {
    const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<AttemptError> for UploadError {
    fn from(error: AttemptError) -> Self {
        match error {
            AttemptError::Transient(reason) | AttemptError::Permanent(reason) => {
                Self::UploadFailed(reason)
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    secure_url: Option<String>,
}

/// Uploads over HTTP to a file hosting endpoint
#[derive(Debug, Clone)]
pub struct HttpUploadGateway {
    client: Client,
    endpoint: String,
    retry: RetryPolicy,
}

impl HttpUploadGateway {
    /// Builds a gateway from upload settings
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &UploadConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            retry: config.retry_policy(),
        })
    }

    /// Target endpoint
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn attempt(&self, file: &ImageFile) -> Result<String, AttemptError> {
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| AttemptError::Permanent(e.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    AttemptError::Permanent(e.to_string())
                } else {
                    AttemptError::Transient(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_server_error() {
            return Err(AttemptError::Transient(format!("upload service returned {status}")));
        }
        if !status.is_success() {
            return Err(AttemptError::Permanent(format!("upload service returned {status}")));
        }

        let body: UploadResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AttemptError::Transient(e.to_string())
            } else {
                AttemptError::Permanent(format!("unreadable upload response: {e}"))
            }
        })?;

        match body.secure_url {
            Some(url) if !url.trim().is_empty() => Ok(url),
            _ => Err(AttemptError::Permanent("response has no secure_url".to_string())),
        }
    }
}

impl UploadGateway for HttpUploadGateway {
    fn upload(&self, file: ImageFile) -> BoxFuture<'static, Result<String, UploadError>> {
        let gateway = self.clone();
        Box::pin(async move {
            preflight(&file)?;
            tracing::info!(
                file_name = %file.file_name,
                size = file.size(),
                endpoint = %gateway.endpoint,
                "Uploading profile picture"
            );

            let url = retry_if(&gateway.retry, || gateway.attempt(&file), AttemptError::is_transient)
                .await
                .map_err(|error| {
                    tracing::warn!(file_name = %file.file_name, %error, "Profile picture upload failed");
                    UploadError::from(error)
                })?;

            tracing::info!(file_name = %file.file_name, %url, "Profile picture uploaded");
            Ok(url)
        })
    }
}

enum MockReply {
    Ready(Result<String, UploadError>),
    Deferred(oneshot::Receiver<Result<String, UploadError>>),
}

#[derive(Default)]
struct MockState {
    replies: VecDeque<MockReply>,
    uploaded: Vec<String>,
}

/// Resolves a deferred [`MockUploadGateway`] reply
#[derive(Debug)]
pub struct MockReplyHandle(oneshot::Sender<Result<String, UploadError>>);

impl MockReplyHandle {
    /// Completes the upload with `outcome`
    ///
    /// Returns false if the upload future was already dropped.
    pub fn resolve(self, outcome: Result<String, UploadError>) -> bool {
        self.0.send(outcome).is_ok()
    }
}

/// Scripted gateway for tests and offline runs
///
/// Replies are consumed in call order. With no scripted reply left, uploads
/// succeed with `https://uploads.invalid/<file name>`. Preflight still
/// applies, and only files that pass it are recorded as uploaded.
#[derive(Clone, Default)]
pub struct MockUploadGateway {
    state: Arc<Mutex<MockState>>,
}

impl MockUploadGateway {
    /// Creates a gateway with no scripted replies
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply that resolves immediately
    pub fn push_reply(&self, outcome: Result<String, UploadError>) {
        self.lock().replies.push_back(MockReply::Ready(outcome));
    }

    /// Queues a reply that resolves when the returned handle is used
    #[must_use]
    pub fn defer_reply(&self) -> MockReplyHandle {
        let (sender, receiver) = oneshot::channel();
        self.lock().replies.push_back(MockReply::Deferred(receiver));
        MockReplyHandle(sender)
    }

    /// Names of files that passed preflight, in call order
    #[must_use]
    pub fn uploaded_files(&self) -> Vec<String> {
        self.lock().uploaded.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for MockUploadGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("MockUploadGateway")
            .field("scripted_replies", &state.replies.len())
            .field("uploaded", &state.uploaded)
            .finish()
    }
}

impl UploadGateway for MockUploadGateway {
    fn upload(&self, file: ImageFile) -> BoxFuture<'static, Result<String, UploadError>> {
        let reply = preflight(&file).map(|()| {
            let mut state = self.lock();
            state.uploaded.push(file.file_name.clone());
            state.replies.pop_front()
        });

        Box::pin(async move {
            match reply? {
                Some(MockReply::Ready(outcome)) => outcome,
                Some(MockReply::Deferred(receiver)) => receiver.await.unwrap_or_else(|_| {
                    Err(UploadError::UploadFailed("upload was abandoned".to_string()))
                }),
                None => Ok(format!("https://uploads.invalid/{}", file.file_name)),
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn png(size: usize) -> ImageFile {
        ImageFile::new("me.png", "image/png", vec![0_u8; size])
    }

    #[test]
    fn preflight_accepts_supported_images_up_to_limit() {
        assert!(preflight(&png(MAX_IMAGE_BYTES)).is_ok());
        assert!(preflight(&ImageFile::new("a.gif", "image/gif", vec![1_u8])).is_ok());
        assert!(preflight(&ImageFile::new("a.jpg", "image/jpeg", vec![1_u8])).is_ok());
    }

    #[test]
    fn preflight_rejects_oversized_files() {
        let error = preflight(&png(6 * 1024 * 1024)).unwrap_err();
        assert_eq!(
            error,
            UploadError::TooLarge {
                size: 6 * 1024 * 1024,
                limit: MAX_IMAGE_BYTES
            }
        );
    }

    #[test]
    fn preflight_checks_type_before_size() {
        let file = ImageFile::new("doc.pdf", "application/pdf", vec![0_u8; MAX_IMAGE_BYTES + 1]);
        assert!(matches!(preflight(&file), Err(UploadError::UnsupportedType { .. })));
    }

    #[test]
    fn mime_guess_uses_extension() {
        assert_eq!(mime_for_path(Path::new("me.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("me.gif")), "image/gif");
        assert_eq!(mime_for_path(Path::new("notes")), "application/octet-stream");

        let file = ImageFile::from_path_bytes(Path::new("/tmp/avatar.png"), vec![1, 2, 3]);
        assert_eq!(file.file_name, "avatar.png");
        assert_eq!(file.mime_type, "image/png");
        assert_eq!(file.size(), 3);
    }

    #[test]
    fn debug_output_omits_bytes() {
        let debug = format!("{:?}", png(4));
        assert!(debug.contains("size: 4"));
        assert!(!debug.contains("bytes"));
    }

    #[tokio::test]
    async fn mock_defaults_to_synthetic_url() {
        let gateway = MockUploadGateway::new();
        let url = gateway.upload(png(10)).await.unwrap();
        assert_eq!(url, "https://uploads.invalid/me.png");
        assert_eq!(gateway.uploaded_files(), vec!["me.png".to_string()]);
    }

    #[tokio::test]
    async fn mock_replays_script_in_order() {
        let gateway = MockUploadGateway::new();
        gateway.push_reply(Err(UploadError::UploadFailed("offline".into())));
        gateway.push_reply(Ok("https://cdn.example/2.png".into()));

        assert!(gateway.upload(png(1)).await.is_err());
        assert_eq!(gateway.upload(png(1)).await.unwrap(), "https://cdn.example/2.png");
    }

    #[tokio::test]
    async fn mock_applies_preflight_without_recording() {
        let gateway = MockUploadGateway::new();
        let result = gateway.upload(png(MAX_IMAGE_BYTES + 1)).await;
        assert!(matches!(result, Err(UploadError::TooLarge { .. })));
        assert!(gateway.uploaded_files().is_empty());
    }

    #[tokio::test]
    async fn deferred_reply_waits_for_handle() {
        let gateway = MockUploadGateway::new();
        let handle = gateway.defer_reply();
        let pending = tokio::spawn(gateway.upload(png(1)));

        assert!(handle.resolve(Ok("https://cdn.example/late.png".into())));
        assert_eq!(pending.await.unwrap().unwrap(), "https://cdn.example/late.png");
    }

    #[tokio::test]
    async fn dropped_handle_fails_upload() {
        let gateway = MockUploadGateway::new();
        drop(gateway.defer_reply());
        let result = gateway.upload(png(1)).await;
        assert!(matches!(result, Err(UploadError::UploadFailed(_))));
    }
}
