use actix_multipart::Field;
use actix_web::{error, web, Error};
use file_format::FileFormat;
use futures_util::StreamExt;
use std::path::Path;

/// Largest image accepted for a post.
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// Subdirectory of the media root holding post images.
pub const POST_IMAGE_DIR: &str = "posts";

/// An uploaded file held in memory along with its content hash.
pub struct UploadPayload {
    pub data: Vec<u8>,
    pub filename: String,
    pub mime: Option<mime::Mime>,
    pub hash: blake3::Hash,
}

impl std::fmt::Debug for UploadPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadPayload")
            .field("filename", &self.filename)
            .field("mime", &self.mime)
            .field("size", &self.data.len())
            .field("hash", &self.hash.to_hex().as_str())
            .finish()
    }
}

impl UploadPayload {
    pub fn from_bytes(data: Vec<u8>, filename: &str, mime: Option<mime::Mime>) -> Self {
        Self {
            hash: blake3::hash(&data),
            data,
            filename: filename.to_owned(),
            mime,
        }
    }

    /// File extension for accepted image types, or None if the upload is not an image we store.
    /// The declared type must be an image and the extension follows the file's signature bytes.
    pub fn image_extension(&self) -> Option<&'static str> {
        let mime = self.mime.as_ref()?;
        if mime.type_() != mime::IMAGE {
            return None;
        }
        match FileFormat::from_bytes(&self.data) {
            FileFormat::GraphicsInterchangeFormat => Some("gif"),
            FileFormat::PortableNetworkGraphics | FileFormat::AnimatedPortableNetworkGraphics => {
                Some("png")
            }
            FileFormat::JointPhotographicExpertsGroup => Some("jpg"),
            FileFormat::Webp => Some("webp"),
            FileFormat::WindowsBitmap => Some("bmp"),
            _ => None,
        }
    }

    /// Content-addressed path relative to the media root.
    pub fn storage_path(&self) -> Option<String> {
        self.image_extension()
            .map(|ext| format!("{}/{}.{}", POST_IMAGE_DIR, self.hash.to_hex(), ext))
    }
}

/// Reads a multipart file field into memory, hashing as it goes.
/// Returns None for the empty part browsers send when no file was chosen.
pub async fn read_file_field(field: &mut Field) -> Result<Option<UploadPayload>, Error> {
    let filename = field
        .content_disposition()
        .get_filename()
        .unwrap_or_default()
        .to_owned();
    let mime = field.content_type().cloned();

    let mut hasher = blake3::Hasher::new();
    let mut buf: Vec<u8> = Vec::with_capacity(8 * 1024);
    while let Some(chunk) = field.next().await {
        let bytes = chunk.map_err(|e| {
            log::error!("read_file_field: multipart read error: {}", e);
            error::ErrorBadRequest("Error reading upload data.")
        })?;
        if buf.len() + bytes.len() > MAX_IMAGE_SIZE {
            return Err(error::ErrorPayloadTooLarge("Upload is too large."));
        }
        hasher.update(&bytes);
        buf.extend_from_slice(&bytes);
    }

    if buf.is_empty() && filename.is_empty() {
        return Ok(None);
    }

    Ok(Some(UploadPayload {
        data: buf,
        filename,
        mime,
        hash: hasher.finalize(),
    }))
}

/// Writes the payload under `media_dir` and returns its relative path.
/// Identical uploads share one file.
pub async fn save_image(media_dir: &Path, payload: &UploadPayload) -> Result<String, Error> {
    let relative = payload
        .storage_path()
        .ok_or_else(|| error::ErrorBadRequest("Upload is not a supported image."))?;
    let target = media_dir.join(&relative);

    if target.exists() {
        log::debug!("save_image: {} already stored", relative);
        return Ok(relative);
    }

    let data = payload.data.to_owned();
    web::block(move || {
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, data)
    })
    .await
    .map_err(error::ErrorInternalServerError)?
    .map_err(|e| {
        log::error!("save_image: {}", e);
        error::ErrorInternalServerError("Failed to store image.")
    })?;

    log::info!("save_image: stored {}", relative);
    Ok(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIF: &[u8] = b"GIF89a\x02\x00\x01\x00\x80\x00\x00";
    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR";

    #[test]
    fn test_image_extension() {
        let gif = UploadPayload::from_bytes(GIF.to_vec(), "small.gif", Some(mime::IMAGE_GIF));
        assert_eq!(gif.image_extension(), Some("gif"));
        assert!(gif
            .storage_path()
            .unwrap()
            .starts_with(&format!("{}/", POST_IMAGE_DIR)));

        let text = UploadPayload::from_bytes(b"hello".to_vec(), "a.txt", Some(mime::TEXT_PLAIN));
        assert_eq!(text.image_extension(), None);
        assert_eq!(text.storage_path(), None);

        let svg = UploadPayload::from_bytes(b"<svg/>".to_vec(), "a.svg", Some(mime::IMAGE_SVG));
        assert_eq!(svg.image_extension(), None);

        let unknown = UploadPayload::from_bytes(GIF.to_vec(), "a", None);
        assert_eq!(unknown.image_extension(), None);
    }

    #[test]
    fn test_signature_decides_extension() {
        // Declared as an image, but the bytes are not one.
        let disguised =
            UploadPayload::from_bytes(b"just some text".to_vec(), "a.gif", Some(mime::IMAGE_GIF));
        assert_eq!(disguised.image_extension(), None);

        // The bytes win over a mismatched declaration.
        let png = UploadPayload::from_bytes(PNG.to_vec(), "a.gif", Some(mime::IMAGE_GIF));
        assert_eq!(png.image_extension(), Some("png"));
    }

    #[test]
    fn test_storage_path_is_content_addressed() {
        let same = [GIF, b"same"].concat();
        let diff = [GIF, b"diff"].concat();
        let a = UploadPayload::from_bytes(same.clone(), "a.gif", Some(mime::IMAGE_GIF));
        let b = UploadPayload::from_bytes(same, "b.gif", Some(mime::IMAGE_GIF));
        let c = UploadPayload::from_bytes(diff, "a.gif", Some(mime::IMAGE_GIF));
        assert_eq!(a.storage_path(), b.storage_path());
        assert_ne!(a.storage_path(), c.storage_path());
    }
}
