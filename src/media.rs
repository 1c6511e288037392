//! Uploaded post images: validation and storage under the media root.

use std::path::Path;

use image::ImageFormat;

/// Directory (relative to the media root) holding post images.
pub const POSTS_DIR: &str = "posts";

/// Maximum accepted upload size.
pub const MAX_IMAGE_BYTES: usize = 8 * 1024 * 1024;

/// A file received from a multipart form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Check that `bytes` is a complete image in a supported format.
pub fn validate_image(bytes: &[u8]) -> Result<ImageFormat, String> {
    const INVALID: &str =
        "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

    if bytes.is_empty() {
        return Err("The submitted file is empty.".to_string());
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(format!(
            "The image is too large. Maximum size is {} MB.",
            MAX_IMAGE_BYTES / (1024 * 1024)
        ));
    }

    let format = image::guess_format(bytes).map_err(|_| INVALID.to_string())?;
    image::load_from_memory_with_format(bytes, format).map_err(|_| INVALID.to_string())?;
    Ok(format)
}

/// Write a validated image under `<media_root>/posts/` and return the path
/// to store on the post, e.g. `posts/0192....gif`.
pub async fn save_post_image(
    media_root: &Path,
    bytes: &[u8],
    format: ImageFormat,
) -> std::io::Result<String> {
    let extension = format.extensions_str().first().copied().unwrap_or("img");
    let file_name = format!("{}.{}", uuid::Uuid::now_v7(), extension);

    let dir = media_root.join(POSTS_DIR);
    tokio::fs::create_dir_all(&dir).await?;
    tokio::fs::write(dir.join(&file_name), bytes).await?;

    tracing::debug!("Stored post image {}/{}", POSTS_DIR, file_name);
    Ok(format!("{}/{}", POSTS_DIR, file_name))
}

#[cfg(test)]
pub(crate) const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0xff, 0xff, 0xff,
    0x00, 0x00, 0x00, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00, 0x00, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];
