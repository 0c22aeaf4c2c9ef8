//! Assembly of multimodal prompts from a chat request.
//!
//! A prompt is an ordered list of parts. When both an image and text are
//! supplied the image always comes first, followed by the text.

use crate::error::ChatError;
use crate::upload::{allowed_file, AllowedExtensions};
use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// An uploaded image as received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Bytes,
}

/// An image that decoded successfully, together with the payload sent upstream.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    image: DynamicImage,
    format: ImageFormat,
    mime_type: &'static str,
    data: Bytes,
}

impl DecodedImage {
    /// Decode raw upload bytes.
    ///
    /// PNG, JPEG and WEBP payloads are forwarded unchanged; other formats are
    /// re-encoded as PNG.
    pub fn decode(bytes: Bytes) -> Result<Self, image::ImageError> {
        let format = image::guess_format(&bytes)?;
        let image = image::load_from_memory_with_format(&bytes, format)?;

        let (mime_type, data) = match format {
            ImageFormat::Png => ("image/png", bytes),
            ImageFormat::Jpeg => ("image/jpeg", bytes),
            ImageFormat::WebP => ("image/webp", bytes),
            _ => {
                let mut buf = Vec::new();
                image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
                ("image/png", Bytes::from(buf))
            }
        };

        Ok(Self {
            image,
            format,
            mime_type,
            data,
        })
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Format detected from the uploaded bytes.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// MIME type of [`DecodedImage::data`].
    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

/// One element of a multimodal prompt.
#[derive(Debug, Clone)]
pub enum PromptPart {
    Image(DecodedImage),
    Text(String),
}

/// Ordered prompt parts for a single model call.
#[derive(Debug, Clone, Default)]
pub struct PromptParts(Vec<PromptPart>);

impl PromptParts {
    pub fn iter(&self) -> std::slice::Iter<'_, PromptPart> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_image(&self) -> bool {
        self.0.iter().any(|p| matches!(p, PromptPart::Image(_)))
    }

    /// Total length of the text parts in bytes.
    pub fn text_len(&self) -> usize {
        self.0
            .iter()
            .map(|p| match p {
                PromptPart::Text(text) => text.len(),
                PromptPart::Image(_) => 0,
            })
            .sum()
    }
}

impl<'a> IntoIterator for &'a PromptParts {
    type Item = &'a PromptPart;
    type IntoIter = std::slice::Iter<'a, PromptPart>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Build the prompt for a request carrying optional text and an optional image.
///
/// The filename is validated before any decoding happens. Empty text counts as
/// absent.
pub fn assemble(
    text: Option<&str>,
    image: Option<&ImageUpload>,
    allowed: &AllowedExtensions,
) -> Result<PromptParts, ChatError> {
    let text = text.filter(|t| !t.is_empty());
    if text.is_none() && image.is_none() {
        return Err(ChatError::MissingInput);
    }

    let mut parts = Vec::with_capacity(2);

    if let Some(upload) = image {
        if !allowed_file(&upload.filename, allowed) {
            tracing::warn!(filename = %upload.filename, "Rejected upload with disallowed extension");
            return Err(ChatError::UnsupportedFileType);
        }

        let decoded = DecodedImage::decode(upload.bytes.clone()).map_err(|e| {
            tracing::warn!(
                filename = %upload.filename,
                size = upload.bytes.len(),
                error = %e,
                "Error processing image"
            );
            ChatError::ImageDecode(e)
        })?;

        let (width, height) = decoded.dimensions();
        tracing::debug!(
            filename = %upload.filename,
            format = ?decoded.format(),
            width,
            height,
            "Decoded uploaded image"
        );
        parts.push(PromptPart::Image(decoded));
    }

    if let Some(text) = text {
        parts.push(PromptPart::Text(text.to_string()));
    }

    Ok(PromptParts(parts))
}

/// [`assemble`] on the blocking thread pool.
///
/// Image decoding and re-encoding are CPU bound and would otherwise stall the
/// async worker that runs the request.
pub async fn assemble_blocking(
    text: Option<String>,
    image: Option<ImageUpload>,
    allowed: AllowedExtensions,
) -> Result<PromptParts, ChatError> {
    tokio::task::spawn_blocking(move || assemble(text.as_deref(), image.as_ref(), &allowed))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Prompt assembly task failed");
            ChatError::Internal(e.into())
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn encoded(format: ImageFormat) -> Bytes {
        let img = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(3, 2, Rgba([10, 20, 30, 255])));
        let img = if format == ImageFormat::Jpeg {
            DynamicImage::ImageRgb8(img.to_rgb8())
        } else {
            img
        };
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        Bytes::from(buf)
    }

    fn upload(filename: &str, bytes: Bytes) -> ImageUpload {
        ImageUpload {
            filename: filename.to_string(),
            bytes,
        }
    }

    #[test]
    fn text_only_yields_single_text_part() {
        let parts = assemble(Some("hello"), None, &AllowedExtensions::default()).unwrap();
        assert_eq!(parts.len(), 1);
        assert!(matches!(parts.iter().next(), Some(PromptPart::Text(t)) if t == "hello"));
    }

    #[test]
    fn image_only_yields_single_image_part() {
        let image = upload("photo.png", encoded(ImageFormat::Png));
        let parts = assemble(None, Some(&image), &AllowedExtensions::default()).unwrap();
        assert_eq!(parts.len(), 1);
        assert!(parts.has_image());
    }

    #[test]
    fn image_precedes_text() {
        let image = upload("photo.jpg", encoded(ImageFormat::Jpeg));
        let parts = assemble(
            Some("describe this"),
            Some(&image),
            &AllowedExtensions::default(),
        )
        .unwrap();

        let kinds: Vec<&str> = parts
            .iter()
            .map(|p| match p {
                PromptPart::Image(_) => "image",
                PromptPart::Text(_) => "text",
            })
            .collect();
        assert_eq!(kinds, vec!["image", "text"]);
        assert_eq!(parts.text_len(), "describe this".len());
    }

    #[test]
    fn neither_input_is_missing_input() {
        let result = assemble(None, None, &AllowedExtensions::default());
        assert!(matches!(result, Err(ChatError::MissingInput)));
    }

    #[test]
    fn empty_text_counts_as_absent() {
        let result = assemble(Some(""), None, &AllowedExtensions::default());
        assert!(matches!(result, Err(ChatError::MissingInput)));
    }

    #[test]
    fn disallowed_extension_is_rejected_before_decoding() {
        // Valid PNG bytes: a decode would succeed if it were attempted.
        let image = upload("malware.exe", encoded(ImageFormat::Png));
        let result = assemble(Some("hi"), Some(&image), &AllowedExtensions::default());
        assert!(matches!(result, Err(ChatError::UnsupportedFileType)));
    }

    #[test]
    fn undecodable_bytes_fail_with_decode_error() {
        let image = upload("photo.png", Bytes::from_static(b"definitely not a png"));
        let result = assemble(None, Some(&image), &AllowedExtensions::default());
        assert!(matches!(result, Err(ChatError::ImageDecode(_))));
    }

    #[test]
    fn truncated_png_fails_with_decode_error() {
        let full = encoded(ImageFormat::Png);
        let image = upload("photo.png", full.slice(..full.len() / 2));
        let result = assemble(None, Some(&image), &AllowedExtensions::default());
        assert!(matches!(result, Err(ChatError::ImageDecode(_))));
    }

    #[test]
    fn png_and_jpeg_are_forwarded_unchanged() {
        let png = encoded(ImageFormat::Png);
        let decoded = DecodedImage::decode(png.clone()).unwrap();
        assert_eq!(decoded.mime_type(), "image/png");
        assert_eq!(decoded.data(), &png);

        let jpeg = encoded(ImageFormat::Jpeg);
        let decoded = DecodedImage::decode(jpeg.clone()).unwrap();
        assert_eq!(decoded.mime_type(), "image/jpeg");
        assert_eq!(decoded.data(), &jpeg);
        assert_eq!(decoded.dimensions(), (3, 2));
    }

    #[test]
    fn gif_is_reencoded_as_png() {
        let decoded = DecodedImage::decode(encoded(ImageFormat::Gif)).unwrap();
        assert_eq!(decoded.format(), ImageFormat::Gif);
        assert_eq!(decoded.mime_type(), "image/png");
        assert_eq!(
            image::guess_format(decoded.data()).unwrap(),
            ImageFormat::Png
        );
    }

    #[tokio::test]
    async fn blocking_assembly_keeps_validation_order() {
        let image = upload("malware.exe", encoded(ImageFormat::Png));
        let result = assemble_blocking(
            Some("hi".to_string()),
            Some(image),
            AllowedExtensions::default(),
        )
        .await;
        assert!(matches!(result, Err(ChatError::UnsupportedFileType)));

        let image = upload("photo.png", encoded(ImageFormat::Png));
        let parts = assemble_blocking(
            Some("hi".to_string()),
            Some(image),
            AllowedExtensions::default(),
        )
        .await
        .unwrap();
        assert_eq!(parts.len(), 2);
        assert!(parts.has_image());
    }

    #[test]
    fn extension_is_not_checked_against_content() {
        // A JPEG named .png passes: validation is by name, decoding by content.
        let image = upload("photo.png", encoded(ImageFormat::Jpeg));
        let parts = assemble(None, Some(&image), &AllowedExtensions::default()).unwrap();
        match parts.iter().next() {
            Some(PromptPart::Image(decoded)) => assert_eq!(decoded.mime_type(), "image/jpeg"),
            other => panic!("expected image part, got {other:?}"),
        }
    }
}
