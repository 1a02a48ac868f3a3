//! Image sources
//!
//! A verification only needs raw bytes and a format tag. [`ImageSource`] is
//! that capability; [`FileSource`] reads an image from disk as-is and
//! [`DecodedImageSource`] serializes an in-memory bitmap.

use super::error::VerifyError;
use super::format::ImageFormatTag;
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Image bytes paired with their normalized format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormatTag,
}

/// Anything that can yield image bytes and a format tag
///
/// Implementations must validate the format before doing any expensive work
/// and must not block the runtime on file I/O.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Short human-readable description used in logs
    fn describe(&self) -> String;

    /// Produce the bytes to send and their format
    async fn load(&self) -> Result<RawImage, VerifyError>;
}

/// Image stored in a file, sent byte-for-byte
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ImageSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<RawImage, VerifyError> {
        let is_file = tokio::fs::metadata(&self.path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(VerifyError::ImageNotFound(self.path.clone()));
        }

        let format = ImageFormatTag::from_path(&self.path)?;

        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| VerifyError::ImageRead {
                path: self.path.clone(),
                source,
            })?;

        // The extension decides the declared format; content is not rejected
        if let Ok(sniffed) = image::guess_format(&bytes) {
            if sniffed != format.codec() {
                warn!(
                    "{} has extension '{}' but its content looks like {:?}",
                    self.path.display(),
                    format,
                    sniffed
                );
            }
        }

        Ok(RawImage { bytes, format })
    }
}

/// Already-decoded bitmap with an optional declared format
#[derive(Debug, Clone)]
pub struct DecodedImageSource {
    image: DynamicImage,
    format: Option<ImageFormat>,
}

impl DecodedImageSource {
    /// Wrap a bitmap that reports no format; it will be sent as PNG
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image,
            format: None,
        }
    }

    /// Wrap a bitmap along with the format it was decoded from
    pub fn with_format(image: DynamicImage, format: ImageFormat) -> Self {
        Self {
            image,
            format: Some(format),
        }
    }

    /// Decode encoded bytes, remembering the format they were stored in
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VerifyError> {
        let format = image::guess_format(bytes)?;
        let image = image::load_from_memory_with_format(bytes, format)?;
        Ok(Self::with_format(image, format))
    }

    pub fn declared_format(&self) -> Option<ImageFormat> {
        self.format
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}

#[async_trait]
impl ImageSource for DecodedImageSource {
    fn describe(&self) -> String {
        format!(
            "in-memory {}x{} image",
            self.image.width(),
            self.image.height()
        )
    }

    async fn load(&self) -> Result<RawImage, VerifyError> {
        let format = ImageFormatTag::from_image_format(self.format)?;
        let codec = format.codec();

        // JPEG has no alpha channel; the GIF and WebP encoders take RGBA.
        // PNG has no float samples, so those widen to 16-bit RGBA.
        let pixels = match (codec, &self.image) {
            (ImageFormat::Jpeg, _) => DynamicImage::ImageRgb8(self.image.to_rgb8()),
            (ImageFormat::Gif | ImageFormat::WebP, _) => {
                DynamicImage::ImageRgba8(self.image.to_rgba8())
            }
            (_, DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_)) => {
                DynamicImage::ImageRgba16(self.image.to_rgba16())
            }
            _ => self.image.clone(),
        };

        let mut buffer = Cursor::new(Vec::new());
        pixels.write_to(&mut buffer, codec)?;

        Ok(RawImage {
            bytes: buffer.into_inner(),
            format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn red_square() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([200, 30, 30])))
    }

    fn png_bytes() -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        red_square().write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[tokio::test]
    async fn test_file_source_reads_bytes_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("barn.png");
        let bytes = png_bytes();
        std::fs::write(&path, &bytes).unwrap();

        let raw = FileSource::new(&path).load().await.unwrap();
        assert_eq!(raw.format, ImageFormatTag::Png);
        assert_eq!(raw.bytes, bytes);
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.png");
        let err = FileSource::new(&path).load().await.unwrap_err();
        assert!(matches!(err, VerifyError::ImageNotFound(ref p) if *p == path));
    }

    #[tokio::test]
    async fn test_file_source_directory_is_not_an_image() {
        let dir = TempDir::new().unwrap();
        let err = FileSource::new(dir.path()).load().await.unwrap_err();
        assert!(matches!(err, VerifyError::ImageNotFound(_)));
    }

    #[tokio::test]
    async fn test_file_source_rejects_bmp_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("barn.bmp");
        std::fs::write(&path, b"BM").unwrap();
        let err = FileSource::new(&path).load().await.unwrap_err();
        assert!(matches!(err, VerifyError::UnsupportedFormat(ref t) if t == "bmp"));
    }

    #[tokio::test]
    async fn test_file_source_keeps_extension_on_content_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("actually-png.jpg");
        std::fs::write(&path, png_bytes()).unwrap();
        let raw = FileSource::new(&path).load().await.unwrap();
        assert_eq!(raw.format, ImageFormatTag::Jpg);
    }

    #[tokio::test]
    async fn test_decoded_source_without_format_encodes_png() {
        let raw = DecodedImageSource::new(red_square()).load().await.unwrap();
        assert_eq!(raw.format, ImageFormatTag::Png);
        assert_eq!(image::guess_format(&raw.bytes).unwrap(), ImageFormat::Png);
    }

    #[tokio::test]
    async fn test_decoded_source_float_bitmap_encodes_png() {
        let raw = DecodedImageSource::new(DynamicImage::new_rgba32f(4, 4))
            .load()
            .await
            .unwrap();
        assert_eq!(raw.format, ImageFormatTag::Png);
        assert_eq!(image::guess_format(&raw.bytes).unwrap(), ImageFormat::Png);

        let decoded = image::load_from_memory(&raw.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 4));
    }

    #[tokio::test]
    async fn test_decoded_source_float_rgb_with_declared_png() {
        let source =
            DecodedImageSource::with_format(DynamicImage::new_rgb32f(4, 4), ImageFormat::Png);
        let raw = source.load().await.unwrap();
        assert_eq!(image::guess_format(&raw.bytes).unwrap(), ImageFormat::Png);
    }

    #[tokio::test]
    async fn test_decoded_source_float_bitmap_to_jpeg() {
        let source =
            DecodedImageSource::with_format(DynamicImage::new_rgba32f(4, 4), ImageFormat::Jpeg);
        let raw = source.load().await.unwrap();
        assert_eq!(image::guess_format(&raw.bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn test_decoded_source_with_declared_jpeg() {
        let source = DecodedImageSource::with_format(red_square(), ImageFormat::Jpeg);
        let raw = source.load().await.unwrap();
        assert_eq!(raw.format, ImageFormatTag::Jpeg);
        assert_eq!(image::guess_format(&raw.bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn test_decoded_source_rgba_to_jpeg() {
        let rgba = DynamicImage::new_rgba8(4, 4);
        let raw = DecodedImageSource::with_format(rgba, ImageFormat::Jpeg)
            .load()
            .await
            .unwrap();
        assert_eq!(image::guess_format(&raw.bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn test_decoded_source_rejects_tiff() {
        let err = DecodedImageSource::with_format(red_square(), ImageFormat::Tiff)
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::UnsupportedFormat(ref t) if t == "tiff"));
    }

    #[test]
    fn test_from_bytes_records_format() {
        let source = DecodedImageSource::from_bytes(&png_bytes()).unwrap();
        assert_eq!(source.declared_format(), Some(ImageFormat::Png));
        assert_eq!(source.image().width(), 8);
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        let err = DecodedImageSource::from_bytes(b"not an image").unwrap_err();
        assert!(matches!(err, VerifyError::ImageCodec(_)));
    }
}
