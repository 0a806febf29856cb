//! `payscan image <path>`: one gallery-mode scan.

use std::path::Path;

use anyhow::Context;
use tracing::info;

use payscan_scanner::{ImageUpload, ScannerConfig};

use crate::{build_scanner, print_form};

/// MIME type a browser would report for `path`.
pub fn guess_mime(path: &Path) -> String {
    ::image::ImageFormat::from_path(path)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| "application/octet-stream".to_string())
}

pub async fn execute(
    config: ScannerConfig,
    path: &Path,
    mime: Option<String>,
    amount: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let mime = mime.unwrap_or_else(|| guess_mime(path));
    let (scanner, form) = build_scanner(config, None, amount)?;

    let upload = ImageUpload::from_path(mime, path);

    let payload = scanner
        .scan_image(upload)
        .await
        .context("Gallery scan failed")?;

    info!(amount = ?payload.amount(), "Image scanned");
    print_form(&form.snapshot(), json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{DynamicImage, Rgba, RgbaImage};

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime(Path::new("receipt.png")), "image/png");
        assert_eq!(guess_mime(Path::new("photo.JPG")), "image/jpeg");
        assert_eq!(guess_mime(Path::new("notes.txt")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_image_without_code_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.png");
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(200, 100, Rgba([255, 255, 255, 255])))
            .save(&path)
            .unwrap();

        let result = execute(ScannerConfig::default(), &path, None, None, false).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_a_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.png");

        let err = execute(ScannerConfig::default(), &path, None, None, false)
            .await
            .unwrap_err();
        let scan = err.downcast_ref::<payscan_scanner::ScanError>().unwrap();
        assert!(matches!(scan, payscan_scanner::ScanError::FileRead(_)));
    }

    #[tokio::test]
    async fn test_text_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "PAY|REF|NOTE|1.00").unwrap();

        let err = execute(ScannerConfig::default(), &path, None, None, false)
            .await
            .unwrap_err();
        let scan = err.downcast_ref::<payscan_scanner::ScanError>().unwrap();
        assert!(scan.is_upload_rejection());
    }
}
