//! `payscan camera <dir>`: camera-mode scan against a replayed feed.
//!
//! Starts the scanner, then waits for a `Decoded` event or the timeout. On
//! timeout the camera is stopped before returning.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use payscan_core::DecodedPayload;
use payscan_scanner::{CameraBackend, ScanEvent, ScannerConfig};

use crate::host::ReplayCamera;
use crate::{build_scanner, print_form};

pub async fn execute(
    config: ScannerConfig,
    dir: &Path,
    timeout_secs: u64,
    amount: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let backend: Arc<dyn CameraBackend> = Arc::new(ReplayCamera::new(dir));
    let (scanner, form) = build_scanner(config, Some(backend), amount)?;
    let mut events = scanner.subscribe();

    scanner.start_camera().await.context("Camera scan failed")?;

    let waited = tokio::time::timeout(
        Duration::from_secs(timeout_secs),
        wait_for_payload(&mut events),
    )
    .await;

    match waited {
        Ok(Some(payload)) => {
            info!(ticks = scanner.status().ticks, amount = ?payload.amount(), "Camera scan complete");
            print_form(&form.snapshot(), json)
        }
        Ok(None) => bail!("Scanner stopped before a code was found"),
        Err(_) => {
            scanner.stop_camera();
            bail!("No QR code found within {} seconds", timeout_secs)
        }
    }
}

/// Waits for the next decoded payload on the scanner's event feed.
pub async fn wait_for_payload(
    events: &mut broadcast::Receiver<ScanEvent>,
) -> Option<DecodedPayload> {
    loop {
        match events.recv().await {
            Ok(ScanEvent::Decoded(payload)) => return Some(payload),
            Ok(ScanEvent::StateChanged { from, to }) => {
                debug!(%from, %to, "Scanner state changed");
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Missed scanner events");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{DynamicImage, Rgba, RgbaImage};
    use payscan_core::ScanState;

    #[tokio::test]
    async fn test_wait_for_payload_skips_state_changes() {
        let (tx, mut rx) = broadcast::channel(8);
        tx.send(ScanEvent::StateChanged {
            from: ScanState::Scanning,
            to: ScanState::Found,
        })
        .unwrap();
        tx.send(ScanEvent::Decoded(DecodedPayload::new("SIMPLE"))).unwrap();

        assert_eq!(
            wait_for_payload(&mut rx).await,
            Some(DecodedPayload::new("SIMPLE"))
        );

        drop(tx);
        assert_eq!(wait_for_payload(&mut rx).await, None);
    }

    #[tokio::test]
    async fn test_missing_directory_fails_acquisition() {
        let result = execute(
            ScannerConfig::default(),
            Path::new("/nonexistent/payscan-frames"),
            1,
            None,
            false,
        )
        .await;
        let err = result.unwrap_err();
        let scan = err.downcast_ref::<payscan_scanner::ScanError>().unwrap();
        assert!(scan.is_acquisition_error());
    }

    #[tokio::test]
    async fn test_blank_feed_times_out() {
        let dir = tempfile::tempdir().unwrap();
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 64, Rgba([255, 255, 255, 255])))
            .save(dir.path().join("frame.png"))
            .unwrap();

        let err = execute(ScannerConfig::default(), dir.path(), 1, None, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No QR code found"));
    }
}
