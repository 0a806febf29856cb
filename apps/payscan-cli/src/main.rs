//! # PayScan CLI Entry Point
//!
//! ```text
//! payscan image receipt.png            one gallery scan
//! payscan camera ./frames --timeout 10 replay a directory as a live camera
//! payscan config --save                write the effective configuration
//! ```
//!
//! The actual setup is in lib.rs.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    payscan_cli::run().await
}
