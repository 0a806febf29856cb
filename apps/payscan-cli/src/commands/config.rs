//! `payscan config`: shows the effective configuration.

use std::path::PathBuf;

use anyhow::Context;
use payscan_scanner::ScannerConfig;

pub fn execute(config: &ScannerConfig, path: Option<PathBuf>, save: bool) -> anyhow::Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    print!("{}", rendered);

    if save {
        config.save(path).context("Failed to save configuration")?;
        eprintln!("Configuration saved");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_writes_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("scanner.toml");

        let mut config = ScannerConfig::default();
        config.scanner.poll_interval_ms = 250;
        execute(&config, Some(path.clone()), true).unwrap();

        let loaded = ScannerConfig::load(Some(path)).unwrap();
        assert_eq!(loaded.scanner.poll_interval_ms, 250);
    }
}
