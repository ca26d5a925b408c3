use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SvdrpConfig {
    /// `host:port` of the VDR to load the EPG into.
    pub address: String,
}

impl Default for SvdrpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:6419".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// VDR's `channels.conf`.
    pub channels: PathBuf,

    /// XMLTV guide to load.
    pub xmltv: PathBuf,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            channels: PathBuf::from("/var/lib/vdr/channels.conf"),
            xmltv: PathBuf::from("/var/lib/vdr/xmltv-epg.xml"),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub svdrp: SvdrpConfig,

    #[serde(default)]
    pub files: FilesConfig,
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let file = std::fs::read_to_string(path)?;
        let config = toml::from_str(&file)?;

        Ok(config)
    }
}
