use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::level_filters::LevelFilter;

/// This struct aims to represent the configuration file as it appears on disk.
///
/// Field names follow the JSON layout shared with existing deployments, so a
/// file written after `deploy` stays readable by every other command.
/// Absent or `null` entries become `None`; unknown entries are ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct File {
    #[serde(rename = "chainID", skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(rename = "chainName", skip_serializing_if = "Option::is_none")]
    pub chain_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "otherChainID", skip_serializing_if = "Option::is_none")]
    pub other_chain_id: Option<u64>,
    #[serde(rename = "otherChainName", skip_serializing_if = "Option::is_none")]
    pub other_chain_name: Option<String>,
    #[serde(rename = "otherURL", skip_serializing_if = "Option::is_none")]
    pub other_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
    #[serde(rename = "keystoreDir", skip_serializing_if = "Option::is_none")]
    pub keystore_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<Logging>,
}

impl File {
    pub fn read(config_file: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(config_file)
            .with_context(|| format!("failed to read {}", config_file.display()))?;
        let file = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {}", config_file.display()))?;

        Ok(file)
    }

    pub fn to_pretty_json(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);

        self.serialize(&mut serializer)
            .context("failed to encode configuration")?;
        buffer.push(b'\n');

        Ok(String::from_utf8(buffer)?)
    }

    /// Replaces the file at `config_file` with `self`.
    ///
    /// The new content is written next to it as `<config_file>.new` first and
    /// then renamed over the live file, so readers never see a partial write.
    pub fn rotate(&self, config_file: &Path) -> anyhow::Result<()> {
        let mut replacement = config_file.as_os_str().to_owned();
        replacement.push(".new");
        let replacement = PathBuf::from(replacement);

        fs::write(&replacement, self.to_pretty_json()?)
            .with_context(|| format!("failed to write {}", replacement.display()))?;
        fs::rename(&replacement, config_file).with_context(|| {
            format!(
                "failed to replace {} with {}",
                config_file.display(),
                replacement.display()
            )
        })?;

        Ok(())
    }

    /// Copy that is safe to print.
    pub fn redacted(&self) -> Self {
        File {
            password: self.password.as_ref().map(|_| "********".to_owned()),
            ..self.clone()
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Logging {
    pub level: Option<Level>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<Level> for LevelFilter {
    fn from(level: Level) -> Self {
        match level {
            Level::Error => LevelFilter::ERROR,
            Level::Warn => LevelFilter::WARN,
            Level::Info => LevelFilter::INFO,
            Level::Debug => LevelFilter::DEBUG,
            Level::Trace => LevelFilter::TRACE,
        }
    }
}
