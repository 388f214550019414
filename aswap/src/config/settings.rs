use crate::config::{file, File};
use anyhow::{Context, Result};
use htlc::ethereum::ChainId;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use url::Url;

/// Validated configuration with defaults filled in.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub home: Chain,
    /// Only required by commands that act on the counterparty chain.
    pub other: Option<Chain>,
    pub account: Option<String>,
    pub contract: String,
    pub keystore_dir: PathBuf,
    pub password: String,
    pub logging: Logging,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Chain {
    pub chain_id: ChainId,
    pub name: String,
    pub url: Url,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Logging {
    pub level: LevelFilter,
}

impl Default for Logging {
    fn default() -> Self {
        Logging {
            level: LevelFilter::INFO,
        }
    }
}

impl Settings {
    pub fn from_config_file_and_defaults(config_file: File) -> Result<Self> {
        let File {
            chain_id,
            chain_name,
            url,
            other_chain_id,
            other_chain_name,
            other_url,
            account,
            contract,
            keystore_dir,
            password,
            logging,
        } = config_file;

        let home = Chain::from_parts(
            chain_id.context("chainID is missing")?,
            chain_name,
            url.as_deref().context("url is missing")?,
        )?;

        let other = match (other_chain_id, other_url.as_deref()) {
            (Some(id), Some(url)) if !url.is_empty() => {
                Some(Chain::from_parts(id, other_chain_name, url)?)
            }
            _ => None,
        };

        Ok(Self {
            home,
            other,
            account,
            contract: contract.unwrap_or_default(),
            keystore_dir: keystore_dir.unwrap_or_else(|| PathBuf::from("keystore")),
            password: password.unwrap_or_default(),
            logging: logging.map(Logging::from).unwrap_or_default(),
        })
    }
}

impl Chain {
    fn from_parts(chain_id: u64, name: Option<String>, url: &str) -> Result<Self> {
        let url = url
            .parse()
            .with_context(|| format!("invalid node url {}", url))?;

        Ok(Chain {
            chain_id: ChainId::from(chain_id),
            name: name.unwrap_or_else(|| format!("chain{}", chain_id)),
            url,
        })
    }
}

impl From<file::Logging> for Logging {
    fn from(logging: file::Logging) -> Self {
        Logging {
            level: logging
                .level
                .map(LevelFilter::from)
                .unwrap_or(LevelFilter::INFO),
        }
    }
}
