use std::{
    fmt::Display,
    path::{Path, PathBuf},
    str::FromStr,
};
use structopt::{clap::AppSettings, StructOpt};

mod audit_contract;
mod deploy;
mod get_contract_id;
mod initiate;
mod participant;
mod redeem;
mod refund;

use crate::{
    chain::ChainEndpoint,
    config::{validation::validate_address, File, Settings},
    ethereum::{
        wallet::{AuthError, Signer},
        Hash, U256,
    },
    Error,
};

pub use audit_contract::audit_contract;
pub use deploy::deploy;
pub use get_contract_id::get_contract_id;
pub use initiate::initiate;
pub use participant::participant;
pub use redeem::redeem;
pub use refund::refund;

#[derive(StructOpt, Debug)]
#[structopt(global_settings = &[AppSettings::DisableVersion])]
pub struct Options {
    /// Path to configuration file
    #[structopt(short = "c", long = "config", parse(from_os_str))]
    pub config_file: Option<PathBuf>,

    /// Display the current version
    #[structopt(short = "V", long = "version")]
    pub version: bool,

    /// Commands available
    #[structopt(subcommand)]
    pub cmd: Option<Command>,
}

impl Options {
    pub fn from_args() -> Self {
        StructOpt::from_args()
    }
}

#[derive(StructOpt, Debug, Clone)]
#[structopt(rename_all = "lowercase")]
pub enum Command {
    /// Deploy the HTLC contract and record its address in the configuration
    Deploy {
        /// Hex encoded contract bytecode
        #[structopt(long = "bytecode", parse(from_os_str), default_value = "htlc.bin")]
        bytecode: PathBuf,
        /// Sign with this private key instead of the keystore
        #[structopt(long = "key")]
        key: Option<String>,
    },
    /// Generate a secret and lock funds for the participant
    Initiate {
        /// Address of the participant
        #[structopt(short = "p", long = "participant")]
        participant: String,
        /// Amount to lock, in wei
        #[structopt(short = "a", long = "amount")]
        amount: String,
        /// Sign with this private key instead of the keystore
        #[structopt(long = "key")]
        key: Option<String>,
    },
    /// Lock funds for the initiator under the initiator's secret hash
    Participant {
        /// Address of the initiator
        #[structopt(short = "i", long = "initiator")]
        initiator: String,
        /// Amount to lock, in wei
        #[structopt(short = "a", long = "amount")]
        amount: String,
        /// Timelock of the initiator's contract, as a Unix timestamp
        #[structopt(short = "t", long = "time")]
        time: String,
        /// Secret hash of the initiator's contract
        #[structopt(long = "hash")]
        hash: String,
        /// Sign with this private key instead of the keystore
        #[structopt(long = "key")]
        key: Option<String>,
    },
    /// Print the contract id created by a transaction
    Getcontractid {
        /// Hash of the newContract transaction
        #[structopt(long = "txid")]
        txid: String,
        /// Contract address on the other chain
        #[structopt(long = "other")]
        other: Option<String>,
    },
    /// Print the on-chain state of a contract id
    Auditcontract {
        /// Contract id to inspect
        #[structopt(long = "id")]
        id: String,
        /// Contract address on the other chain
        #[structopt(long = "other")]
        other: Option<String>,
    },
    /// Withdraw the counterparty's funds by revealing the secret
    Redeem {
        /// Contract id to redeem
        #[structopt(long = "id")]
        id: String,
        /// The secret
        #[structopt(long = "secret")]
        secret: String,
        /// Contract address on the other chain
        #[structopt(long = "other")]
        other: String,
        /// Sign with this private key instead of the keystore
        #[structopt(long = "key")]
        key: Option<String>,
    },
    /// Reclaim locked funds once the timelock has passed
    Refund {
        /// Contract id to refund
        #[structopt(long = "id")]
        id: String,
        /// Sign with this private key instead of the keystore
        #[structopt(long = "key")]
        key: Option<String>,
    },
    /// Dump the current configuration
    Dumpconfig,
}

pub fn dump_config(file: &File) -> anyhow::Result<String> {
    file.redacted().to_pretty_json()
}

/// Unlocks the configured account, with `key` if given and from the keystore
/// otherwise.
pub fn unlock(settings: &Settings, key: Option<&str>) -> Result<Signer, Error> {
    let account = settings
        .account
        .as_deref()
        .filter(|account| !account.is_empty())
        .ok_or(AuthError::NoAccount)?;
    let account = validate_address(account)?;

    let signer = match key {
        Some(key) => Signer::from_raw_key(key, account)?,
        None => Signer::from_keystore(&settings.keystore_dir, account, &settings.password)?,
    };
    tracing::debug!("Signing as {}", signer);

    Ok(signer)
}

pub fn txid_line(endpoint: &ChainEndpoint, transaction: Hash) -> String {
    format!(
        "{}({}) txid: {}",
        endpoint.name, endpoint.chain_id, transaction
    )
}

/// Parses a command line value, reporting failures as invalid input.
fn parse<T>(what: &str, value: &str) -> Result<T, Error>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e| Error::validation(format!("invalid {} {}: {}", what, value, e)))
}

fn parse_amount(value: &str) -> Result<U256, Error> {
    let amount = U256::from_dec_str(value)
        .map_err(|e| Error::validation(format!("invalid amount {}: {:?}", value, e)))?;
    if amount.is_zero() {
        return Err(Error::validation("amount must be greater than zero"));
    }

    Ok(amount)
}

/// Reads hex bytecode, tolerating a `0x` prefix and surrounding whitespace.
fn read_bytecode(path: &Path) -> Result<Vec<u8>, Error> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::Validation(
            anyhow::Error::new(e).context(format!("failed to read bytecode {}", path.display())),
        )
    })?;
    let contents = contents.trim();
    let hex = contents.strip_prefix("0x").unwrap_or(contents);

    hex::decode(hex).map_err(|e| {
        Error::Validation(
            anyhow::Error::new(e).context(format!("invalid bytecode in {}", path.display())),
        )
    })
}
