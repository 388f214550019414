#![warn(
    unused_extern_crates,
    missing_debug_implementations,
    missing_copy_implementations,
    rust_2018_idioms,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::fallible_impl_from,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap,
    clippy::dbg_macro
)]
#![cfg_attr(not(test), warn(clippy::unwrap_used))]
#![forbid(unsafe_code)]

mod chain;
mod command;
mod config;
mod confirm;
mod error;
mod ethereum;
mod fs;
mod jsonrpc;
mod swap;
mod trace;

#[cfg(test)]
mod test_harness;

use crate::{
    chain::ChainEndpoint,
    command::{dump_config, unlock, Command, Options},
    config::{read_config, validation::validate_address, File, Settings},
    confirm::Prompt,
    ethereum::geth,
    fs::default_config_path,
    swap::Session,
};
use anyhow::Context;
use htlc::Timestamp;
use std::path::Path;

pub use error::Error;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let options = Options::from_args();

    if options.version {
        println!("aswap {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"));
        std::process::exit(0);
    }

    let exit_code = match run(options).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(Error::Declined) => {
            eprintln!("Cancelled");
            0
        }
        Err(e) => {
            let exit_code = e.exit_code();
            eprintln!("Error: {:#}", anyhow::Error::from(e));
            exit_code
        }
    };

    std::process::exit(exit_code);
}

async fn run(options: Options) -> Result<String, Error> {
    let cmd = options
        .cmd
        .ok_or_else(|| Error::validation("no command given, see --help"))?;

    let (config_path, file) =
        read_config(&options.config_file, default_config_path).map_err(Error::Validation)?;

    let settings = Settings::from_config_file_and_defaults(file.clone())
        .context("could not initialize configuration")
        .map_err(Error::Validation)?;

    trace::init_tracing(settings.logging.level).map_err(Error::Config)?;

    dispatch(cmd, &settings, &file, &config_path).await
}

/// Every check that needs no node runs before the node is contacted.
async fn dispatch(
    cmd: Command,
    settings: &Settings,
    file: &File,
    config_path: &Path,
) -> Result<String, Error> {
    match cmd {
        Command::Deploy { bytecode, key } => {
            let signer = unlock(settings, key.as_deref())?;
            let endpoint = ChainEndpoint::resolve(settings, None)?;
            let client = chain::connect(&endpoint).await?;
            let session = Session::new(&client, Prompt, endpoint, Some(signer));

            command::deploy(&session, &bytecode, config_path).await
        }
        Command::Initiate {
            participant,
            amount,
            key,
        } => {
            validate_address(&participant)?;
            let signer = unlock(settings, key.as_deref())?;
            let (client, endpoint) = connect(settings, None).await?;
            let session = Session::new(&client, Prompt, endpoint, Some(signer));

            command::initiate(&session, &participant, &amount, Timestamp::now()).await
        }
        Command::Participant {
            initiator,
            amount,
            time,
            hash,
            key,
        } => {
            validate_address(&initiator)?;
            let signer = unlock(settings, key.as_deref())?;
            let (client, endpoint) = connect(settings, None).await?;
            let session = Session::new(&client, Prompt, endpoint, Some(signer));

            command::participant(&session, &initiator, &amount, &time, &hash, Timestamp::now())
                .await
        }
        Command::Getcontractid { txid, other } => {
            let (client, endpoint) = connect(settings, other.as_deref()).await?;
            let session = Session::new(&client, Prompt, endpoint, None);

            command::get_contract_id(&session, &txid).await
        }
        Command::Auditcontract { id, other } => {
            let (client, endpoint) = connect(settings, other.as_deref()).await?;
            let session = Session::new(&client, Prompt, endpoint, None);

            command::audit_contract(&session, &id).await
        }
        Command::Redeem {
            id,
            secret,
            other,
            key,
        } => {
            let signer = unlock(settings, key.as_deref())?;
            let (client, endpoint) = connect(settings, Some(&other)).await?;
            let session = Session::new(&client, Prompt, endpoint, Some(signer));

            command::redeem(&session, &id, &secret).await
        }
        Command::Refund { id, key } => {
            let signer = unlock(settings, key.as_deref())?;
            let (client, endpoint) = connect(settings, None).await?;
            let session = Session::new(&client, Prompt, endpoint, Some(signer));

            command::refund(&session, &id).await
        }
        Command::Dumpconfig => dump_config(file).map_err(Error::Validation),
    }
}

/// Connects to the chain hosting the HTLC contract, after checking its
/// address.
async fn connect(
    settings: &Settings,
    other_contract: Option<&str>,
) -> Result<(geth::Client, ChainEndpoint), Error> {
    let endpoint = ChainEndpoint::resolve_contract(settings, other_contract)?;
    let client = chain::connect(&endpoint).await?;

    Ok((client, endpoint))
}
