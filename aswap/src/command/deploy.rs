use crate::{
    command::{read_bytecode, txid_line},
    config::File,
    confirm::Confirm,
    ethereum::Connector,
    swap::Session,
    Error,
};
use std::path::Path;

/// Deploys the contract in `bytecode` and writes its address to the
/// `contract` entry of the configuration file at `config_path`.
pub async fn deploy<C, P>(
    session: &Session<'_, C, P>,
    bytecode: &Path,
    config_path: &Path,
) -> Result<String, Error>
where
    C: Connector + ?Sized,
    P: Confirm,
{
    let bytecode = read_bytecode(bytecode)?;

    let deployed = session
        .deploy_contract(bytecode, |address| {
            let mut file = File::read(config_path)?;
            file.contract = Some(address.to_string());
            file.rotate(config_path)
        })
        .await?;

    Ok(format!(
        "contract = {}\n{}",
        deployed.address,
        txid_line(session.endpoint(), deployed.transaction)
    ))
}
