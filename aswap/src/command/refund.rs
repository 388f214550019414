use crate::{
    command::{parse, txid_line},
    confirm::Confirm,
    ethereum::Connector,
    swap::Session,
    Error,
};
use htlc::ContractId;

pub async fn refund<C, P>(session: &Session<'_, C, P>, id: &str) -> Result<String, Error>
where
    C: Connector + ?Sized,
    P: Confirm,
{
    let contract_id = parse::<ContractId>("contract id", id)?;

    let transaction = session.refund(contract_id).await?;

    Ok(txid_line(session.endpoint(), transaction))
}
