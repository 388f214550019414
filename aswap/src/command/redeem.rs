use crate::{
    command::{parse, txid_line},
    confirm::Confirm,
    ethereum::Connector,
    swap::Session,
    Error,
};
use htlc::{ContractId, Secret};

/// Redeems the counterparty's leg, which lives on the chain the session was
/// resolved to.
pub async fn redeem<C, P>(
    session: &Session<'_, C, P>,
    id: &str,
    secret: &str,
) -> Result<String, Error>
where
    C: Connector + ?Sized,
    P: Confirm,
{
    let contract_id = parse::<ContractId>("contract id", id)?;
    let secret = parse::<Secret>("secret", secret)?;

    let transaction = session.redeem(contract_id, secret).await?;

    Ok(txid_line(session.endpoint(), transaction))
}
