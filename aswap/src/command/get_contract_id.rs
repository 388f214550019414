use crate::{
    command::parse,
    confirm::Confirm,
    ethereum::{Connector, Hash},
    swap::Session,
    Error,
};

pub async fn get_contract_id<C, P>(session: &Session<'_, C, P>, txid: &str) -> Result<String, Error>
where
    C: Connector + ?Sized,
    P: Confirm,
{
    let transaction = parse::<Hash>("transaction hash", txid)?;

    let created = session.get_contract_id(transaction).await?;

    Ok(created.to_string().trim_end().to_owned())
}
