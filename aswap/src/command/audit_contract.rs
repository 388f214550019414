use crate::{command::parse, confirm::Confirm, ethereum::Connector, swap::Session, Error};
use htlc::{ContractId, LegState};

pub async fn audit_contract<C, P>(session: &Session<'_, C, P>, id: &str) -> Result<String, Error>
where
    C: Connector + ?Sized,
    P: Confirm,
{
    let contract_id = parse::<ContractId>("contract id", id)?;

    let leg = session.audit_contract(contract_id).await?;
    if leg.state() == LegState::Empty {
        tracing::warn!("no contract with id {} on {}", contract_id, session.endpoint().name);
    }

    Ok(format!(
        "ContractId = {}\n{}",
        contract_id,
        leg.to_string().trim_end()
    ))
}
