use crate::{
    command::{parse, parse_amount, txid_line},
    confirm::Confirm,
    ethereum::Connector,
    swap::Session,
    Error,
};
use htlc::{SecretHash, Timestamp};

/// Locks `amount` for the initiator under the initiator's hash, expiring
/// halfway between now and the initiator's timelock `time`.
pub async fn participant<C, P>(
    session: &Session<'_, C, P>,
    initiator: &str,
    amount: &str,
    time: &str,
    hash: &str,
    now: Timestamp,
) -> Result<String, Error>
where
    C: Connector + ?Sized,
    P: Confirm,
{
    let amount = parse_amount(amount)?;
    let initiator_timelock = Timestamp::from(parse::<u64>("time", time)?);
    let hashlock = parse::<SecretHash>("hash", hash)?;

    let timelock = Timestamp::participant_timelock(now, initiator_timelock).ok_or_else(|| {
        Error::validation(format!(
            "initiator timelock {} has already passed",
            initiator_timelock
        ))
    })?;

    let transaction = session
        .new_contract(initiator, amount, hashlock, timelock)
        .await?;

    Ok(format!(
        "TimeLock    = {}\n{}",
        timelock,
        txid_line(session.endpoint(), transaction)
    ))
}
