use crate::{
    command::{parse_amount, txid_line},
    confirm::Confirm,
    ethereum::Connector,
    swap::Session,
    Error,
};
use htlc::{SecretHashPair, Timestamp};

/// Generates the swap secret and locks `amount` for `participant` for the
/// full initiator window.
pub async fn initiate<C, P>(
    session: &Session<'_, C, P>,
    participant: &str,
    amount: &str,
    now: Timestamp,
) -> Result<String, Error>
where
    C: Connector + ?Sized,
    P: Confirm,
{
    let amount = parse_amount(amount)?;
    let pair = SecretHashPair::generate()
        .map_err(|e| Error::Submission(anyhow::Error::new(e).context("failed to generate secret")))?;
    let timelock = Timestamp::initiator_timelock(now);

    let transaction = session
        .new_contract(participant, amount, pair.hash, timelock)
        .await?;

    Ok(format!(
        "Secret      = {}\nSecret Hash = {}\nTimeLock    = {}\n{}",
        pair.secret,
        pair.hash,
        timelock,
        txid_line(session.endpoint(), transaction)
    ))
}
