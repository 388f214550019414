use crate::{
    config::{validation::validate_address, Settings},
    ethereum::{geth, Address, ChainId, Connector},
    Error,
};
use url::Url;

/// The chain a command talks to and the HTLC contract deployed on it.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainEndpoint {
    pub chain_id: ChainId,
    pub name: String,
    pub url: Url,
    pub contract: String,
}

impl ChainEndpoint {
    /// Without an override, or with an empty one, this is the home chain and
    /// its configured contract. An override selects the counterparty chain
    /// and replaces the contract address.
    pub fn resolve(settings: &Settings, other_contract: Option<&str>) -> Result<Self, Error> {
        match other_contract {
            None | Some("") => Ok(ChainEndpoint {
                chain_id: settings.home.chain_id,
                name: settings.home.name.clone(),
                url: settings.home.url.clone(),
                contract: settings.contract.clone(),
            }),
            Some(contract) => {
                let other = settings.other.as_ref().ok_or_else(|| {
                    Error::validation(
                        "--other requires otherChainID and otherURL in the configuration",
                    )
                })?;

                Ok(ChainEndpoint {
                    chain_id: other.chain_id,
                    name: other.name.clone(),
                    url: other.url.clone(),
                    contract: contract.to_owned(),
                })
            }
        }
    }

    /// Resolves like [`ChainEndpoint::resolve`] and also requires a well
    /// formed contract address, so a bad one is reported before any node is
    /// contacted.
    pub fn resolve_contract(
        settings: &Settings,
        other_contract: Option<&str>,
    ) -> Result<Self, Error> {
        let endpoint = Self::resolve(settings, other_contract)?;
        endpoint.contract_address()?;

        Ok(endpoint)
    }

    pub fn contract_address(&self) -> Result<Address, Error> {
        validate_address(&self.contract)
    }
}

/// Opens a client for `endpoint` and checks that the node answers.
pub async fn connect(endpoint: &ChainEndpoint) -> Result<geth::Client, Error> {
    let client = geth::Client::new(endpoint.url.clone());
    probe(&client, endpoint).await?;

    Ok(client)
}

/// Signing always uses the configured id; a node on a different chain only
/// gets a warning.
async fn probe<C>(connector: &C, endpoint: &ChainEndpoint) -> Result<ChainId, Error>
where
    C: Connector + ?Sized,
{
    let actual = connector.chain_id().await.map_err(|e| {
        Error::Connection(e.context(format!(
            "failed to connect to {} at {}",
            endpoint.name, endpoint.url
        )))
    })?;

    if actual != endpoint.chain_id {
        tracing::warn!(
            "{} at {} reports chain id {} but {} is configured",
            endpoint.name,
            endpoint.url,
            actual,
            endpoint.chain_id
        );
    }

    Ok(actual)
}
