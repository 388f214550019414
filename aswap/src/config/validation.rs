use crate::Error;
use conquer_once::Lazy;
use htlc::ethereum::Address;
use regex::Regex;

static ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new("^0x[0-9a-fA-F]{40}$").expect("static string to be a valid regex")
});

/// Checks the textual form of an address before anything touches the network.
pub fn validate_address(address: &str) -> Result<Address, Error> {
    if !ADDRESS.is_match(address) {
        return Err(Error::validation(format!("invalid address: {}", address)));
    }

    address
        .parse()
        .map_err(|e| Error::Validation(anyhow::Error::new(e).context(address.to_owned())))
}
