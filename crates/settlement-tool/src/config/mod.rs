use {
    alloy::primitives::{Address, address},
    settlement_encoding::{DomainFields, DomainSeparator},
};

pub mod file;

pub use file::load;

/// Address of the settlement contract, identical on all supported chains.
pub const SETTLEMENT_CONTRACT: Address = address!("9008D19f58AAbD9eD0D60971565AA8510560ab41");

/// The domain orders are signed in.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub domain: DomainFields,
    pub domain_separator: DomainSeparator,
}

impl Config {
    pub fn new(domain: DomainFields) -> Self {
        let domain_separator = DomainSeparator::new(&domain);
        Self {
            domain,
            domain_separator,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DomainFields::gpv2(1, SETTLEMENT_CONTRACT))
    }
}
