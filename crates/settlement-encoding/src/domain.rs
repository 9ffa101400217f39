//! Types and procedures defined by EIP-712 for binding signatures to a single
//! deployment of the settlement contract.
//!
//! https://eips.ethereum.org/EIPS/eip-712#definition-of-domainseparator

use {
    alloy::primitives::{Address, B256, keccak256},
    serde::{Deserialize, Deserializer, Serialize, Serializer, de},
    std::{
        fmt::{self, Debug, Display, Formatter},
        str::FromStr,
        sync::LazyLock,
    },
};

/// The EIP-712 domain type used for computing the domain separator.
pub const DOMAIN_TYPE: &[u8] =
    b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// The domain name used by the settlement contract.
pub const DEFAULT_NAME: &str = "Gnosis Protocol";

/// The domain version used by the settlement contract.
pub const DEFAULT_VERSION: &str = "v2";

static DOMAIN_TYPE_HASH: LazyLock<B256> = LazyLock::new(|| keccak256(DOMAIN_TYPE));

/// The fields of an EIP-712 domain. Together with the fixed domain type they
/// determine the [`DomainSeparator`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DomainFields {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl DomainFields {
    /// Domain fields of the settlement contract deployed at
    /// `verifying_contract` on the chain identified by `chain_id`.
    pub fn gpv2(chain_id: u64, verifying_contract: Address) -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            version: DEFAULT_VERSION.to_string(),
            chain_id,
            verifying_contract,
        }
    }
}

/// domainSeparator as defined by EIP-712.
#[derive(Copy, Clone, Default, Eq, Hash, PartialEq)]
pub struct DomainSeparator(pub [u8; 32]);

impl DomainSeparator {
    pub fn new(domain: &DomainFields) -> Self {
        // All values are extended to 256 bits, so the address is left padded.
        let mut buffer = [0u8; 160];
        buffer[0..32].copy_from_slice(DOMAIN_TYPE_HASH.as_slice());
        buffer[32..64].copy_from_slice(keccak256(domain.name.as_bytes()).as_slice());
        buffer[64..96].copy_from_slice(keccak256(domain.version.as_bytes()).as_slice());
        buffer[120..128].copy_from_slice(&domain.chain_id.to_be_bytes());
        buffer[140..160].copy_from_slice(domain.verifying_contract.as_slice());
        Self(keccak256(buffer).0)
    }

    /// Shorthand for the domain of a settlement contract deployment.
    pub fn gpv2(chain_id: u64, verifying_contract: Address) -> Self {
        Self::new(&DomainFields::gpv2(chain_id, verifying_contract))
    }
}

impl FromStr for DomainSeparator {
    type Err = const_hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut value = [0u8; 32];
        const_hex::decode_to_slice(s.strip_prefix("0x").unwrap_or(s), &mut value)?;
        Ok(Self(value))
    }
}

impl Display for DomainSeparator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", const_hex::encode(self.0))
    }
}

impl Debug for DomainSeparator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&const_hex::encode(self.0))
    }
}

impl Serialize for DomainSeparator {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DomainSeparator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|err| {
            de::Error::custom(format!("failed to decode {s:?} as domain separator: {err}"))
        })
    }
}
