//! Contains the order type as it is signed by users, together with its EIP-712
//! hashing and the compact order UID.

use {
    crate::{domain::DomainSeparator, signature},
    alloy::primitives::{Address, B256, U256, keccak256},
    hex_literal::hex,
    serde::{Deserialize, Deserializer, Serialize, Serializer, de},
    std::{
        fmt::{self, Debug, Display},
        str::FromStr,
    },
    strum::{AsRefStr, EnumString},
};

/// The complete order data.
///
/// These are the exact fields that get signed and verified by the settlement
/// contract.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderData {
    pub sell_token: Address,
    pub buy_token: Address,
    pub sell_amount: U256,
    pub buy_amount: U256,
    pub valid_to: u32,
    pub app_data: u32,
    pub fee_amount: U256,
    pub kind: OrderKind,
    pub partially_fillable: bool,
}

impl OrderData {
    /// keccak256 of
    /// `Order(address sellToken,address buyToken,uint256 sellAmount,uint256 buyAmount,uint32 validTo,uint32 appData,uint256 feeAmount,string kind,bool partiallyFillable)`
    pub const TYPE_HASH: [u8; 32] =
        hex!("b2b38b9dcbdeb41f7ad71dea9aed79fb47f7bbc3436576fe994b43d5b16ecdec");

    /// Returns the value of hashStruct() over the order data as defined by
    /// EIP-712.
    ///
    /// https://eips.ethereum.org/EIPS/eip-712#definition-of-hashstruct
    pub fn hash_struct(&self) -> B256 {
        let mut hash_data = [0u8; 320];
        hash_data[0..32].copy_from_slice(&Self::TYPE_HASH);
        // Some slots are not assigned (stay 0) because all values are extended
        // to 256 bits.
        hash_data[44..64].copy_from_slice(self.sell_token.as_slice());
        hash_data[76..96].copy_from_slice(self.buy_token.as_slice());
        hash_data[96..128].copy_from_slice(&self.sell_amount.to_be_bytes::<32>());
        hash_data[128..160].copy_from_slice(&self.buy_amount.to_be_bytes::<32>());
        hash_data[188..192].copy_from_slice(&self.valid_to.to_be_bytes());
        hash_data[220..224].copy_from_slice(&self.app_data.to_be_bytes());
        hash_data[224..256].copy_from_slice(&self.fee_amount.to_be_bytes::<32>());
        hash_data[256..288].copy_from_slice(self.kind.as_contract_bytes());
        hash_data[319] = self.partially_fillable as u8;
        keccak256(hash_data)
    }

    /// The order digest: the EIP-712 signing message of the order for the
    /// specified domain. This is what identifies an order in its UID.
    pub fn digest(&self, domain: &DomainSeparator) -> B256 {
        signature::hashed_eip712_message(domain, &self.hash_struct())
    }

    pub fn uid(&self, domain: &DomainSeparator, owner: &Address) -> OrderUid {
        OrderUid::from_parts(self.digest(domain), *owner, self.valid_to)
    }
}

#[derive(Eq, PartialEq, Clone, Copy, Debug, Default, Deserialize, Serialize, Hash, EnumString, AsRefStr)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    #[default]
    Sell,
    Buy,
}

impl OrderKind {
    // keccak256("sell")
    pub const SELL: [u8; 32] =
        hex!("f3b277728b3fee749481eb3e0b3b48980dbbab78658fc419025cb16eee346775");
    // keccak256("buy")
    pub const BUY: [u8; 32] =
        hex!("6ed88e868af0a1983e3886d5f3e95a2fafbd6c3450bc229e27342283dc429ccc");

    pub fn as_contract_bytes(&self) -> &'static [u8; 32] {
        match self {
            Self::Sell => &Self::SELL,
            Self::Buy => &Self::BUY,
        }
    }

    pub fn from_contract_bytes(kind: [u8; 32]) -> Option<Self> {
        match kind {
            Self::SELL => Some(Self::Sell),
            Self::BUY => Some(Self::Buy),
            _ => None,
        }
    }
}

/// The length of an order UID in bytes.
pub const UID_LEN: usize = 56;

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
#[error("order UID must be 56 bytes but got {0}")]
pub struct InvalidUidLength(pub usize);

// uid as 56 bytes: 32 for orderDigest, 20 for ownerAddress and 4 for validTo
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct OrderUid(pub [u8; UID_LEN]);

impl OrderUid {
    /// Create a UID from its parts.
    pub fn from_parts(digest: B256, owner: Address, valid_to: u32) -> Self {
        let mut uid = [0; UID_LEN];
        uid[0..32].copy_from_slice(digest.as_slice());
        uid[32..52].copy_from_slice(owner.as_slice());
        uid[52..56].copy_from_slice(&valid_to.to_be_bytes());
        Self(uid)
    }

    /// Splits an order UID into its parts.
    pub fn parts(&self) -> (B256, Address, u32) {
        let mut valid_to = [0u8; 4];
        valid_to.copy_from_slice(&self.0[52..56]);
        (
            B256::from_slice(&self.0[0..32]),
            Address::from_slice(&self.0[32..52]),
            u32::from_be_bytes(valid_to),
        )
    }

    /// Reads a UID from raw bytes, which must be exactly [`UID_LEN`] long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, InvalidUidLength> {
        let uid: [u8; UID_LEN] = bytes
            .try_into()
            .map_err(|_| InvalidUidLength(bytes.len()))?;
        Ok(Self(uid))
    }
}

impl TryFrom<&[u8]> for OrderUid {
    type Error = InvalidUidLength;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(bytes)
    }
}

impl Default for OrderUid {
    fn default() -> Self {
        Self([0u8; UID_LEN])
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseUidError {
    #[error(transparent)]
    Hex(#[from] const_hex::FromHexError),
    #[error(transparent)]
    Length(#[from] InvalidUidLength),
}

impl FromStr for OrderUid {
    type Err = ParseUidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = const_hex::decode(s.strip_prefix("0x").unwrap_or(s))?;
        Ok(Self::from_slice(&bytes)?)
    }
}

impl Display for OrderUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", const_hex::encode(self.0))
    }
}

impl Debug for OrderUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl Serialize for OrderUid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OrderUid {
    fn deserialize<D>(deserializer: D) -> Result<OrderUid, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Visitor {}
        impl de::Visitor<'_> for Visitor {
            type Value = OrderUid;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "an uid with orderDigest_owner_validTo")
            }

            fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if !s.starts_with("0x") {
                    return Err(de::Error::custom(format!(
                        "{s:?} can't be decoded as hex uid because it does not start with '0x'"
                    )));
                }
                s.parse().map_err(|err| {
                    de::Error::custom(format!("failed to decode {s:?} as hex uid: {err}"))
                })
            }
        }

        deserializer.deserialize_str(Visitor {})
    }
}
