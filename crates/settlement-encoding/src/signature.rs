use {
    crate::domain::DomainSeparator,
    alloy::{
        primitives::{self, Address, B256, U256, keccak256},
        signers::{SignerSync, local::PrivateKeySigner},
    },
    serde::{Deserialize, Serialize, de},
    std::fmt::{self, Debug, Formatter},
};

/// The length of an encoded ECDSA signature: `r ‖ s ‖ v`.
pub const ECDSA_SIGNATURE_LEN: usize = 65;

/// How the order was signed. Each scheme derives a different message from
/// the order hash which is then signed with ECDSA.
#[derive(Eq, PartialEq, Clone, Copy, Debug, Default, Deserialize, Serialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SigningScheme {
    /// The order struct is signed according to EIP-712.
    ///
    /// https://eips.ethereum.org/EIPS/eip-712
    #[default]
    Eip712,
    /// The order digest is signed according to EIP-191's personal_sign
    /// signature format.
    ///
    /// https://eips.ethereum.org/EIPS/eip-191
    EthSign,
}

impl SigningScheme {
    /// Returns the message used for signing and recovery of the order with
    /// the specified struct hash.
    pub fn signing_message(&self, domain: &DomainSeparator, struct_hash: &B256) -> B256 {
        self.signing_message_for_digest(&hashed_eip712_message(domain, struct_hash))
    }

    /// Returns the message used for signing and recovery of the order with
    /// the specified order digest.
    pub fn signing_message_for_digest(&self, digest: &B256) -> B256 {
        match self {
            Self::Eip712 => *digest,
            Self::EthSign => hashed_ethsign_message(digest),
        }
    }

    /// The byte identifying the scheme in an encoded trade.
    pub fn as_byte(&self) -> u8 {
        match self {
            Self::Eip712 => 0,
            Self::EthSign => 1,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Eip712),
            1 => Some(Self::EthSign),
            _ => None,
        }
    }
}

/// Returns the EIP-712 signing message for a struct hash in the given domain.
pub fn hashed_eip712_message(domain: &DomainSeparator, struct_hash: &B256) -> B256 {
    let mut message = [0u8; 66];
    message[0..2].copy_from_slice(&[0x19, 0x01]);
    message[2..34].copy_from_slice(&domain.0);
    message[34..66].copy_from_slice(struct_hash.as_slice());
    keccak256(message)
}

/// Returns the EIP-191 personal message hash of a 32 byte digest.
fn hashed_ethsign_message(digest: &B256) -> B256 {
    let mut message = [0u8; 60];
    message[..28].copy_from_slice(b"\x19Ethereum Signed Message:\n32");
    message[28..].copy_from_slice(digest.as_slice());
    keccak256(message)
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
#[error("invalid signature")]
pub struct InvalidSignature;

/// Signature over the order data.
/// All variants rely on the EIP-712 hash of the order data, referred to as the
/// order hash.
#[derive(Eq, PartialEq, Clone, Copy, Hash)]
pub enum Signature {
    Eip712(EcdsaSignature),
    EthSign(EcdsaSignature),
}

impl Default for Signature {
    fn default() -> Self {
        Self::Eip712(Default::default())
    }
}

impl Debug for Signature {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let scheme = format!("{:?}", self.scheme());
        let bytes = format!("0x{}", const_hex::encode(self.ecdsa().to_bytes()));
        f.debug_tuple(&scheme).field(&bytes).finish()
    }
}

impl Signature {
    /// Reads a signature from its raw bytes. ECDSA signatures must be exactly
    /// 65 bytes long.
    pub fn from_bytes(scheme: SigningScheme, bytes: &[u8]) -> Result<Self, InvalidSignature> {
        let bytes: &[u8; ECDSA_SIGNATURE_LEN] = bytes.try_into().map_err(|_| InvalidSignature)?;
        Ok(EcdsaSignature::from_bytes(bytes).to_signature(scheme))
    }

    pub fn scheme(&self) -> SigningScheme {
        match self {
            Self::Eip712(_) => SigningScheme::Eip712,
            Self::EthSign(_) => SigningScheme::EthSign,
        }
    }

    pub fn ecdsa(&self) -> &EcdsaSignature {
        match self {
            Self::Eip712(signature) | Self::EthSign(signature) => signature,
        }
    }

    /// Recovers the owner of an order with the specified struct hash.
    pub fn recover(
        &self,
        domain: &DomainSeparator,
        struct_hash: &B256,
    ) -> Result<Address, InvalidSignature> {
        self.ecdsa().recover(self.scheme(), domain, struct_hash)
    }

    /// Recovers the owner of an order with the specified order digest, see
    /// [`crate::order::OrderData::digest`].
    pub fn recover_from_digest(&self, digest: &B256) -> Result<Address, InvalidSignature> {
        self.ecdsa().recover_from_digest(self.scheme(), digest)
    }
}

/// An internal type used for deriving `serde` implementations for the
/// `Signature` type.
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSignature {
    signing_scheme: SigningScheme,
    signature: EcdsaSignature,
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        JsonSignature {
            signing_scheme: self.scheme(),
            signature: *self.ecdsa(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let json = JsonSignature::deserialize(deserializer)?;
        Ok(json.signature.to_signature(json.signing_scheme))
    }
}

#[derive(Eq, PartialEq, Clone, Copy, Debug, Default, Hash)]
pub struct EcdsaSignature {
    pub r: B256,
    pub s: B256,
    pub v: u8,
}

impl EcdsaSignature {
    pub fn to_signature(self, scheme: SigningScheme) -> Signature {
        match scheme {
            SigningScheme::Eip712 => Signature::Eip712(self),
            SigningScheme::EthSign => Signature::EthSign(self),
        }
    }

    /// r + s + v
    pub fn to_bytes(self) -> [u8; ECDSA_SIGNATURE_LEN] {
        let mut bytes = [0u8; ECDSA_SIGNATURE_LEN];
        bytes[..32].copy_from_slice(self.r.as_slice());
        bytes[32..64].copy_from_slice(self.s.as_slice());
        bytes[64] = self.v;
        bytes
    }

    pub fn from_bytes(bytes: &[u8; ECDSA_SIGNATURE_LEN]) -> Self {
        EcdsaSignature {
            r: B256::from_slice(&bytes[..32]),
            s: B256::from_slice(&bytes[32..64]),
            v: bytes[64],
        }
    }

    /// Recovers the signer of an order with the specified struct hash.
    ///
    /// Only the legacy `v` values 27 and 28 are accepted, and a recovered
    /// zero address is treated as an invalid signature.
    pub fn recover(
        &self,
        scheme: SigningScheme,
        domain: &DomainSeparator,
        struct_hash: &B256,
    ) -> Result<Address, InvalidSignature> {
        self.recover_from_digest(scheme, &hashed_eip712_message(domain, struct_hash))
    }

    pub fn recover_from_digest(
        &self,
        scheme: SigningScheme,
        digest: &B256,
    ) -> Result<Address, InvalidSignature> {
        let y_parity = match self.v {
            27 => false,
            28 => true,
            _ => return Err(InvalidSignature),
        };
        let message = scheme.signing_message_for_digest(digest);
        let signature = primitives::Signature::new(
            U256::from_be_bytes(self.r.0),
            U256::from_be_bytes(self.s.0),
            y_parity,
        );
        let owner = signature
            .recover_address_from_prehash(&message)
            .map_err(|_| InvalidSignature)?;
        if owner.is_zero() {
            return Err(InvalidSignature);
        }
        Ok(owner)
    }

    /// Signs the order with the specified struct hash.
    pub fn sign(
        scheme: SigningScheme,
        domain: &DomainSeparator,
        struct_hash: &B256,
        signer: &PrivateKeySigner,
    ) -> Result<Self, alloy::signers::Error> {
        let message = scheme.signing_message(domain, struct_hash);
        let signature = signer.sign_hash_sync(&message)?;
        Ok(Self {
            r: B256::from(signature.r().to_be_bytes::<32>()),
            s: B256::from(signature.s().to_be_bytes::<32>()),
            v: 27 + u8::from(signature.v()),
        })
    }
}

impl Serialize for EcdsaSignature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&format!("0x{}", const_hex::encode(self.to_bytes())))
    }
}

impl<'de> Deserialize<'de> for EcdsaSignature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor {}
        impl de::Visitor<'_> for Visitor {
            type Value = EcdsaSignature;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(
                    formatter,
                    "the 65 ecdsa signature bytes as a hex encoded string, ordered as r, s, v, \
                     where v is either 27 or 28"
                )
            }

            fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                let s = s.strip_prefix("0x").ok_or_else(|| {
                    de::Error::custom(format!(
                        "{s:?} can't be decoded as hex ecdsa signature because it does not start \
                         with '0x'"
                    ))
                })?;
                let mut bytes = [0u8; ECDSA_SIGNATURE_LEN];
                const_hex::decode_to_slice(s, &mut bytes).map_err(|err| {
                    de::Error::custom(format!(
                        "failed to decode {s:?} as hex ecdsa signature: {err}"
                    ))
                })?;
                Ok(EcdsaSignature::from_bytes(&bytes))
            }
        }

        deserializer.deserialize_str(Visitor {})
    }
}
