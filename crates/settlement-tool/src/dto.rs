//! JSON output of the settlement tool.

use {
    alloy::primitives::{Address, B256},
    serde::Serialize,
    settlement_encoding::{DecodedSettlement, DomainFields, DomainSeparator, Interaction, OrderUid},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement<'a> {
    tokens: &'a [Address],
    trades: Vec<Trade<'a>>,
    interactions: &'a [Interaction<'a>],
}

impl<'a> Settlement<'a> {
    pub fn new(settlement: &'a DecodedSettlement<'a>) -> Self {
        Self {
            tokens: settlement.tokens,
            trades: settlement
                .trades
                .iter()
                .map(|trade| Trade {
                    uid: trade.uid(),
                    trade,
                })
                .collect(),
            interactions: &settlement.interactions,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Trade<'a> {
    uid: OrderUid,
    #[serde(flatten)]
    trade: &'a settlement_encoding::Trade,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Uid {
    digest: B256,
    owner: Address,
    valid_to: u32,
}

impl From<&OrderUid> for Uid {
    fn from(uid: &OrderUid) -> Self {
        let (digest, owner, valid_to) = uid.parts();
        Self {
            digest,
            owner,
            valid_to,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain<'a> {
    name: &'a str,
    version: &'a str,
    chain_id: u64,
    verifying_contract: Address,
    domain_separator: DomainSeparator,
}

impl<'a> Domain<'a> {
    pub fn new(domain: &'a DomainFields, domain_separator: DomainSeparator) -> Self {
        Self {
            name: &domain.name,
            version: &domain.version,
            chain_id: domain.chain_id,
            verifying_contract: domain.verifying_contract,
            domain_separator,
        }
    }
}
