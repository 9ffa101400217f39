//! Incremental construction of encoded settlements and decoding of a
//! complete settlement.

use {
    crate::{
        bytes_hex,
        domain::DomainSeparator,
        interaction::{self, Interaction, InteractionData},
        observe,
        order::OrderData,
        signature::Signature,
        trade::{self, Trade, TradeData},
    },
    alloy::primitives::{Address, U256},
    serde::{Deserialize, Serialize},
};

/// The number of tokens addressable by the single byte token indices.
pub const MAX_TOKENS: usize = 1 << 8;

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Trade(#[from] trade::Error),
    #[error(transparent)]
    Interaction(#[from] interaction::Error),
    #[error("token {0} is not part of the settlement")]
    TokenNotInTable(Address),
    #[error("{0} tokens exceed the maximum of 256 tokens in a settlement")]
    TooManyTokens(usize),
}

/// An intermediate settlement representation that can be incrementally
/// constructed.
#[derive(Clone, Debug, Default)]
pub struct SettlementEncoder {
    // Invariant: sorted and free of duplicates.
    tokens: Vec<Address>,
    trades: Vec<TradeData>,
    interactions: Vec<InteractionData>,
}

impl SettlementEncoder {
    /// Creates a new settlement encoder for the specified tokens.
    ///
    /// The tokens must be provided up front so that trades can be encoded
    /// with their token indices. The token table is sorted so that identical
    /// settlements encode identically and indices can be found by binary
    /// search.
    pub fn new(tokens: impl IntoIterator<Item = Address>) -> Result<Self, Error> {
        let mut tokens = tokens.into_iter().collect::<Vec<_>>();
        tokens.sort();
        tokens.dedup();
        if tokens.len() > MAX_TOKENS {
            return Err(Error::TooManyTokens(tokens.len()));
        }

        Ok(Self {
            tokens,
            trades: Vec::new(),
            interactions: Vec::new(),
        })
    }

    pub fn tokens(&self) -> &[Address] {
        &self.tokens
    }

    pub fn trades(&self) -> &[TradeData] {
        &self.trades
    }

    pub fn interactions(&self) -> &[InteractionData] {
        &self.interactions
    }

    /// Adds a trade for a signed order. Fails if either of the order's tokens
    /// is not part of the settlement.
    pub fn add_trade(
        &mut self,
        order: OrderData,
        signature: Signature,
        executed_amount: U256,
        fee_discount: u16,
    ) -> Result<&TradeData, Error> {
        let sell_token_index = self.token_index(order.sell_token)?;
        let buy_token_index = self.token_index(order.buy_token)?;
        self.trades.push(TradeData {
            sell_token_index,
            buy_token_index,
            order,
            executed_amount,
            fee_discount,
            signature,
        });
        Ok(&self.trades[self.trades.len() - 1])
    }

    pub fn add_interaction(&mut self, interaction: InteractionData) {
        self.interactions.push(interaction);
    }

    pub fn encode(&self) -> Result<EncodedSettlement, Error> {
        let result = self.encode_inner();
        match &result {
            Ok(settlement) => observe::encoded_settlement(settlement),
            Err(err) => observe::rejected_settlement(err),
        }
        result
    }

    fn encode_inner(&self) -> Result<EncodedSettlement, Error> {
        Ok(EncodedSettlement {
            tokens: self.tokens.clone(),
            trades: trade::encode_trades(&self.trades),
            interactions: interaction::encode_interactions(
                self.interactions.iter().map(InteractionData::as_interaction),
            )?,
            interaction_count: self.interactions.len(),
        })
    }

    fn token_index(&self, token: Address) -> Result<u8, Error> {
        let index = self
            .tokens
            .binary_search(&token)
            .map_err(|_| Error::TokenNotInTable(token))?;
        // The table never holds more than `MAX_TOKENS` entries.
        u8::try_from(index).map_err(|_| Error::TooManyTokens(self.tokens.len()))
    }
}

/// A settlement in its encoded form.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedSettlement {
    pub tokens: Vec<Address>,
    #[serde(with = "bytes_hex")]
    pub trades: Vec<u8>,
    #[serde(with = "bytes_hex")]
    pub interactions: Vec<u8>,
    pub interaction_count: usize,
}

impl EncodedSettlement {
    /// Decodes and authenticates the trades and splits the interactions of
    /// the settlement. A settlement without trades has an empty trade blob.
    /// Any invalid trade or interaction rejects the whole settlement.
    pub fn decode(&self, domain: &DomainSeparator) -> Result<DecodedSettlement<'_>, Error> {
        let result = self.decode_inner(domain);
        if let Err(err) = &result {
            observe::rejected_settlement(err);
        }
        result
    }

    fn decode_inner(&self, domain: &DomainSeparator) -> Result<DecodedSettlement<'_>, Error> {
        if self.tokens.len() > MAX_TOKENS {
            return Err(Error::TooManyTokens(self.tokens.len()));
        }
        let trades = if self.trades.is_empty() {
            Vec::new()
        } else {
            trade::decode_trades(domain, &self.tokens, &self.trades)?
        };
        let interactions =
            interaction::decode_interactions(&self.interactions, self.interaction_count)?;
        Ok(DecodedSettlement {
            tokens: &self.tokens,
            trades,
            interactions,
        })
    }
}

/// A decoded settlement. Interaction calldata is borrowed from the encoded
/// settlement.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedSettlement<'a> {
    pub tokens: &'a [Address],
    pub trades: Vec<Trade>,
    pub interactions: Vec<Interaction<'a>>,
}
