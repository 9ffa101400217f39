//! Trades reference their tokens by index into a token table that is shared
//! by the whole settlement. Each trade is encoded as a fixed size record:
//!
//! | offset | size | field                                     |
//! |--------|------|-------------------------------------------|
//! | 0      | 1    | sell token index                          |
//! | 1      | 1    | buy token index                           |
//! | 2      | 32   | sell amount                               |
//! | 34     | 32   | buy amount                                |
//! | 66     | 4    | valid to                                  |
//! | 70     | 4    | app data                                  |
//! | 74     | 32   | fee amount                                |
//! | 106    | 1    | order flags                               |
//! | 107    | 32   | executed amount                           |
//! | 139    | 2    | fee discount                              |
//! | 141    | 1    | signing scheme                            |
//! | 142    | 65   | ECDSA signature `r ‖ s ‖ v`               |
//!
//! All integers are big-endian.

use {
    crate::{
        domain::DomainSeparator,
        observe,
        order::{OrderData, OrderKind, OrderUid},
        signature::{ECDSA_SIGNATURE_LEN, EcdsaSignature, Signature, SigningScheme},
    },
    alloy::primitives::{Address, B256, U256},
    serde::{Deserialize, Serialize},
};

/// The length of a single encoded trade.
pub const TRADE_STRIDE: usize = 207;

/// Order flag set for buy orders. Sell orders leave it cleared.
const BUY_ORDER_FLAG: u8 = 0b01;
/// Order flag set for partially fillable orders.
const PARTIALLY_FILLABLE_FLAG: u8 = 0b10;

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("trade data of {0} bytes is not a positive multiple of the trade length")]
    MalformedTradeData(usize),
    #[error("token index {index} is out of range for a token table of length {table_len}")]
    InvalidTokenIndex { index: u8, table_len: usize },
    #[error("invalid order flags {0:#04x}")]
    InvalidOrderFlags(u8),
    #[error("unknown signing scheme {0}")]
    UnknownSigningScheme(u8),
    #[error("invalid signature for trade {index}")]
    InvalidSignature { index: usize },
}

/// A trade as it is encoded in a settlement.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeData {
    pub sell_token_index: u8,
    pub buy_token_index: u8,
    #[serde(flatten)]
    pub order: OrderData,
    /// The executed trade amount. Depending on the order kind this is the
    /// sell or the buy amount of the trade.
    pub executed_amount: U256,
    pub fee_discount: u16,
    #[serde(flatten)]
    pub signature: Signature,
}

impl TradeData {
    fn order_flags(&self) -> u8 {
        let mut flags = 0;
        if self.order.kind == OrderKind::Buy {
            flags |= BUY_ORDER_FLAG;
        }
        if self.order.partially_fillable {
            flags |= PARTIALLY_FILLABLE_FLAG;
        }
        flags
    }

    /// Appends the encoded trade to the buffer. The token addresses of the
    /// order are not part of the encoding, only their indices are.
    pub fn encode_into(&self, buffer: &mut Vec<u8>) {
        buffer.reserve(TRADE_STRIDE);
        buffer.push(self.sell_token_index);
        buffer.push(self.buy_token_index);
        buffer.extend_from_slice(&self.order.sell_amount.to_be_bytes::<32>());
        buffer.extend_from_slice(&self.order.buy_amount.to_be_bytes::<32>());
        buffer.extend_from_slice(&self.order.valid_to.to_be_bytes());
        buffer.extend_from_slice(&self.order.app_data.to_be_bytes());
        buffer.extend_from_slice(&self.order.fee_amount.to_be_bytes::<32>());
        buffer.push(self.order_flags());
        buffer.extend_from_slice(&self.executed_amount.to_be_bytes::<32>());
        buffer.extend_from_slice(&self.fee_discount.to_be_bytes());
        buffer.push(self.signature.scheme().as_byte());
        buffer.extend_from_slice(&self.signature.ecdsa().to_bytes());
    }
}

/// Encodes the trades back to back.
pub fn encode_trades<'a>(trades: impl IntoIterator<Item = &'a TradeData>) -> Vec<u8> {
    let trades = trades.into_iter();
    let mut buffer = Vec::with_capacity(trades.size_hint().0 * TRADE_STRIDE);
    for trade in trades {
        trade.encode_into(&mut buffer);
    }
    buffer
}

/// A decoded trade whose owner was recovered from its signature.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    #[serde(flatten)]
    pub data: TradeData,
    pub owner: Address,
    /// The order digest, see [`OrderData::digest`].
    pub digest: B256,
}

impl Trade {
    pub fn uid(&self) -> OrderUid {
        OrderUid::from_parts(self.digest, self.owner, self.data.order.valid_to)
    }
}

/// Returns the number of trades encoded in `data`.
pub fn trade_count(data: &[u8]) -> Result<usize, Error> {
    if data.is_empty() || data.len() % TRADE_STRIDE != 0 {
        return Err(Error::MalformedTradeData(data.len()));
    }
    Ok(data.len() / TRADE_STRIDE)
}

/// Decodes and authenticates the trades encoded in `data`.
///
/// Token indices are resolved against `tokens` and the owner of every trade
/// is recovered from its signature in the given domain. Any invalid trade
/// rejects the whole batch. The only allocation is the returned vector.
pub fn decode_trades(
    domain: &DomainSeparator,
    tokens: &[Address],
    data: &[u8],
) -> Result<Vec<Trade>, Error> {
    let result = decode(domain, tokens, data);
    match &result {
        Ok(trades) => observe::decoded_trades(trades.len(), tokens.len()),
        Err(err) => observe::invalid_trades(err),
    }
    result
}

fn decode(domain: &DomainSeparator, tokens: &[Address], data: &[u8]) -> Result<Vec<Trade>, Error> {
    let mut trades = Vec::with_capacity(trade_count(data)?);
    for (index, record) in data.chunks_exact(TRADE_STRIDE).enumerate() {
        let trade = decode_one(domain, tokens, index, record)?;
        observe::decoded_trade(index, &trade);
        trades.push(trade);
    }
    Ok(trades)
}

fn decode_one(
    domain: &DomainSeparator,
    tokens: &[Address],
    index: usize,
    record: &[u8],
) -> Result<Trade, Error> {
    let mut reader = Reader::new(record);
    let sell_token_index = reader.u8();
    let buy_token_index = reader.u8();
    let sell_token = token(tokens, sell_token_index)?;
    let buy_token = token(tokens, buy_token_index)?;

    let sell_amount = reader.u256();
    let buy_amount = reader.u256();
    let valid_to = u32::from_be_bytes(reader.bytes());
    let app_data = u32::from_be_bytes(reader.bytes());
    let fee_amount = reader.u256();
    let flags = reader.u8();
    if flags & !(BUY_ORDER_FLAG | PARTIALLY_FILLABLE_FLAG) != 0 {
        return Err(Error::InvalidOrderFlags(flags));
    }
    let executed_amount = reader.u256();
    let fee_discount = u16::from_be_bytes(reader.bytes());
    let scheme = reader.u8();
    let scheme = SigningScheme::from_byte(scheme).ok_or(Error::UnknownSigningScheme(scheme))?;
    let signature = EcdsaSignature::from_bytes(&reader.bytes::<ECDSA_SIGNATURE_LEN>())
        .to_signature(scheme);

    let order = OrderData {
        sell_token,
        buy_token,
        sell_amount,
        buy_amount,
        valid_to,
        app_data,
        fee_amount,
        kind: if flags & BUY_ORDER_FLAG != 0 {
            OrderKind::Buy
        } else {
            OrderKind::Sell
        },
        partially_fillable: flags & PARTIALLY_FILLABLE_FLAG != 0,
    };
    let digest = order.digest(domain);
    let owner = signature
        .recover_from_digest(&digest)
        .map_err(|_| Error::InvalidSignature { index })?;

    Ok(Trade {
        data: TradeData {
            sell_token_index,
            buy_token_index,
            order,
            executed_amount,
            fee_discount,
            signature,
        },
        owner,
        digest,
    })
}

fn token(tokens: &[Address], index: u8) -> Result<Address, Error> {
    tokens
        .get(usize::from(index))
        .copied()
        .ok_or(Error::InvalidTokenIndex {
            index,
            table_len: tokens.len(),
        })
}

/// Reads fixed size fields from a single trade record. The record length is
/// checked up front so reads never run past its end.
struct Reader<'a> {
    record: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(record: &'a [u8]) -> Self {
        debug_assert_eq!(record.len(), TRADE_STRIDE);
        Self { record, offset: 0 }
    }

    fn bytes<const N: usize>(&mut self) -> [u8; N] {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.record[self.offset..self.offset + N]);
        self.offset += N;
        bytes
    }

    fn u8(&mut self) -> u8 {
        let [byte] = self.bytes();
        byte
    }

    fn u256(&mut self) -> U256 {
        U256::from_be_bytes(self.bytes::<32>())
    }
}
