//! Encoding, decoding and authentication of batch settlements.
//!
//! A settlement consists of a token table, a sequence of trades referencing
//! tokens by their index in that table, and a sequence of interactions. Trades
//! carry signed orders whose owners are recovered from their signatures while
//! decoding.

pub mod bytes_hex;
pub mod domain;
pub mod interaction;
mod observe;
pub mod order;
pub mod settlement;
pub mod signature;
pub mod trade;

pub use {
    domain::{DomainFields, DomainSeparator},
    interaction::{Interaction, InteractionData, decode_interactions, encode_interactions},
    order::{OrderData, OrderKind, OrderUid},
    settlement::{DecodedSettlement, EncodedSettlement, SettlementEncoder},
    signature::{EcdsaSignature, Signature, SigningScheme},
    trade::{Trade, TradeData, decode_trades, encode_trades, trade_count},
};
