//! Log events emitted while encoding and decoding settlements. Each function
//! represents an event that is meaningful to the system.

use crate::{interaction, settlement, trade};

pub fn decoded_trades(count: usize, tokens: usize) {
    tracing::debug!(count, tokens, "decoded trades");
}

pub fn decoded_trade(index: usize, trade: &trade::Trade) {
    tracing::trace!(index, owner = %trade.owner, uid = %trade.uid(), "authenticated trade");
}

pub fn invalid_trades(err: &trade::Error) {
    tracing::debug!(?err, "rejected trade data");
}

pub fn decoded_interactions(count: usize, bytes: usize) {
    tracing::debug!(count, bytes, "decoded interactions");
}

pub fn invalid_interactions(err: &interaction::Error) {
    tracing::debug!(?err, "rejected interaction data");
}

pub fn encoded_settlement(settlement: &settlement::EncodedSettlement) {
    tracing::debug!(
        tokens = settlement.tokens.len(),
        trade_bytes = settlement.trades.len(),
        interactions = settlement.interaction_count,
        "encoded settlement"
    );
}

pub fn rejected_settlement(err: &settlement::Error) {
    tracing::warn!(?err, "rejected settlement");
}
