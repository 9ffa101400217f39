//! Interactions are arbitrary calls executed as part of a settlement. They are
//! packed back to back as `target ‖ uint24 callDataLength ‖ callData` with no
//! padding and no overall length prefix.

use {
    crate::{bytes_hex, observe},
    alloy::primitives::Address,
    serde::{Deserialize, Serialize},
    std::fmt::{self, Debug, Formatter},
};

/// The length of an encoded interaction header: the target address followed
/// by the 3 byte calldata length.
pub const HEADER_LEN: usize = 23;

/// The maximum calldata length representable by the 3 byte length prefix.
pub const MAX_CALL_DATA_LEN: usize = (1 << 24) - 1;

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// The record starting at `offset` is truncated: either its header or its
    /// calldata extends past the end of the input.
    #[error("interaction data at offset {offset} is truncated")]
    InvalidInteractionData { offset: usize },
    /// More interactions were encoded than the declared count.
    #[error("more than {0} interactions encoded")]
    OutOfCapacity(usize),
    #[error("interaction calldata of {0} bytes exceeds the maximum length")]
    CallDataTooLong(usize),
}

/// A decoded interaction. The calldata is borrowed from the encoded input.
#[derive(Clone, Copy, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction<'a> {
    pub target: Address,
    #[serde(with = "bytes_hex")]
    pub call_data: &'a [u8],
}

impl Interaction<'_> {
    /// The number of bytes of the encoded interaction.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.call_data.len()
    }

    /// Appends the encoded interaction to the buffer.
    pub fn encode_into(&self, buffer: &mut Vec<u8>) -> Result<(), Error> {
        let len = self.call_data.len();
        if len > MAX_CALL_DATA_LEN {
            return Err(Error::CallDataTooLong(len));
        }
        buffer.reserve(self.encoded_len());
        buffer.extend_from_slice(self.target.as_slice());
        buffer.extend_from_slice(&(len as u32).to_be_bytes()[1..]);
        buffer.extend_from_slice(self.call_data);
        Ok(())
    }

    pub fn to_interaction_data(&self) -> InteractionData {
        InteractionData {
            target: self.target,
            call_data: self.call_data.to_vec(),
        }
    }
}

impl Debug for Interaction<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Interaction")
            .field("target", &self.target)
            .field(
                "call_data",
                &format_args!("0x{}", const_hex::encode(self.call_data)),
            )
            .finish()
    }
}

/// An owned interaction, used when building settlements.
#[derive(Eq, PartialEq, Clone, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionData {
    pub target: Address,
    #[serde(with = "bytes_hex")]
    pub call_data: Vec<u8>,
}

impl InteractionData {
    pub fn as_interaction(&self) -> Interaction<'_> {
        Interaction {
            target: self.target,
            call_data: &self.call_data,
        }
    }
}

impl Debug for InteractionData {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.as_interaction().fmt(f)
    }
}

/// Encodes the interactions back to back.
pub fn encode_interactions<'a>(
    interactions: impl IntoIterator<Item = Interaction<'a>>,
) -> Result<Vec<u8>, Error> {
    let mut buffer = Vec::new();
    for interaction in interactions {
        interaction.encode_into(&mut buffer)?;
    }
    Ok(buffer)
}

/// Decodes interactions until the input is exhausted.
///
/// `expected_count` bounds the number of interactions: decoding a complete
/// interaction past it fails with [`Error::OutOfCapacity`]. Fewer interactions
/// than `expected_count` are accepted. The result is allocated once, with a
/// capacity of `expected_count` capped at the number of headers that fit in
/// `data`, and borrows the calldata from `data`.
pub fn decode_interactions(
    data: &[u8],
    expected_count: usize,
) -> Result<Vec<Interaction<'_>>, Error> {
    let result = decode(data, expected_count);
    match &result {
        Ok(interactions) => observe::decoded_interactions(interactions.len(), data.len()),
        Err(err) => observe::invalid_interactions(err),
    }
    result
}

fn decode(data: &[u8], expected_count: usize) -> Result<Vec<Interaction<'_>>, Error> {
    let mut interactions = Vec::with_capacity(expected_count.min(data.len() / HEADER_LEN));
    let mut offset = 0;
    while offset < data.len() {
        let (interaction, len) = decode_one(&data[offset..])
            .ok_or(Error::InvalidInteractionData { offset })?;
        if interactions.len() == expected_count {
            return Err(Error::OutOfCapacity(expected_count));
        }
        interactions.push(interaction);
        offset += len;
    }
    Ok(interactions)
}

/// Decodes the interaction at the start of `data`, returning it along with
/// its encoded length.
fn decode_one(data: &[u8]) -> Option<(Interaction<'_>, usize)> {
    let header = data.get(..HEADER_LEN)?;
    let target = Address::from_slice(&header[..20]);
    let call_data_len = u32::from_be_bytes([0, header[20], header[21], header[22]]) as usize;
    let call_data = data.get(HEADER_LEN..HEADER_LEN + call_data_len)?;
    Some((Interaction { target, call_data }, HEADER_LEN + call_data_len))
}

#[cfg(test)]
mod tests {
    use {super::*, hex_literal::hex, serde_json::json};

    fn interaction(target: u8, call_data: &[u8]) -> Interaction<'_> {
        Interaction {
            target: Address::repeat_byte(target),
            call_data,
        }
    }

    #[test]
    fn encode_layout() {
        let encoded = encode_interactions([interaction(0x01, &[0xca, 0xfe])]).unwrap();
        assert_eq!(
            encoded,
            hex!(
                "0101010101010101010101010101010101010101
                 000002
                 cafe"
            )
        );
    }

    #[test]
    fn round_trip_empty_call_data() {
        let interactions = [interaction(0x01, &[])];
        let encoded = encode_interactions(interactions).unwrap();
        assert_eq!(encoded.len(), HEADER_LEN);
        assert_eq!(decode_interactions(&encoded, 1).unwrap(), interactions);
    }

    #[test]
    fn round_trip_call_data() {
        let call_data = hex!("a9059cbb0000000000000000000000000202020202020202020202020202020202020202");
        let interactions = [interaction(0x01, &call_data)];
        let encoded = encode_interactions(interactions).unwrap();
        assert_eq!(decode_interactions(&encoded, 1).unwrap(), interactions);
    }

    #[test]
    fn round_trip_multiple() {
        let long = vec![0x5a; 300];
        let interactions = [
            interaction(0x11, &[0x01, 0x02, 0x03]),
            interaction(0x22, &[]),
            interaction(0x33, &long),
        ];
        let encoded = encode_interactions(interactions).unwrap();
        assert_eq!(encoded.len(), 3 * HEADER_LEN + 3 + 300);
        let decoded = decode_interactions(&encoded, 3).unwrap();
        assert_eq!(decoded, interactions);
    }

    #[test]
    fn decoding_borrows_call_data() {
        let encoded = encode_interactions([interaction(0x01, &[1, 2, 3, 4])]).unwrap();
        let decoded = decode_interactions(&encoded, 1).unwrap();
        assert!(std::ptr::eq(decoded[0].call_data, &encoded[HEADER_LEN..]));
    }

    #[test]
    fn empty_input() {
        assert!(decode_interactions(&[], 0).unwrap().is_empty());
        assert!(decode_interactions(&[], 2).unwrap().is_empty());
    }

    #[test]
    fn fewer_interactions_than_expected() {
        let interactions = [interaction(0x01, &[0xff])];
        let encoded = encode_interactions(interactions).unwrap();
        let decoded = decode_interactions(&encoded, 4).unwrap();
        assert_eq!(decoded, interactions);
    }

    #[test]
    fn expected_count_larger_than_data() {
        assert!(decode_interactions(&[], usize::MAX).unwrap().is_empty());

        let interactions = [interaction(0x01, &[0xff]), interaction(0x02, &[])];
        let encoded = encode_interactions(interactions).unwrap();
        let decoded = decode_interactions(&encoded, usize::MAX).unwrap();
        assert_eq!(decoded, interactions);
        assert!(decoded.capacity() < 16);
    }

    #[test]
    fn one_more_interaction_than_expected() {
        let encoded = encode_interactions([
            interaction(0x01, &[0x01]),
            interaction(0x02, &[0x02]),
            interaction(0x03, &[0x03]),
        ])
        .unwrap();
        assert_eq!(
            decode_interactions(&encoded, 2),
            Err(Error::OutOfCapacity(2))
        );
        assert_eq!(
            decode_interactions(&encoded, 0),
            Err(Error::OutOfCapacity(0))
        );
    }

    #[test]
    fn call_data_past_end_of_input() {
        let mut encoded = encode_interactions([interaction(0x01, &[0x01, 0x02])]).unwrap();
        encoded.pop();
        assert_eq!(
            decode_interactions(&encoded, 1),
            Err(Error::InvalidInteractionData { offset: 0 })
        );
    }

    #[test]
    fn trailing_bytes_after_expected_count() {
        let mut encoded = encode_interactions([interaction(0x01, &[0x01])]).unwrap();
        let first_len = encoded.len();

        // Trailing bytes that don't form a header are reported as invalid
        // data, even though the expected count was already reached.
        encoded.extend_from_slice(&[0x00; 5]);
        assert_eq!(
            decode_interactions(&encoded, 1),
            Err(Error::InvalidInteractionData { offset: first_len })
        );

        // A complete header whose calldata is missing as well.
        encoded.truncate(first_len);
        encoded.extend_from_slice(&hex!("0202020202020202020202020202020202020202 000010"));
        assert_eq!(
            decode_interactions(&encoded, 1),
            Err(Error::InvalidInteractionData { offset: first_len })
        );
    }

    #[test]
    fn call_data_too_long() {
        let call_data = vec![0u8; MAX_CALL_DATA_LEN + 1];
        assert_eq!(
            encode_interactions([interaction(0x01, &call_data)]),
            Err(Error::CallDataTooLong(MAX_CALL_DATA_LEN + 1))
        );
    }

    #[test]
    fn max_call_data_len() {
        let call_data = vec![0x42u8; MAX_CALL_DATA_LEN];
        let encoded = encode_interactions([interaction(0x01, &call_data)]).unwrap();
        assert_eq!(encoded[20..23], [0xff, 0xff, 0xff]);
        let decoded = decode_interactions(&encoded, 1).unwrap();
        assert_eq!(decoded[0].call_data.len(), MAX_CALL_DATA_LEN);
    }

    #[test]
    fn owned_interaction_serialization() {
        let owned = interaction(0x01, &[0x01, 0x02, 0x03]).to_interaction_data();
        let value = json!({
            "target": "0x0101010101010101010101010101010101010101",
            "callData": "0x010203",
        });
        assert_eq!(serde_json::to_value(&owned).unwrap(), value);
        assert_eq!(serde_json::to_value(owned.as_interaction()).unwrap(), value);
        assert_eq!(
            serde_json::from_value::<InteractionData>(value).unwrap(),
            owned
        );
    }
}
