//! Fixed-width bit-packed encoding of a game state.
//!
//! Layout, low bit first: 1 bit side-to-move (1 = top player), five 4-bit
//! card indices, two 3-bit dimensions, then per player (top first) one
//! 6-bit coordinate code per board column. A code is `x + y * width`; the
//! sentinel 49 marks a captured master or an unused student slot.

use crate::domain::board::{Board, MAX_DIMENSION};
use crate::domain::card::Card;
use crate::domain::game::CARD_COUNT;
use crate::domain::models::Color;
use crate::error::Error;
use crate::infrastructure::base64;
use smallvec::SmallVec;
use std::fmt;

pub const CARD_BITS: usize = 4;
pub const DIMENSION_BITS: usize = 3;
pub const COORDINATE_BITS: usize = 6;

/// Coordinate code for "captured / absent".
pub const CAPTURED_CODE: usize = MAX_DIMENSION * MAX_DIMENSION;

/// Container width: enough for the largest supported board.
pub const SERIALIZATION_BITS: usize =
    1 + CARD_COUNT * CARD_BITS + 2 * DIMENSION_BITS + 2 * MAX_DIMENSION * COORDINATE_BITS;

pub const SERIALIZATION_BYTES: usize = SERIALIZATION_BITS.div_ceil(8);

const BITS_MASK: u128 = (1u128 << SERIALIZATION_BITS) - 1;

/// A packed game state; the unique identifier of a state up to raw
/// equality.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameSerialization(u128);

impl GameSerialization {
    pub fn from_bits(bits: u128) -> Self {
        GameSerialization(bits & BITS_MASK)
    }

    pub fn bits(self) -> u128 {
        self.0
    }

    pub fn to_base64(self) -> String {
        base64::encode(self.0)
    }

    pub fn from_base64(text: &str) -> Result<Self, Error> {
        Ok(GameSerialization(base64::decode(text, SERIALIZATION_BITS)?))
    }

    /// Byte form used by snapshots: bits written from the highest container
    /// bit down, MSB-first within each byte, zero-padded at the tail.
    pub fn to_bytes(self) -> [u8; SERIALIZATION_BYTES] {
        let mut bytes = [0u8; SERIALIZATION_BYTES];
        for position in 0..SERIALIZATION_BITS {
            let bit = (self.0 >> (SERIALIZATION_BITS - 1 - position)) & 1;
            if bit == 1 {
                bytes[position / 8] |= 1 << (7 - position % 8);
            }
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8; SERIALIZATION_BYTES]) -> Self {
        let mut bits = 0u128;
        for position in 0..SERIALIZATION_BITS {
            if bytes[position / 8] & (1 << (7 - position % 8)) != 0 {
                bits |= 1u128 << (SERIALIZATION_BITS - 1 - position);
            }
        }
        GameSerialization(bits)
    }
}

impl fmt::Display for GameSerialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base64())
    }
}

impl fmt::Debug for GameSerialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base64())
    }
}

/// Appends fields low bit first.
pub struct BitWriter {
    bits: u128,
    cursor: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        BitWriter { bits: 0, cursor: 0 }
    }

    pub fn push(&mut self, value: u128, width: usize) {
        debug_assert!(value < (1u128 << width));
        self.bits |= value << self.cursor;
        self.cursor += width;
        debug_assert!(self.cursor <= SERIALIZATION_BITS);
    }

    pub fn finish(self) -> GameSerialization {
        GameSerialization(self.bits)
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        BitWriter::new()
    }
}

pub(crate) type CodeList = SmallVec<[usize; MAX_DIMENSION]>;

/// The coordinate codes of one player's serialization slots: a sentinel for
/// a captured master, one code per pawn (master first), sentinel padding up
/// to the board width.
pub(crate) fn pawn_codes(board: &Board, color: Color) -> CodeList {
    let (width, _) = board.dimensions();
    let mut codes = CodeList::new();

    if board.master_captured(color) {
        codes.push(CAPTURED_CODE);
    }
    for coordinate in board.pawn_coordinates(color) {
        codes.push(coordinate.x + coordinate.y * width);
    }
    while codes.len() < width {
        codes.push(CAPTURED_CODE);
    }

    codes
}

/// Packs the fields of a state. Shared by `Game::serialize` and the
/// symmetry key, which feeds it the turn-reflected fields.
pub(crate) fn pack_state(
    top_to_move: bool,
    cards: &[Card; CARD_COUNT],
    width: usize,
    height: usize,
    top_codes: &[usize],
    bottom_codes: &[usize],
) -> GameSerialization {
    let mut writer = BitWriter::new();

    writer.push(top_to_move as u128, 1);
    for card in cards {
        writer.push(card.index() as u128, CARD_BITS);
    }
    writer.push(width as u128, DIMENSION_BITS);
    writer.push(height as u128, DIMENSION_BITS);

    for code in top_codes.iter().chain(bottom_codes) {
        writer.push(*code as u128, COORDINATE_BITS);
    }

    writer.finish()
}

/// Consumes fields low bit first.
pub struct BitReader {
    bits: u128,
}

impl BitReader {
    pub fn new(serialization: GameSerialization) -> Self {
        BitReader {
            bits: serialization.bits(),
        }
    }

    pub fn read(&mut self, width: usize) -> u128 {
        let value = self.bits & ((1u128 << width) - 1);
        self.bits >>= width;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_holds_the_largest_board() {
        assert_eq!(SERIALIZATION_BITS, 111);
        assert_eq!(SERIALIZATION_BYTES, 14);
        assert_eq!(CAPTURED_CODE, 49);
    }

    #[test]
    fn writer_and_reader_agree() {
        let mut writer = BitWriter::new();
        writer.push(1, 1);
        writer.push(12, CARD_BITS);
        writer.push(5, DIMENSION_BITS);
        writer.push(CAPTURED_CODE as u128, COORDINATE_BITS);
        let serialization = writer.finish();

        let mut reader = BitReader::new(serialization);
        assert_eq!(reader.read(1), 1);
        assert_eq!(reader.read(CARD_BITS), 12);
        assert_eq!(reader.read(DIMENSION_BITS), 5);
        assert_eq!(reader.read(COORDINATE_BITS), CAPTURED_CODE as u128);
    }

    #[test]
    fn byte_form_round_trips() {
        for bits in [0u128, 1, 0b1010 << 100, BITS_MASK, 0x0123_4567_89AB_CDEF] {
            let serialization = GameSerialization::from_bits(bits);
            let bytes = serialization.to_bytes();
            assert_eq!(GameSerialization::from_bytes(&bytes), serialization);
        }
    }

    #[test]
    fn byte_form_is_msb_first_from_the_top_bit() {
        let top_bit = GameSerialization::from_bits(1 << (SERIALIZATION_BITS - 1));
        let bytes = top_bit.to_bytes();
        assert_eq!(bytes[0], 0b1000_0000);
        assert!(bytes[1..].iter().all(|byte| *byte == 0));

        let low_bit = GameSerialization::from_bits(1);
        let bytes = low_bit.to_bytes();
        // Bit 0 sits at stream position 110: byte 13, bit 6 from the top.
        assert_eq!(bytes[13], 0b0000_0010);
    }

    #[test]
    fn base64_form_round_trips() {
        let serialization = GameSerialization::from_bits(0x1234_5678_9ABC);
        let text = serialization.to_base64();
        assert_eq!(GameSerialization::from_base64(&text).unwrap(), serialization);
    }
}
