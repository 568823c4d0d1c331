use crate::domain::coordinate::Offset;
use crate::domain::models::Color;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of distinct movement cards.
pub const CARD_TYPE_COUNT: usize = 16;

/// The sixteen movement cards. The declaration order is the wire format:
/// serialization, CSV export and snapshots all refer to cards by this index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Card {
    Boar,
    Cobra,
    Crab,
    Crane,
    Dragon,
    Eel,
    Elephant,
    Frog,
    Goose,
    Horse,
    Mantis,
    Monkey,
    Ox,
    Rabbit,
    Rooster,
    Tiger,
}

impl Card {
    pub const ALL: [Card; CARD_TYPE_COUNT] = [
        Card::Boar,
        Card::Cobra,
        Card::Crab,
        Card::Crane,
        Card::Dragon,
        Card::Eel,
        Card::Elephant,
        Card::Frog,
        Card::Goose,
        Card::Horse,
        Card::Mantis,
        Card::Monkey,
        Card::Ox,
        Card::Rabbit,
        Card::Rooster,
        Card::Tiger,
    ];

    /// Offsets as printed on the card; the offset order is part of a move's
    /// identity.
    pub fn offsets(self) -> &'static [Offset] {
        const BOAR: [Offset; 3] = [Offset::new(-1, 0), Offset::new(0, -1), Offset::new(1, 0)];
        const COBRA: [Offset; 3] = [Offset::new(-1, 0), Offset::new(1, -1), Offset::new(1, 1)];
        const CRAB: [Offset; 3] = [Offset::new(-2, 0), Offset::new(0, -1), Offset::new(2, 0)];
        const CRANE: [Offset; 3] = [Offset::new(-1, 1), Offset::new(0, -1), Offset::new(1, 1)];
        const DRAGON: [Offset; 4] = [
            Offset::new(-2, -1),
            Offset::new(-1, 1),
            Offset::new(1, 1),
            Offset::new(2, -1),
        ];
        const EEL: [Offset; 3] = [Offset::new(-1, -1), Offset::new(-1, 1), Offset::new(1, 0)];
        const ELEPHANT: [Offset; 4] = [
            Offset::new(-1, -1),
            Offset::new(-1, 0),
            Offset::new(1, -1),
            Offset::new(1, 0),
        ];
        const FROG: [Offset; 3] = [Offset::new(-2, 0), Offset::new(-1, -1), Offset::new(1, 1)];
        const GOOSE: [Offset; 4] = [
            Offset::new(-1, -1),
            Offset::new(-1, 0),
            Offset::new(1, 0),
            Offset::new(1, 1),
        ];
        const HORSE: [Offset; 3] = [Offset::new(-1, 0), Offset::new(0, -1), Offset::new(0, 1)];
        const MANTIS: [Offset; 3] = [Offset::new(-1, -1), Offset::new(0, 1), Offset::new(1, -1)];
        const MONKEY: [Offset; 4] = [
            Offset::new(-1, -1),
            Offset::new(-1, 1),
            Offset::new(1, -1),
            Offset::new(1, 1),
        ];
        const OX: [Offset; 3] = [Offset::new(0, -1), Offset::new(0, 1), Offset::new(1, 0)];
        const RABBIT: [Offset; 3] = [Offset::new(-1, 1), Offset::new(1, -1), Offset::new(2, 0)];
        const ROOSTER: [Offset; 4] = [
            Offset::new(-1, 0),
            Offset::new(-1, 1),
            Offset::new(1, 0),
            Offset::new(1, -1),
        ];
        const TIGER: [Offset; 2] = [Offset::new(0, -2), Offset::new(0, 1)];

        match self {
            Card::Boar => &BOAR,
            Card::Cobra => &COBRA,
            Card::Crab => &CRAB,
            Card::Crane => &CRANE,
            Card::Dragon => &DRAGON,
            Card::Eel => &EEL,
            Card::Elephant => &ELEPHANT,
            Card::Frog => &FROG,
            Card::Goose => &GOOSE,
            Card::Horse => &HORSE,
            Card::Mantis => &MANTIS,
            Card::Monkey => &MONKEY,
            Card::Ox => &OX,
            Card::Rabbit => &RABBIT,
            Card::Rooster => &ROOSTER,
            Card::Tiger => &TIGER,
        }
    }

    /// The owner color: whoever owns the set-aside card moves first.
    pub fn color(self) -> Color {
        match self {
            Card::Boar
            | Card::Cobra
            | Card::Dragon
            | Card::Elephant
            | Card::Frog
            | Card::Horse
            | Card::Mantis
            | Card::Rooster => Color::Red,

            Card::Crab
            | Card::Crane
            | Card::Eel
            | Card::Goose
            | Card::Monkey
            | Card::Ox
            | Card::Rabbit
            | Card::Tiger => Color::Blue,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Card> {
        Card::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Card::Boar => "Boar",
            Card::Cobra => "Cobra",
            Card::Crab => "Crab",
            Card::Crane => "Crane",
            Card::Dragon => "Dragon",
            Card::Eel => "Eel",
            Card::Elephant => "Elephant",
            Card::Frog => "Frog",
            Card::Goose => "Goose",
            Card::Horse => "Horse",
            Card::Mantis => "Mantis",
            Card::Monkey => "Monkey",
            Card::Ox => "Ox",
            Card::Rabbit => "Rabbit",
            Card::Rooster => "Rooster",
            Card::Tiger => "Tiger",
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
