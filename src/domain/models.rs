use crate::domain::card::Card;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Not;
use std::str::FromStr;

/// The top player sits at the home row y = 0.
pub const TOP_PLAYER: Color = Color::Red;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Blue,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Color::Red => Color::Blue,
            Color::Blue => Color::Red,
        }
    }

    pub fn is_top(self) -> bool {
        self == TOP_PLAYER
    }
}

impl Not for Color {
    type Output = Color;

    fn not(self) -> Color {
        self.opponent()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => write!(f, "Red"),
            Color::Blue => write!(f, "Blue"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub master: bool,
}

/// Game-theoretic value of a state for the side to move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quality {
    Win,
    Draw,
    Lose,
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Win => write!(f, "Win"),
            Quality::Draw => write!(f, "Draw"),
            Quality::Lose => write!(f, "Lose"),
        }
    }
}

impl FromStr for Quality {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Win" => Ok(Quality::Win),
            "Draw" => Ok(Quality::Draw),
            "Lose" => Ok(Quality::Lose),
            _ => Err(()),
        }
    }
}

/// A move spends one card from the hand on one of the mover's pawns.
///
/// `pawn_id` indexes the side-to-move's pawn list (master first when
/// present); `offset_id` indexes the card's offset list. When the player has
/// no legal board move the move degrades to a discard and both indices are
/// conventionally zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub pawn_id: usize,
    pub card: Card,
    pub offset_id: usize,
}
