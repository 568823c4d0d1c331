use crate::domain::models::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;

/// A square on the grid. (0, 0) is the top-left corner of the top player's
/// home row.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: usize,
    pub y: usize,
}

impl Coordinate {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Applies an offset, failing on underflow past either axis. The upper
    /// board bound is the board's to check.
    pub fn try_add(self, offset: Offset) -> Option<Coordinate> {
        let x = self.x.checked_add_signed(offset.dx as isize)?;
        let y = self.y.checked_add_signed(offset.dy as isize)?;
        Some(Coordinate { x, y })
    }

    /// The 180-degree rotation of this square on a `width` x `height` board.
    pub fn rotated(self, width: usize, height: usize) -> Coordinate {
        Coordinate {
            x: width - self.x - 1,
            y: height - self.y - 1,
        }
    }
}

impl fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A displacement from a card's offset list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offset {
    pub dx: i8,
    pub dy: i8,
}

impl Offset {
    pub const fn new(dx: i8, dy: i8) -> Self {
        Self { dx, dy }
    }

    /// Card offsets are listed as the bottom player plays them; the top
    /// player sees the board rotated 180 degrees and negates both
    /// components.
    pub fn orient(self, player: Color) -> Offset {
        if player.is_top() { -self } else { self }
    }
}

impl Neg for Offset {
    type Output = Offset;

    fn neg(self) -> Offset {
        Offset {
            dx: -self.dx,
            dy: -self.dy,
        }
    }
}
