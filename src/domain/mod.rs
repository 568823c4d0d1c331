pub mod board;
pub mod card;
pub mod coordinate;
pub mod game;
pub mod models;

pub use board::{Board, Tile};
pub use card::Card;
pub use coordinate::{Coordinate, Offset};
pub use game::{CARD_COUNT, Game, HAND_SIZE, MoveList};
pub use models::{Color, Move, Piece, Quality};
