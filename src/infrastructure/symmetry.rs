//! Turn-reflection symmetry. A state and its reflection (players swapped,
//! board rotated 180 degrees, side to move flipped) describe the same
//! position from the two seats; the graph collapses them into one
//! canonical key.

use crate::domain::board::Board;
use crate::domain::card::Card;
use crate::domain::game::{CARD_COUNT, Game, HAND_SIZE, hands_equal};
use crate::domain::models::{Color, Piece, TOP_PLAYER};
use crate::infrastructure::serialization::{self, CAPTURED_CODE, CodeList};

/// The turn-reflected counterpart of a state.
pub fn flip(game: &Game) -> Game {
    let (width, height) = game.dimensions();

    let mut grid = vec![None; width * height];
    for (id, tile) in game.board().grid().iter().enumerate() {
        if let Some(piece) = tile {
            grid[width * height - 1 - id] = Some(Piece {
                color: !piece.color,
                master: piece.master,
            });
        }
    }

    Game::from_parts(
        Board::from_grid(grid, width, height),
        swap_hands(game.cards()),
        !game.current_player(),
    )
}

/// The map key: both members of an equivalence class produce the same bits.
///
/// Hands are sorted by card index (hand order is insignificant) and, with
/// symmetries enabled, the smaller of the state's and its reflection's
/// serializations is taken. With symmetries disabled the key degrades to
/// raw state identity.
pub fn canonical_bits(game: &Game, use_symmetries: bool) -> u128 {
    let (width, height) = game.dimensions();
    let cards = sorted_hands(game.cards());

    let direct = serialization::pack_state(
        game.current_player().is_top(),
        &cards,
        width,
        height,
        &serialization::pawn_codes(game.board(), TOP_PLAYER),
        &serialization::pawn_codes(game.board(), !TOP_PLAYER),
    );

    if !use_symmetries {
        return direct.bits();
    }

    let reflected = serialization::pack_state(
        !game.current_player().is_top(),
        &swap_hands(&cards),
        width,
        height,
        &reflected_codes(game.board(), !TOP_PLAYER),
        &reflected_codes(game.board(), TOP_PLAYER),
    );

    direct.bits().min(reflected.bits())
}

/// Whether two states are the same position up to turn reflection: same
/// set-aside card and dimensions, and for each player-role (side to move,
/// opponent) equal hand multisets and matching pawn lists, rotated when the
/// role sits on the other side of the board.
pub fn equivalent(first: &Game, second: &Game) -> bool {
    if first.set_aside_card() != second.set_aside_card() {
        return false;
    }
    if first.dimensions() != second.dimensions() {
        return false;
    }

    for role in 0..2 {
        let first_color = role_color(first, role);
        let second_color = role_color(second, role);

        if !hands_equal(first.hand(first_color), second.hand(second_color)) {
            return false;
        }

        if !compare_coordinates(first, first_color, second, second_color) {
            return false;
        }
    }

    true
}

fn role_color(game: &Game, role: usize) -> Color {
    if role == 0 {
        game.current_player()
    } else {
        !game.current_player()
    }
}

fn compare_coordinates(
    first: &Game,
    first_color: Color,
    second: &Game,
    second_color: Color,
) -> bool {
    if first.board().master_captured(first_color) != second.board().master_captured(second_color) {
        return false;
    }

    let first_pawns = first.board().pawn_coordinates(first_color);
    let second_pawns = second.board().pawn_coordinates(second_color);

    if first_pawns.len() != second_pawns.len() {
        return false;
    }
    if first_pawns.is_empty() {
        return true;
    }

    if first_color == second_color {
        return first_pawns == second_pawns;
    }

    // Opposite seats: rotate the second player's pawns onto the first's
    // orientation. Masters align directly; rotation reverses row-major
    // order, so students match back to front.
    let (width, height) = second.dimensions();
    let master_present = !first.board().master_captured(first_color);

    if master_present && first_pawns[0] != second_pawns[0].rotated(width, height) {
        return false;
    }

    let students = master_present as usize;
    first_pawns[students..]
        .iter()
        .zip(second_pawns[students..].iter().rev())
        .all(|(first, second)| *first == second.rotated(width, height))
}

fn sorted_hands(cards: &[Card; CARD_COUNT]) -> [Card; CARD_COUNT] {
    let mut sorted = *cards;
    sorted[1..1 + HAND_SIZE].sort();
    sorted[1 + HAND_SIZE..CARD_COUNT].sort();
    sorted
}

fn swap_hands(cards: &[Card; CARD_COUNT]) -> [Card; CARD_COUNT] {
    [cards[0], cards[3], cards[4], cards[1], cards[2]]
}

/// Slot codes of a player as seen from the opposite seat: each code `c`
/// becomes `width * height - 1 - c`, students reversed by the rotation.
fn reflected_codes(board: &Board, color: Color) -> CodeList {
    let (width, height) = board.dimensions();
    let end = width * height - 1;
    let mut codes = CodeList::new();

    let pawns = board.pawn_coordinates(color);
    let students = if board.master_captured(color) {
        codes.push(CAPTURED_CODE);
        0
    } else {
        codes.push(end - (pawns[0].x + pawns[0].y * width));
        1
    };

    for student in pawns[students..].iter().rev() {
        codes.push(end - (student.x + student.y * width));
    }
    while codes.len() < width {
        codes.push(CAPTURED_CODE);
    }

    codes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Move;

    fn asymmetric_game() -> Game {
        let mut game = Game::with_cards(
            5,
            5,
            [Card::Ox, Card::Crab, Card::Crane, Card::Eel, Card::Frog],
        );
        let mv = game.valid_moves()[0];
        game.do_move(mv).unwrap();
        game
    }

    #[test]
    fn flip_is_an_involution() {
        let game = asymmetric_game();
        assert_eq!(flip(&flip(&game)), game);
    }

    #[test]
    fn a_state_is_equivalent_to_its_reflection() {
        let game = asymmetric_game();
        let reflected = flip(&game);

        assert!(equivalent(&game, &reflected));
        assert!(equivalent(&reflected, &game));
        assert_eq!(canonical_bits(&game, true), canonical_bits(&reflected, true));
    }

    #[test]
    fn raw_keys_distinguish_the_reflection() {
        let game = asymmetric_game();
        let reflected = flip(&game);

        assert_ne!(game, reflected);
        assert_ne!(
            canonical_bits(&game, false),
            canonical_bits(&reflected, false)
        );
    }

    #[test]
    fn hand_order_does_not_change_the_key() {
        let game = Game::with_cards(
            5,
            5,
            [Card::Ox, Card::Crab, Card::Crane, Card::Eel, Card::Frog],
        );
        let permuted = Game::with_cards(
            5,
            5,
            [Card::Ox, Card::Crane, Card::Crab, Card::Frog, Card::Eel],
        );

        assert!(equivalent(&game, &permuted));
        assert_eq!(canonical_bits(&game, true), canonical_bits(&permuted, true));
        assert_eq!(
            canonical_bits(&game, false),
            canonical_bits(&permuted, false)
        );
    }

    #[test]
    fn different_set_aside_cards_are_inequivalent() {
        let game = Game::with_cards(
            5,
            5,
            [Card::Ox, Card::Crab, Card::Crane, Card::Eel, Card::Frog],
        );
        let other = Game::with_cards(
            5,
            5,
            [Card::Tiger, Card::Crab, Card::Crane, Card::Eel, Card::Frog],
        );

        assert!(!equivalent(&game, &other));
        assert_ne!(canonical_bits(&game, true), canonical_bits(&other, true));
    }

    #[test]
    fn equivalence_survives_play() {
        // Playing mirrored moves from a self-symmetric root keeps the two
        // lines equivalent state by state.
        let root = Game::with_cards(2, 3, [Card::Boar; CARD_COUNT]);
        assert!(equivalent(&root, &flip(&root)));

        let mv = Move {
            pawn_id: 0,
            card: Card::Boar,
            offset_id: 1,
        };
        let after = root.successor(mv).unwrap();
        assert!(equivalent(&after, &flip(&after)));
    }
}
