use crate::domain::board::{Board, Tile};
use crate::domain::card::{CARD_TYPE_COUNT, Card};
use crate::domain::models::{Color, Move, Piece, TOP_PLAYER};
use crate::error::Error;
use crate::infrastructure::serialization::{
    self, BitReader, CAPTURED_CODE, CARD_BITS, COORDINATE_BITS, DIMENSION_BITS, GameSerialization,
};
use rand::Rng;
use smallvec::SmallVec;

/// Cards a player holds at any time.
pub const HAND_SIZE: usize = 2;
/// Hands plus the single set-aside card.
pub const CARD_COUNT: usize = 2 * HAND_SIZE + 1;

pub type MoveList = SmallVec<[Move; 16]>;

/// A full game state: board, card distribution and side to move, with the
/// valid-move list derived eagerly.
///
/// `cards[0]` is the set-aside card, `cards[1..3]` the top player's hand,
/// `cards[3..5]` the bottom player's hand.
#[derive(Clone, Debug)]
pub struct Game {
    board: Board,
    cards: [Card; CARD_COUNT],
    current_player: Color,
    valid_moves: MoveList,
    has_board_moves: bool,
}

impl Game {
    /// Starting position; the owner of the set-aside card moves first.
    pub fn with_cards(width: usize, height: usize, cards: [Card; CARD_COUNT]) -> Game {
        Game::from_parts(Board::new(width, height), cards, cards[0].color())
    }

    pub fn with_random_cards(width: usize, height: usize, allow_duplicates: bool) -> Game {
        let mut rng = rand::thread_rng();
        let mut cards = [Card::Boar; CARD_COUNT];

        for id in 0..CARD_COUNT {
            loop {
                let card = Card::ALL[rng.gen_range(0..CARD_TYPE_COUNT)];
                if allow_duplicates || !cards[..id].contains(&card) {
                    cards[id] = card;
                    break;
                }
            }
        }

        Game::with_cards(width, height, cards)
    }

    pub fn from_parts(board: Board, cards: [Card; CARD_COUNT], current_player: Color) -> Game {
        let mut game = Game {
            board,
            cards,
            current_player,
            valid_moves: MoveList::new(),
            has_board_moves: false,
        };
        game.recompute_valid_moves();
        game
    }

    /// Decodes the bit-packed form. Fails with `OutOfRange` when the bits
    /// do not describe a board within the dimension bounds.
    pub fn from_serialization(serialization: GameSerialization) -> Result<Game, Error> {
        let mut reader = BitReader::new(serialization);

        let current_player = if reader.read(1) == 1 {
            TOP_PLAYER
        } else {
            !TOP_PLAYER
        };

        let mut cards = [Card::Boar; CARD_COUNT];
        for card in &mut cards {
            // Four bits cannot exceed the 16 card indices.
            *card = Card::ALL[reader.read(CARD_BITS) as usize];
        }

        let width = reader.read(DIMENSION_BITS) as usize;
        let height = reader.read(DIMENSION_BITS) as usize;
        if width == 0 {
            return Err(Error::OutOfRange("board width 0".into()));
        }
        if height < 2 {
            return Err(Error::OutOfRange(format!("board height {height}")));
        }

        let mut grid: Vec<Tile> = vec![None; width * height];
        for slot in 0..width * 2 {
            let color = if slot < width { TOP_PLAYER } else { !TOP_PLAYER };
            let master = slot % width == 0;

            let code = reader.read(COORDINATE_BITS) as usize;
            if code == CAPTURED_CODE {
                continue;
            }
            if code >= width * height {
                return Err(Error::OutOfRange(format!(
                    "coordinate code {code} on a {width}x{height} board"
                )));
            }
            grid[code] = Some(Piece { color, master });
        }

        Ok(Game::from_parts(
            Board::from_grid(grid, width, height),
            cards,
            current_player,
        ))
    }

    /// The canonical bit-packed encoding. Total because the board bounds
    /// are enforced at construction.
    pub fn serialize(&self) -> GameSerialization {
        let (width, height) = self.board.dimensions();
        serialization::pack_state(
            self.current_player == TOP_PLAYER,
            &self.cards,
            width,
            height,
            &serialization::pawn_codes(&self.board, TOP_PLAYER),
            &serialization::pawn_codes(&self.board, !TOP_PLAYER),
        )
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn cards(&self) -> &[Card; CARD_COUNT] {
        &self.cards
    }

    pub fn set_aside_card(&self) -> Card {
        self.cards[0]
    }

    pub fn hand(&self, color: Color) -> &[Card] {
        if color.is_top() {
            &self.cards[1..1 + HAND_SIZE]
        } else {
            &self.cards[1 + HAND_SIZE..CARD_COUNT]
        }
    }

    pub fn current_player(&self) -> Color {
        self.current_player
    }

    pub fn dimensions(&self) -> (usize, usize) {
        self.board.dimensions()
    }

    pub fn is_finished(&self) -> Option<Color> {
        self.board.is_finished()
    }

    pub fn valid_moves(&self) -> &[Move] {
        &self.valid_moves
    }

    /// Whether any of the valid moves actually slides a piece; when false
    /// the move list consists of card discards.
    pub fn has_board_moves(&self) -> bool {
        self.has_board_moves
    }

    pub fn is_valid_move(&self, mv: &Move) -> bool {
        self.valid_moves.contains(mv)
    }

    /// Explains why a move is rejected, mirroring the validity checks in
    /// order. `None` for acceptable moves.
    pub fn invalid_move_reason(&self, mv: &Move) -> Option<String> {
        if self.is_valid_move(mv) {
            return None;
        }

        let pawns = self.board.pawn_coordinates(self.current_player);
        if mv.pawn_id >= pawns.len() {
            return Some("Pawn does not exist!".into());
        }

        let offsets = mv.card.offsets();
        if mv.offset_id >= offsets.len() {
            return Some("Invalid offset number!".into());
        }

        if !self.hand(self.current_player).contains(&mv.card) {
            return Some("Used card not in player's hand!".into());
        }

        let oriented = offsets[mv.offset_id].orient(self.current_player);
        let destination = pawns[mv.pawn_id]
            .try_add(oriented)
            .filter(|c| self.board.on_board(*c));
        let Some(destination) = destination else {
            return Some("Destination not on board!".into());
        };

        if let Some(Some(piece)) = self.board.tile(destination) {
            if piece.color == self.current_player {
                return Some("Cannot capture pawn of the same color!".into());
            }
        }

        None
    }

    /// Applies a move: the board change (unless the move list degraded to
    /// discards), the card swap with the set-aside, and the turn flip.
    pub fn do_move(&mut self, mv: Move) -> Result<(), Error> {
        if self.is_finished().is_some() {
            return Err(Error::InvalidMove("game is already over".into()));
        }

        if self.has_board_moves {
            if !self.is_valid_move(&mv) {
                let reason = self
                    .invalid_move_reason(&mv)
                    .unwrap_or_else(|| "Attempted to perform invalid move!".into());
                return Err(Error::InvalidMove(reason));
            }

            let source = self.board.pawn_coordinates(self.current_player)[mv.pawn_id];
            let offset = mv.card.offsets()[mv.offset_id].orient(self.current_player);
            self.board.do_move(source, offset);
        }

        let hand_start = if self.current_player.is_top() {
            1
        } else {
            1 + HAND_SIZE
        };
        let position = self.cards[hand_start..hand_start + HAND_SIZE]
            .iter()
            .position(|card| *card == mv.card)
            .ok_or_else(|| Error::InvalidMove("Used card not in player's hand!".into()))?;
        self.cards.swap(0, hand_start + position);

        self.current_player = !self.current_player;
        self.recompute_valid_moves();
        Ok(())
    }

    /// The state after a move, leaving this one untouched.
    pub fn successor(&self, mv: Move) -> Result<Game, Error> {
        let mut next = self.clone();
        next.do_move(mv)?;
        Ok(next)
    }

    fn recompute_valid_moves(&mut self) {
        self.valid_moves.clear();
        self.has_board_moves = false;

        if self.is_finished().is_some() {
            return;
        }

        let hand: [Card; HAND_SIZE] = self.hand(self.current_player).try_into().unwrap();
        let pawn_count = self.board.pawn_coordinates(self.current_player).len();

        for pawn_id in 0..pawn_count {
            for (position, card) in hand.iter().enumerate() {
                // A doubled-up card contributes its moves once.
                if hand[..position].contains(card) {
                    continue;
                }

                for offset_id in 0..card.offsets().len() {
                    let mv = Move {
                        pawn_id,
                        card: *card,
                        offset_id,
                    };
                    if self.check_candidate(&mv) {
                        self.valid_moves.push(mv);
                    }
                }
            }
        }

        self.has_board_moves = !self.valid_moves.is_empty();
        if !self.has_board_moves {
            // Stuck players still spend a card.
            for card in hand {
                self.valid_moves.push(Move {
                    pawn_id: 0,
                    card,
                    offset_id: 0,
                });
            }
        }
    }

    fn check_candidate(&self, mv: &Move) -> bool {
        let pawns = self.board.pawn_coordinates(self.current_player);
        if mv.pawn_id >= pawns.len() {
            return false;
        }

        let offsets = mv.card.offsets();
        if mv.offset_id >= offsets.len() {
            return false;
        }

        if !self.hand(self.current_player).contains(&mv.card) {
            return false;
        }

        let oriented = offsets[mv.offset_id].orient(self.current_player);
        let Some(destination) = pawns[mv.pawn_id].try_add(oriented) else {
            return false;
        };

        match self.board.tile(destination) {
            None => false,
            Some(None) => true,
            Some(Some(piece)) => piece.color != self.current_player,
        }
    }
}

/// Structural equality: board, set-aside identity and side to move; the
/// order of cards within a hand is insignificant.
impl PartialEq for Game {
    fn eq(&self, other: &Game) -> bool {
        if self.current_player != other.current_player
            || self.set_aside_card() != other.set_aside_card()
            || self.dimensions() != other.dimensions()
        {
            return false;
        }

        for color in [TOP_PLAYER, !TOP_PLAYER] {
            if self.board.master_captured(color) != other.board.master_captured(color) {
                return false;
            }
            if self.board.pawn_coordinates(color) != other.board.pawn_coordinates(color) {
                return false;
            }
            if !hands_equal(self.hand(color), other.hand(color)) {
                return false;
            }
        }

        true
    }
}

impl Eq for Game {}

pub(crate) fn hands_equal(first: &[Card], second: &[Card]) -> bool {
    (first[0] == second[0] && first[1] == second[1])
        || (first[0] == second[1] && first[1] == second[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_boar() -> [Card; CARD_COUNT] {
        [Card::Boar; CARD_COUNT]
    }

    #[test]
    fn set_aside_owner_opens_the_game() {
        let game = Game::with_cards(
            3,
            4,
            [Card::Crab, Card::Mantis, Card::Cobra, Card::Rooster, Card::Cobra],
        );
        assert_eq!(game.current_player(), Color::Blue);

        let game = Game::with_cards(
            3,
            4,
            [Card::Horse, Card::Mantis, Card::Cobra, Card::Rooster, Card::Cobra],
        );
        assert_eq!(game.current_player(), Color::Red);
    }

    #[test]
    fn random_cards_respect_the_duplicate_flag() {
        let game = Game::with_random_cards(4, 5, false);
        let cards = game.cards();
        for (id, card) in cards.iter().enumerate() {
            assert!(!cards[id + 1..].contains(card), "duplicate {card}");
        }
        assert_eq!(game.current_player(), game.set_aside_card().color());
    }

    #[test]
    fn move_generation_skips_doubled_cards_once() {
        // Both hands hold two Boars: each pawn contributes each offset at
        // most once per distinct card.
        let game = Game::with_cards(5, 5, all_boar());
        let moves = game.valid_moves();
        assert!(game.has_board_moves());

        for mv in moves {
            assert_eq!(moves.iter().filter(|other| *other == mv).count(), 1);
        }
    }

    #[test]
    fn micro_board_red_can_take_the_blue_master() {
        let game = Game::with_cards(2, 2, all_boar());
        assert_eq!(game.current_player(), Color::Red);

        // Red student on (1, 0) reaches the blue master on (1, 1) with the
        // oriented (0, 1) step of Boar.
        let capture = Move {
            pawn_id: 1,
            card: Card::Boar,
            offset_id: 1,
        };
        assert!(game.is_valid_move(&capture));

        let mut next = game.successor(capture).unwrap();
        assert_eq!(next.is_finished(), Some(Color::Red));
        assert!(next.valid_moves().is_empty());
        assert!(next.do_move(capture).is_err());
    }

    #[test]
    fn do_move_preserves_the_card_multiset() {
        let cards = [Card::Ox, Card::Crab, Card::Crane, Card::Eel, Card::Frog];
        let game = Game::with_cards(5, 5, cards);
        let mv = game.valid_moves()[0];
        let next = game.successor(mv).unwrap();

        let mut before: Vec<Card> = cards.to_vec();
        let mut after: Vec<Card> = next.cards().to_vec();
        before.sort();
        after.sort();
        assert_eq!(before, after);

        assert_eq!(next.set_aside_card(), mv.card);
        assert_eq!(next.current_player(), !game.current_player());
    }

    #[test]
    fn do_move_rejects_foreign_cards() {
        let mut game = Game::with_cards(
            5,
            5,
            [Card::Ox, Card::Crab, Card::Crane, Card::Eel, Card::Frog],
        );
        let mv = Move {
            pawn_id: 0,
            card: Card::Tiger,
            offset_id: 0,
        };
        assert!(!game.is_valid_move(&mv));
        assert_eq!(
            game.invalid_move_reason(&mv).as_deref(),
            Some("Used card not in player's hand!")
        );
        assert!(matches!(game.do_move(mv), Err(Error::InvalidMove(_))));
    }

    #[test]
    fn moves_leave_the_board_consistent() {
        let mut game = Game::with_cards(
            5,
            5,
            [Card::Ox, Card::Crab, Card::Crane, Card::Eel, Card::Frog],
        );

        for _ in 0..12 {
            if game.is_finished().is_some() {
                break;
            }
            let mv = game.valid_moves()[0];
            game.do_move(mv).unwrap();

            for color in [Color::Red, Color::Blue] {
                let pawns = game.board().pawn_coordinates(color);
                assert!(pawns.len() <= game.dimensions().0);
                assert_eq!(
                    game.board().master_captured(color),
                    !pawns
                        .first()
                        .is_some_and(|c| game.board().tile(*c).unwrap().unwrap().master)
                );
                for pawn in pawns {
                    let piece = game.board().tile(*pawn).unwrap().unwrap();
                    assert_eq!(piece.color, color);
                }
            }
        }
    }

    #[test]
    fn equality_ignores_hand_order() {
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
        let different = Game::with_cards(
            5,
            5,
            [Card::Ox, Card::Crab, Card::Eel, Card::Crane, Card::Frog],
        );

        assert_eq!(game, permuted);
        assert_ne!(game, different);
    }

    #[test]
    fn stuck_player_discards_a_card() {
        // A lone red master in the corner with Tiger/Tiger cannot move on a
        // 2x2 board: (0, -2) underflows oriented or not, (0, 1) runs off or
        // is blocked.
        let grid = vec![
            Some(Piece { color: Color::Red, master: true }),
            None,
            Some(Piece { color: Color::Red, master: false }),
            Some(Piece { color: Color::Blue, master: true }),
        ];
        let board = Board::from_grid(grid, 2, 2);
        let game = Game::from_parts(
            board,
            [Card::Boar, Card::Tiger, Card::Tiger, Card::Ox, Card::Ox],
            Color::Red,
        );

        assert!(!game.has_board_moves());
        assert_eq!(game.valid_moves().len(), HAND_SIZE);
        for mv in game.valid_moves() {
            assert_eq!(mv.card, Card::Tiger);
        }

        let next = game.successor(game.valid_moves()[0]).unwrap();
        assert_eq!(next.set_aside_card(), Card::Tiger);
        assert_eq!(next.current_player(), Color::Blue);
        assert_eq!(
            next.board().pawn_coordinates(Color::Red),
            game.board().pawn_coordinates(Color::Red)
        );
    }
}
