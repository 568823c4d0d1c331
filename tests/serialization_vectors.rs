//! Literal encoding vectors and round-trip properties of the bit-packed
//! state form.

use onitama::domain::{CARD_COUNT, Card, Color, Coordinate, Game, Move};
use onitama::infrastructure::serialization::GameSerialization;

#[test]
fn known_state_decodes_and_re_encodes_identically() {
    let serialization = GameSerialization::from_base64("GJgowIVdB44").unwrap();
    let game = Game::from_serialization(serialization).unwrap();

    assert_eq!(game.dimensions(), (3, 5));
    assert_eq!(game.current_player(), Color::Blue);
    assert_eq!(game.set_aside_card(), Card::Ox);
    assert_eq!(game.hand(Color::Red), &[Card::Cobra, Card::Tiger]);
    assert_eq!(game.hand(Color::Blue), &[Card::Boar, Card::Mantis]);

    assert_eq!(
        game.board().pawn_coordinates(Color::Red),
        &[
            Coordinate::new(2, 0),
            Coordinate::new(1, 0),
            Coordinate::new(0, 2)
        ]
    );
    assert_eq!(
        game.board().pawn_coordinates(Color::Blue),
        &[Coordinate::new(2, 1), Coordinate::new(0, 4)]
    );

    assert_eq!(game.serialize(), serialization);
    assert_eq!(game.serialize().to_base64(), "GJgowIVdB44");
}

#[test]
fn master_capture_onto_the_temple_matches_the_vector() {
    let source = GameSerialization::from_base64("GJgowIVdB44").unwrap();
    let game = Game::from_serialization(source).unwrap();

    // Blue's master takes the (-1, -1) step of Mantis, capturing the red
    // student on (1, 0) and landing on Red's temple.
    let mv = Move {
        pawn_id: 0,
        card: Card::Mantis,
        offset_id: 0,
    };
    assert!(game.is_valid_move(&mv));

    let next = game.successor(mv).unwrap();
    assert_eq!(next.serialize().to_base64(), "GJgOIwVeB41");
    assert_eq!(next.is_finished(), Some(Color::Blue));
}

#[test]
fn initial_states_round_trip_through_the_bit_form() {
    let games = [
        Game::with_cards(2, 2, [Card::Boar; CARD_COUNT]),
        Game::with_cards(5, 5, [Card::Ox, Card::Crab, Card::Crane, Card::Eel, Card::Frog]),
        Game::with_cards(1, 7, [Card::Tiger, Card::Tiger, Card::Crab, Card::Boar, Card::Boar]),
        Game::with_cards(7, 2, [Card::Dragon, Card::Monkey, Card::Rooster, Card::Horse, Card::Eel]),
    ];

    for game in games {
        let decoded = Game::from_serialization(game.serialize()).unwrap();
        assert_eq!(decoded, game);
        assert_eq!(decoded.serialize(), game.serialize());

        let text = game.serialize().to_base64();
        assert_eq!(GameSerialization::from_base64(&text).unwrap(), game.serialize());
    }
}

#[test]
fn played_lines_round_trip_including_captures() {
    let mut game = Game::with_cards(
        4,
        4,
        [Card::Rabbit, Card::Goose, Card::Boar, Card::Crab, Card::Horse],
    );

    for _ in 0..20 {
        if game.is_finished().is_some() {
            break;
        }

        let mv = *game
            .valid_moves()
            .last()
            .expect("unfinished states always offer a move");
        game.do_move(mv).unwrap();

        let decoded = Game::from_serialization(game.serialize()).unwrap();
        assert_eq!(decoded, game);
    }
}

#[test]
fn foreign_bit_strings_are_rejected() {
    // Width zero.
    assert!(Game::from_serialization(GameSerialization::from_bits(0)).is_err());

    // A coordinate code beyond the 2x2 board: set width = 2, height = 2,
    // first slot code 5.
    let mut bits: u128 = 0;
    bits |= 2 << 21; // width
    bits |= 2 << 24; // height
    bits |= 5 << 27; // top master slot
    assert!(Game::from_serialization(GameSerialization::from_bits(bits)).is_err());
}
