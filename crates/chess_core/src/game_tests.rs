use super::*;
use crate::uci::parse_uci_move;
use cozy_chess::Square;

fn play(game: &mut Game, txt: &str) {
    let mv = parse_uci_move(game.board(), txt).unwrap();
    game.play(mv).unwrap();
}

#[test]
fn test_new_game_is_not_over() {
    let game = Game::new();

    assert_eq!(game.legal_moves().len(), 20);
    assert_eq!(game.ply_count(), 0);
    assert_eq!(game.repetition_count(), 1);
    assert!(game.outcome().is_none());
}

#[test]
fn test_illegal_move_is_rejected() {
    let mut game = Game::new();
    let mv = Move {
        from: Square::E2,
        to: Square::E5,
        promotion: None,
    };

    assert!(matches!(game.play(mv), Err(GameError::IllegalMove(_))));
    assert_eq!(game.ply_count(), 0);
}

#[test]
fn test_invalid_fen_is_rejected() {
    assert!(matches!(
        Game::from_fen("not a position"),
        Err(GameError::InvalidFen(_))
    ));
}

#[test]
fn test_halfmove_clock_resets_on_pawn_move_and_capture() {
    let mut game = Game::new();
    play(&mut game, "g1f3");
    play(&mut game, "b8c6");
    assert_eq!(game.halfmove_clock(), 2);

    play(&mut game, "e2e4");
    assert_eq!(game.halfmove_clock(), 0);

    play(&mut game, "g8f6");
    play(&mut game, "f3e5");
    play(&mut game, "c6e5");
    assert_eq!(game.halfmove_clock(), 0, "capture resets the clock");
}

#[test]
fn test_seventy_five_move_rule() {
    let mut game = Game::from_fen("8/8/8/4k3/8/4K3/8/R7 w - - 0 1").unwrap();
    game.halfmove_clock = SEVENTY_FIVE_MOVE_PLIES - 1;
    assert!(game.outcome().is_none());

    play(&mut game, "a1a2");

    let outcome = game.outcome().unwrap();
    assert_eq!(outcome.termination, Termination::SeventyFiveMoves);
    assert_eq!(outcome.winner, None);
}

#[test]
fn test_uci_history_tracks_castling_as_king_step() {
    let mut game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    play(&mut game, "e1g1");
    play(&mut game, "e8c8");

    assert_eq!(game.uci_moves(), ["e1g1", "e8c8"]);
}

#[test]
fn test_termination_round_trips_through_text() {
    for t in Termination::ALL {
        assert_eq!(t.as_str().parse::<Termination>(), Ok(t));
    }
    assert!("resignation".parse::<Termination>().is_err());
}

#[test]
fn test_repetition_key_keeps_capturable_en_passant() {
    let with_ep: Board = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1".parse().unwrap();
    let without_ep: Board = "4k3/8/8/3pP3/8/8/8/4K3 w - - 0 1".parse().unwrap();

    assert_ne!(repetition_key(&with_ep), repetition_key(&without_ep));
}

#[test]
fn test_repetition_key_drops_uncapturable_en_passant() {
    let after_push: Board = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        .parse()
        .unwrap();
    let plain: Board = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        .parse()
        .unwrap();

    assert_eq!(repetition_key(&after_push), repetition_key(&plain));
}
