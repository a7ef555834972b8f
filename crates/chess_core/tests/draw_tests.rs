//! Tests for game-end detection
//!
//! This module tests every way a game can end:
//! - Checkmate
//! - Stalemate
//! - Insufficient material
//! - Fivefold repetition
//! - Seventy-five-move rule

use chess_core::{parse_uci_move, Color, Game, Termination};

fn game(fen: &str) -> Game {
    Game::from_fen(fen).expect("test FEN should parse")
}

fn play_all(game: &mut Game, moves: &[&str]) {
    for txt in moves {
        let mv = parse_uci_move(game.board(), txt)
            .unwrap_or_else(|| panic!("{txt} should be legal"));
        game.play(mv).unwrap();
    }
}

// =============================================================================
// Checkmate Tests
// =============================================================================

#[test]
fn test_fools_mate() {
    let mut g = Game::new();
    play_all(&mut g, &["f2f3", "e7e5", "g2g4", "d8h4"]);

    let outcome = g.outcome().expect("fool's mate ends the game");
    assert_eq!(outcome.termination, Termination::Checkmate);
    assert_eq!(outcome.winner, Some(Color::Black));
}

#[test]
fn test_checkmate_is_not_stalemate() {
    // Scholar's mate final position
    let g = game("r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4");

    let outcome = g.outcome().unwrap();
    assert_eq!(outcome.termination, Termination::Checkmate);
    assert_eq!(outcome.winner, Some(Color::White));
}

#[test]
fn test_check_is_not_checkmate() {
    let g = game("rnbqkbnr/ppppp1pp/8/5p1Q/4P3/8/PPPP1PPP/RNB1KBNR b KQkq - 1 2");

    assert!(g.in_check());
    assert!(g.outcome().is_none(), "Black can block or move out of check");
}

// =============================================================================
// Stalemate Tests
// =============================================================================

#[test]
fn test_stalemate_king_in_corner() {
    let g = game("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1");

    assert!(g.legal_moves().is_empty());
    assert!(!g.in_check(), "Stalemate means king is not in check");
    let outcome = g.outcome().unwrap();
    assert_eq!(outcome.termination, Termination::Stalemate);
    assert_eq!(outcome.winner, None);
}

#[test]
fn test_stalemate_king_and_pawn_endgame() {
    let g = game("6k1/6P1/6K1/8/8/8/8/8 b - - 0 1");

    let outcome = g.outcome().unwrap();
    assert_eq!(outcome.termination, Termination::Stalemate);
}

// =============================================================================
// Insufficient Material Tests
// =============================================================================

fn assert_insufficient(fen: &str) {
    let outcome = game(fen).outcome();
    assert_eq!(
        outcome.map(|o| o.termination),
        Some(Termination::InsufficientMaterial),
        "{fen} should be a dead draw"
    );
}

fn assert_playable(fen: &str) {
    assert!(game(fen).outcome().is_none(), "{fen} should still be playable");
}

#[test]
fn test_insufficient_material_king_vs_king() {
    assert_insufficient("8/8/8/4k3/8/4K3/8/8 w - - 0 1");
}

#[test]
fn test_insufficient_material_single_minor() {
    assert_insufficient("8/8/8/4k3/8/4KB2/8/8 w - - 0 1");
    assert_insufficient("8/8/8/4k3/8/4KN2/8/8 w - - 0 1");
    assert_insufficient("8/8/4b3/4k3/8/4K3/8/8 w - - 0 1");
    assert_insufficient("8/8/4n3/4k3/8/4K3/8/8 w - - 0 1");
}

#[test]
fn test_insufficient_material_same_color_bishops() {
    // f8 and c1 are both dark squares
    assert_insufficient("5b2/8/8/4k3/8/4K3/8/2B5 w - - 0 1");
}

#[test]
fn test_dead_position_without_moves_is_insufficient_material() {
    // Black has no legal move, but a lone bishop can never mate either
    let g = game("k7/8/1K6/4B3/8/8/8/8 b - - 0 1");

    assert!(g.legal_moves().is_empty());
    assert!(!g.in_check());
    let outcome = g.outcome().unwrap();
    assert_eq!(outcome.termination, Termination::InsufficientMaterial);
    assert_eq!(outcome.winner, None);
}

#[test]
fn test_sufficient_material() {
    // Opposite-coloured bishops
    assert_playable("2b5/8/8/4k3/8/4K3/8/2B5 w - - 0 1");
    assert_playable("8/8/8/4k3/8/4K3/4P3/8 w - - 0 1");
    assert_playable("8/8/8/4k3/8/4K3/8/4R3 w - - 0 1");
    assert_playable("8/8/8/4k3/8/4K3/8/4Q3 w - - 0 1");
    assert_playable("8/8/8/4k3/8/4K3/3NN3/8 w - - 0 1");
}

// =============================================================================
// Repetition Tests
// =============================================================================

#[test]
fn test_fivefold_repetition() {
    let mut g = Game::new();
    let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];

    for _ in 0..3 {
        play_all(&mut g, &shuffle);
    }
    // Start position seen 4 times
    assert_eq!(g.repetition_count(), 4);
    assert!(g.outcome().is_none(), "fourfold repetition does not end the game");

    play_all(&mut g, &shuffle);
    assert_eq!(g.repetition_count(), 5);
    let outcome = g.outcome().unwrap();
    assert_eq!(outcome.termination, Termination::FivefoldRepetition);
    assert_eq!(outcome.winner, None);
}

#[test]
fn test_repetition_ignores_unusable_en_passant_square() {
    let mut g = Game::new();
    play_all(&mut g, &["e2e4", "g8f6", "g1f3", "f6g8", "f3g1"]);

    // Same position as after 1. e4, when no en passant capture was possible
    assert_eq!(g.repetition_count(), 2);
}

#[test]
fn test_fifty_move_rule_does_not_end_game() {
    // Only claimable at 100 half-moves; the game goes on until 150
    let g = game("8/8/8/4k3/8/4K3/8/R7 w - - 100 60");

    assert_eq!(g.halfmove_clock(), 100);
    assert!(g.outcome().is_none());
}

#[test]
fn test_played_game_rejects_moves() {
    let mut g = game("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1");
    let mv = Game::new().legal_moves()[0];

    assert!(g.play(mv).is_err());
}
