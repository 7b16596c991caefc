//! Positions fed to the session: a starting FEN plus moves played on it.

use cozy_chess::{Board, File, Move, Rank, Square};

#[derive(Debug, thiserror::Error)]
pub enum PositionError {
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),
    #[error("Invalid move: {0}")]
    InvalidMove(String),
    #[error("Illegal move {mv} in position {fen}")]
    IllegalMove { mv: String, fen: String },
}

pub fn parse_fen(fen: &str) -> Result<Board, PositionError> {
    fen.parse()
        .map_err(|_| PositionError::InvalidFen(fen.to_string()))
}

/// Play a UCI move ("e2e4", "e1g1", "e7e8q") and return the new FEN.
pub fn play_uci_move(board: &mut Board, uci: &str) -> Result<String, PositionError> {
    let mv: Move = uci
        .parse()
        .map_err(|_| PositionError::InvalidMove(uci.to_string()))?;

    let legal = legal_moves(board);
    let mv = convert_uci_castling(mv, &legal);
    if !legal.contains(&mv) {
        return Err(PositionError::IllegalMove {
            mv: uci.to_string(),
            fen: board.to_string(),
        });
    }

    board.play(mv);
    Ok(board.to_string())
}

/// Every position of the line: the start, then one after each move.
pub fn positions_along(start: &str, moves: &[String]) -> Result<Vec<String>, PositionError> {
    let mut board = parse_fen(start)?;
    let mut positions = vec![board.to_string()];
    for uci in moves {
        positions.push(play_uci_move(&mut board, uci)?);
    }
    Ok(positions)
}

fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    board.generate_moves(|mvs| {
        moves.extend(mvs);
        false
    });
    moves
}

/// Engines write castling as the king's two-square step; cozy-chess encodes
/// it as the king capturing its own rook.
fn convert_uci_castling(mv: Move, legal_moves: &[Move]) -> Move {
    let is_back_rank = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
    if !is_back_rank || mv.from.file() != File::E || mv.promotion.is_some() {
        return mv;
    }

    let rook_file = match mv.to.file() {
        File::G => File::H,
        File::C => File::A,
        _ => return mv,
    };
    let converted = Move {
        from: mv.from,
        to: Square::new(rook_file, mv.from.rank()),
        promotion: None,
    };

    if legal_moves.contains(&converted) {
        converted
    } else {
        mv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_play_moves_from_start() {
        let positions =
            positions_along(STARTPOS, &["e2e4".to_string(), "e7e5".to_string()]).unwrap();
        assert_eq!(positions.len(), 3);
        assert_eq!(positions[0], STARTPOS);
        assert!(positions[1].starts_with("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b"));
        assert!(positions[2].starts_with("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w"));
    }

    #[test]
    fn test_uci_castling_is_converted() {
        let mut board =
            parse_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        let fen = play_uci_move(&mut board, "e1g1").unwrap();
        assert!(fen.starts_with("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R4RK1 b"));

        let fen = play_uci_move(&mut board, "e8c8").unwrap();
        assert!(fen.starts_with("2kr3r/pppppppp/8/8/8/8/PPPPPPPP/R4RK1 w"));
    }

    #[test]
    fn test_illegal_move_is_rejected() {
        let mut board = parse_fen(STARTPOS).unwrap();
        assert!(matches!(
            play_uci_move(&mut board, "e2e5"),
            Err(PositionError::IllegalMove { .. })
        ));
        assert!(matches!(
            play_uci_move(&mut board, "zz"),
            Err(PositionError::InvalidMove(_))
        ));
        assert_eq!(board.to_string(), STARTPOS);
    }

    #[test]
    fn test_invalid_fen() {
        assert!(matches!(
            positions_along("not a fen", &[]),
            Err(PositionError::InvalidFen(_))
        ));
    }
}
