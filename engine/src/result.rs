use serde::{Deserialize, Serialize};
use std::fmt;

use crate::uci::InfoLine;

/// Base score for a forced mate, in pawns. Far outside any ordinary evaluation.
pub const MATE_SCORE: f64 = 10_000.0;

/// Anything at or beyond this magnitude is a mate score
const MATE_THRESHOLD: f64 = 9_000.0;

/// One evaluation snapshot reported by the engine.
///
/// Snapshots are immutable and replaced wholesale; `best_move` is either
/// empty or the first move of `best_line`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineResult {
    /// Score in pawns, positive favours White
    pub evaluation: f64,
    pub best_move: String,
    pub best_line: Vec<String>,
    pub depth: u32,
}

impl EngineResult {
    /// Build a result from an info line.
    ///
    /// Returns `None` unless the line carries a depth and a centipawn or mate
    /// score. Centipawns win when both are present. Lower/upper bound scores
    /// are not evaluations; the exact line at the same depth follows them.
    pub fn from_info(info: &InfoLine) -> Option<Self> {
        if info.bound.is_some() {
            return None;
        }
        let depth = info.depth?;
        let evaluation = match (info.centipawns, info.mate) {
            (Some(cp), _) => cp as f64 / 100.0,
            (None, Some(mate)) => mate_evaluation(mate),
            (None, None) => return None,
        };

        Some(Self {
            evaluation,
            best_move: info.pv.first().cloned().unwrap_or_default(),
            best_line: info.pv.clone(),
            depth,
        })
    }

    pub fn is_mate(&self) -> bool {
        self.evaluation.abs() >= MATE_THRESHOLD
    }

    /// Signed number of moves to mate, if this is a mate score
    pub fn mate_in(&self) -> Option<i32> {
        if !self.is_mate() {
            return None;
        }
        let moves = if self.evaluation > 0.0 {
            MATE_SCORE - self.evaluation
        } else {
            self.evaluation + MATE_SCORE
        };
        Some(moves.round() as i32)
    }
}

/// `mate n` for n > 0 is the engine delivering mate, n <= 0 the opponent.
fn mate_evaluation(mate: i32) -> f64 {
    if mate > 0 {
        MATE_SCORE - mate as f64
    } else {
        -MATE_SCORE + mate as f64
    }
}

impl fmt::Display for EngineResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mate_in() {
            Some(moves) => write!(f, "#{}", moves)?,
            None => write!(f, "{:+.2}", self.evaluation)?,
        }
        write!(f, " depth {}", self.depth)?;
        if !self.best_line.is_empty() {
            write!(f, " pv {}", self.best_line.join(" "))?;
        }
        Ok(())
    }
}

/// A snapshot tagged with the position it was computed for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionAnalysis {
    pub fen: String,
    pub result: EngineResult,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uci::{parse_uci_message, UciMessage};

    fn result(line: &str) -> Option<EngineResult> {
        match parse_uci_message(line).unwrap() {
            UciMessage::Info(info) => EngineResult::from_info(&info),
            other => panic!("expected info, got {:?}", other),
        }
    }

    #[test]
    fn test_centipawns_to_pawns() {
        assert_eq!(result("info depth 5 score cp 150").unwrap().evaluation, 1.5);
        assert_eq!(result("info depth 5 score cp -37").unwrap().evaluation, -0.37);
        assert_eq!(result("info depth 5 score cp 0").unwrap().evaluation, 0.0);
    }

    #[test]
    fn test_mate_scores() {
        assert_eq!(result("info depth 5 score mate 3").unwrap().evaluation, 9997.0);
        assert_eq!(result("info depth 5 score mate -2").unwrap().evaluation, -10002.0);
        assert_eq!(result("info depth 0 score mate 0").unwrap().evaluation, -10000.0);
    }

    #[test]
    fn test_mate_ordering() {
        let mate_in_1 = result("info depth 5 mate 1").unwrap().evaluation;
        let mate_in_4 = result("info depth 5 mate 4").unwrap().evaluation;
        let big_edge = result("info depth 5 cp 2500").unwrap().evaluation;
        assert!(mate_in_1 > mate_in_4);
        assert!(mate_in_4 > big_edge);
    }

    #[test]
    fn test_missing_score_or_depth() {
        assert!(result("info depth 10 nodes 5000 pv e2e4").is_none());
        assert!(result("info depth x cp 30 pv e2e4").is_none());
    }

    #[test]
    fn test_bound_scores_are_skipped() {
        assert!(result("info depth 18 score cp 41 lowerbound pv e2e4").is_none());
        assert!(result("info depth 18 score mate 3 upperbound pv e2e4").is_none());
        assert!(result("info depth 18 score cp 35 pv e2e4").is_some());
    }

    #[test]
    fn test_best_move_is_head_of_line() {
        let res = result("info depth 10 cp 25 pv e2e4 e7e5").unwrap();
        assert_eq!(res.depth, 10);
        assert_eq!(res.evaluation, 0.25);
        assert_eq!(res.best_move, "e2e4");
        assert_eq!(res.best_line, vec!["e2e4", "e7e5"]);

        let res = result("info depth 3 cp 25").unwrap();
        assert_eq!(res.best_move, "");
        assert!(res.best_line.is_empty());
    }

    #[test]
    fn test_display() {
        let res = result("info depth 10 cp 25 pv e2e4 e7e5").unwrap();
        assert_eq!(res.to_string(), "+0.25 depth 10 pv e2e4 e7e5");
        assert_eq!(res.mate_in(), None);

        let res = result("info depth 12 mate 1 pv g1f3").unwrap();
        assert!(res.is_mate());
        assert_eq!(res.mate_in(), Some(1));
        assert_eq!(res.to_string(), "#1 depth 12 pv g1f3");

        let res = result("info depth 12 mate -2").unwrap();
        assert_eq!(res.mate_in(), Some(-2));
    }

    #[test]
    fn test_serializes_snapshot() {
        let res = result("info depth 10 cp 25 pv e2e4 e7e5").unwrap();
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["depth"], 10);
        assert_eq!(json["best_move"], "e2e4");
        assert_eq!(json["best_line"][1], "e7e5");
    }
}
