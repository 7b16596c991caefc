use crate::uci::UciError;

/// Incoming message from a UCI engine
#[derive(Debug, Clone, PartialEq)]
pub enum UciMessage {
    Id { name: String, value: String },
    UciOk,
    ReadyOk,
    BestMove { mv: String, ponder: Option<String> },
    Info(InfoLine),
}

/// Fields extracted from an `info depth ...` analysis line.
///
/// Every field is optional on its own: a missing or unparsable value only
/// clears that field and never invalidates the rest of the line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoLine {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    pub time_ms: Option<u64>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    pub centipawns: Option<i32>,
    pub mate: Option<i32>,
    /// Set when the score is only a bound from an aspiration window
    pub bound: Option<ScoreBound>,
    /// Principal variation in coordinate notation ("e2e4", "e7e8q")
    pub pv: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBound {
    Lower,
    Upper,
}

/// Parse a single line of engine output
pub fn parse_uci_message(line: &str) -> Result<UciMessage, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.as_slice() {
        ["uciok"] => Ok(UciMessage::UciOk),
        ["readyok"] => Ok(UciMessage::ReadyOk),

        ["id", name, rest @ ..] => {
            if rest.is_empty() {
                return Err(UciError::MalformedMessage(line.to_string()));
            }
            Ok(UciMessage::Id {
                name: name.to_string(),
                value: rest.join(" "),
            })
        }

        ["bestmove", mv, rest @ ..] => {
            let ponder = match rest {
                ["ponder", ponder, ..] => Some(ponder.to_string()),
                _ => None,
            };
            Ok(UciMessage::BestMove {
                mv: mv.to_string(),
                ponder,
            })
        }
        ["bestmove"] => Err(UciError::MalformedMessage(line.to_string())),

        // Only depth reports carry analysis; "info string ..." and friends are noise.
        ["info", "depth", ..] => Ok(UciMessage::Info(parse_info_line(&tokens[1..]))),

        _ => Err(UciError::UnknownMessage(line.to_string())),
    }
}

/// Parse the tokens following "info"
fn parse_info_line(tokens: &[&str]) -> InfoLine {
    let mut info = InfoLine::default();
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                i += 1;
                info.depth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "seldepth" => {
                i += 1;
                info.seldepth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "time" => {
                i += 1;
                info.time_ms = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nodes" => {
                i += 1;
                info.nodes = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nps" => {
                i += 1;
                info.nps = tokens.get(i).and_then(|s| s.parse().ok());
            }
            // "score" is optional noise in front of cp/mate
            "cp" => {
                i += 1;
                info.centipawns = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "mate" => {
                i += 1;
                info.mate = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "lowerbound" => info.bound = Some(ScoreBound::Lower),
            "upperbound" => info.bound = Some(ScoreBound::Upper),
            "pv" => {
                // Collect all moves until next keyword
                i += 1;
                while i < tokens.len() && !is_keyword(tokens[i]) {
                    info.pv.push(tokens[i].to_string());
                    i += 1;
                }
                continue; // Don't increment i again
            }
            // Free text runs to the end of the line
            "string" => break,
            _ => {
                // Unknown keyword or stray value, skip
            }
        }
        i += 1;
    }

    info
}

fn is_keyword(token: &str) -> bool {
    matches!(
        token,
        "depth"
            | "seldepth"
            | "time"
            | "nodes"
            | "score"
            | "cp"
            | "mate"
            | "lowerbound"
            | "upperbound"
            | "wdl"
            | "pv"
            | "multipv"
            | "currmove"
            | "currmovenumber"
            | "hashfull"
            | "nps"
            | "tbhits"
            | "sbhits"
            | "cpuload"
            | "refutation"
            | "currline"
            | "string"
    )
}
