use std::fmt;

/// Commands written to the engine, one per line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    SetOption { name: String, value: Option<String> },
    IsReady,
    Stop,
    Position { fen: String },
    Go { depth: u32 },
    Quit,
}

impl UciCommand {
    pub fn set_option(name: impl Into<String>, value: impl ToString) -> Self {
        UciCommand::SetOption {
            name: name.into(),
            value: Some(value.to_string()),
        }
    }
}

impl fmt::Display for UciCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UciCommand::Uci => f.write_str("uci"),
            UciCommand::SetOption { name, value } => match value {
                Some(val) => write!(f, "setoption name {} value {}", name, val),
                None => write!(f, "setoption name {}", name),
            },
            UciCommand::IsReady => f.write_str("isready"),
            UciCommand::Stop => f.write_str("stop"),
            UciCommand::Position { fen } => write!(f, "position fen {}", fen),
            UciCommand::Go { depth } => write!(f, "go depth {}", depth),
            UciCommand::Quit => f.write_str("quit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        assert_eq!(UciCommand::Uci.to_string(), "uci");
        assert_eq!(
            UciCommand::set_option("MultiPV", 1).to_string(),
            "setoption name MultiPV value 1"
        );
        assert_eq!(
            UciCommand::SetOption {
                name: "Clear Hash".to_string(),
                value: None
            }
            .to_string(),
            "setoption name Clear Hash"
        );
        assert_eq!(UciCommand::IsReady.to_string(), "isready");
        assert_eq!(UciCommand::Stop.to_string(), "stop");
        assert_eq!(
            UciCommand::Position {
                fen: "8/8/8/8/8/8/8/K1k5 w - - 0 1".to_string()
            }
            .to_string(),
            "position fen 8/8/8/8/8/8/8/K1k5 w - - 0 1"
        );
        assert_eq!(UciCommand::Go { depth: 15 }.to_string(), "go depth 15");
        assert_eq!(UciCommand::Quit.to_string(), "quit");
    }
}
