use crate::{EngineInfo, Score};
use chess::parse_uci_move;
use cozy_chess::Move;

/// Incoming message from UCI engine
#[derive(Debug, Clone)]
pub enum UciMessage {
    Id { name: String, value: String },
    UciOk,
    ReadyOk,
    /// `mv` is `None` for `bestmove (none)` / `bestmove 0000`
    BestMove { mv: Option<Move> },
    Info(EngineInfo),
}

/// Parse a UCI message line
pub fn parse_uci_message(line: &str) -> Result<UciMessage, crate::UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.as_slice() {
        ["uciok", ..] => Ok(UciMessage::UciOk),
        ["readyok", ..] => Ok(UciMessage::ReadyOk),

        ["id", name, value @ ..] if !value.is_empty() => Ok(UciMessage::Id {
            name: name.to_string(),
            value: value.join(" "),
        }),
        ["id", ..] => Err(crate::UciError::MalformedMessage(line.to_string())),

        // A trailing `ponder <move>` is ignored
        ["bestmove", best, ..] => {
            let mv = match *best {
                "(none)" | "0000" => None,
                token => Some(parse_uci_move(token)?),
            };
            Ok(UciMessage::BestMove { mv })
        }
        ["bestmove"] => Err(crate::UciError::MalformedMessage(line.to_string())),

        ["info", rest @ ..] => Ok(UciMessage::Info(parse_info_line(rest))),

        _ => Err(crate::UciError::UnknownMessage(line.to_string())),
    }
}

/// Parse an "info" line from the engine. Only depth, node count and score
/// are kept; other fields are skipped.
fn parse_info_line(tokens: &[&str]) -> EngineInfo {
    let mut info = EngineInfo::default();
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                i += 1;
                info.depth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nodes" => {
                i += 1;
                info.nodes = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "score" => {
                i += 1;
                if let Some(&score_type) = tokens.get(i) {
                    i += 1;
                    if let Some(value_str) = tokens.get(i) {
                        info.score = match score_type {
                            "cp" => value_str.parse().ok().map(Score::Centipawns),
                            "mate" => value_str.parse().ok().map(Score::Mate),
                            _ => None,
                        };
                    }
                }
            }
            // The principal variation and free text run to the end of the line
            "pv" | "string" => break,
            _ => {}
        }
        i += 1;
    }

    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::format_uci_move;

    #[test]
    fn test_parse_bestmove() {
        let msg = parse_uci_message("bestmove e2e4 ponder e7e5").unwrap();
        match msg {
            UciMessage::BestMove { mv } => {
                assert_eq!(format_uci_move(mv.unwrap()), "e2e4");
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_parse_bestmove_none() {
        for line in ["bestmove (none)", "bestmove 0000"] {
            match parse_uci_message(line).unwrap() {
                UciMessage::BestMove { mv } => assert!(mv.is_none()),
                other => panic!("Wrong message type: {:?}", other),
            }
        }
    }

    #[test]
    fn test_parse_bestmove_garbage() {
        assert!(matches!(
            parse_uci_message("bestmove"),
            Err(crate::UciError::MalformedMessage(_))
        ));
        assert!(matches!(
            parse_uci_message("bestmove z9z9"),
            Err(crate::UciError::InvalidMove(_))
        ));
    }

    #[test]
    fn test_parse_info() {
        let msg = parse_uci_message(
            "info depth 12 seldepth 18 score cp 35 nodes 15234 nps 800000 pv e2e4 e7e5",
        )
        .unwrap();
        match msg {
            UciMessage::Info(info) => {
                assert_eq!(info.depth, Some(12));
                assert_eq!(info.score, Some(Score::Centipawns(35)));
                assert_eq!(info.nodes, Some(15234));
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_parse_info_string_is_ignored() {
        match parse_uci_message("info string NNUE evaluation using nn.nnue depth 3").unwrap() {
            UciMessage::Info(info) => assert_eq!(info.depth, None),
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_parse_handshake() {
        assert!(matches!(parse_uci_message("uciok"), Ok(UciMessage::UciOk)));
        assert!(matches!(parse_uci_message("readyok"), Ok(UciMessage::ReadyOk)));
        match parse_uci_message("id name Stockfish 16").unwrap() {
            UciMessage::Id { name, value } => {
                assert_eq!(name, "name");
                assert_eq!(value, "Stockfish 16");
            }
            _ => panic!("Wrong message type"),
        }
        assert!(parse_uci_message("option name Hash type spin").is_err());
    }
}
