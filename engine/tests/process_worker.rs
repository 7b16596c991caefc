#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine::{AnalysisSession, EngineState, SessionConfig};
use tokio::time::timeout;

const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

const STEP: Duration = Duration::from_secs(5);

/// A tiny UCI engine: answers the handshake and reports two depths per search.
const STUB_ENGINE: &str = r#"#!/bin/sh
while IFS= read -r line; do
  case "$line" in
    uci) echo "id name StubFish"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go*)
      echo "info depth 1 seldepth 1 score cp 13 nodes 20 pv e2e4"
      echo "info depth 2 seldepth 2 score cp 21 nodes 80 pv e2e4 e7e5"
      echo "bestmove e2e4 ponder e7e5"
      ;;
    quit) exit 0 ;;
  esac
done
"#;

fn write_stub(dir: &Path) -> PathBuf {
    let path = dir.join("stub-engine");
    std::fs::write(&path, STUB_ENGINE).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[tokio::test]
async fn analyses_with_engine_process() {
    let dir = tempfile::tempdir().unwrap();
    let config = SessionConfig {
        engine_path: Some(write_stub(dir.path())),
        ..Default::default()
    };
    let session = AnalysisSession::with_process_engine(config);

    session.set_enabled(true).await.unwrap();
    session.set_position(STARTPOS).await.unwrap();

    let mut results = session.subscribe();
    let analysis = timeout(
        STEP,
        results.wait_for(|r| r.as_ref().is_some_and(|a| a.result.depth == 2)),
    )
    .await
    .expect("no depth 2 result")
    .unwrap()
    .clone()
    .unwrap();
    assert_eq!(analysis.fen, STARTPOS);
    assert_eq!(analysis.result.evaluation, 0.21);
    assert_eq!(analysis.result.best_line, vec!["e2e4", "e7e5"]);

    let mut state = session.watch_state();
    timeout(STEP, state.wait_for(|s| *s == EngineState::Ready))
        .await
        .expect("search did not finish")
        .unwrap();

    session.set_enabled(false).await.unwrap();
    assert_eq!(session.state(), EngineState::Terminated);
    assert!(session.latest().is_none());
}

#[tokio::test]
async fn missing_engine_binary_fails_session() {
    let dir = tempfile::tempdir().unwrap();
    let config = SessionConfig {
        engine_path: Some(dir.path().join("no-such-engine")),
        ..Default::default()
    };
    let session = AnalysisSession::with_process_engine(config);
    session.set_enabled(true).await.unwrap();
    assert!(session.state().is_failed());
}
