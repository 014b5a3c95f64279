//! Line protocol for a parent process (the assistant shell).
//!
//! Each non-blank stdin line is one utterance. Each answer is written as a
//! single JSON line on stdout, so a streamed answer is collected before it is
//! written.

use crate::config::Settings;
use crate::orchestrator::{Orchestrator, SERVER_DOWN};
use anyhow::Result;
use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

/// Run the listen command until stdin is closed.
pub async fn run_listen(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(&settings)?;
    info!("Listening for utterances on stdin");

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    answer_lines(&orchestrator, stdin, stdout).await
}

/// Answer every line from `reader`, writing one JSON object per line to `writer`.
pub(crate) async fn answer_lines<R, W>(orchestrator: &Orchestrator, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        debug!("Received line ({} bytes)", line.len());

        let answer = match orchestrator.handle_user_turn(&line).await {
            Ok(output) => output.into_text().await,
            Err(e) => {
                warn!("Failed to answer: {}", e);
                SERVER_DOWN.to_string()
            }
        };
        let reply = json!({ "llm_response": answer });

        let mut encoded = serde_json::to_string(&reply)?;
        encoded.push('\n');
        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}
