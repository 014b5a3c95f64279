//! Interactive chat command.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{AssistantOutput, Orchestrator};
use anyhow::Result;
use console::style;
use futures::StreamExt;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(settings: Settings) -> Result<()> {
    if settings.completion.api_key.is_none() {
        Output::warning("No completion API key configured (set RUNPOD_KEY or completion.api_key).");
    }

    let orchestrator = Orchestrator::new(&settings)?;

    println!("\n{}", style("AskVox Chat").bold().cyan());
    println!(
        "{}\n",
        style("Type your message, or 'exit' to quit. Use 'clear' to reset the conversation.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            orchestrator.clear_context().await;
            Output::info("Conversation history cleared.");
            continue;
        }

        match orchestrator.handle_user_turn(input).await {
            Ok(AssistantOutput::Text(answer)) => {
                Output::assistant_prefix();
                println!("{}\n", answer);
            }
            Ok(AssistantOutput::Stream(mut fragments)) => {
                Output::assistant_prefix();
                while let Some(fragment) = fragments.next().await {
                    print!("{}", fragment);
                    stdout.flush()?;
                }
                println!("\n");
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}
