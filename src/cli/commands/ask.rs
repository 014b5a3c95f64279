//! Ask command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::router::Route;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(text: &str, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(&settings)?;

    let spinner = Output::spinner(&format!("Thinking ({} route)...", route_label(&orchestrator, text)));

    match orchestrator.handle_user_turn(text).await {
        Ok(output) => {
            let answer = output.into_text().await;
            spinner.finish_and_clear();
            println!("\n{}\n", answer);
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

fn route_label(orchestrator: &Orchestrator, text: &str) -> &'static str {
    match orchestrator.route(text) {
        Route::PlainChat => "chat",
        Route::ToolEligible => "media",
        Route::WebSearch => "web search",
    }
}
