//! RAG handlers: query generation and streamed answers

use std::io::Write;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::api::build_gateway;
use crate::cli::output::print_queries;
use crate::cli::output::print_warning;
use crate::models::ChatMessage;
use crate::AppConfig;
use crate::Result;

pub async fn handle_queries(config: &AppConfig, question: String) -> Result<()> {
    let gateway = build_gateway(config)?;
    let queries = gateway.rag().multi_query().generate_queries(&question).await?;
    print_queries(&question, &queries);
    Ok(())
}

pub async fn handle_ask(config: &AppConfig, question: String) -> Result<()> {
    let gateway = build_gateway(config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => on_interrupt.cancel(),
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    let mut tokens = gateway.send_message(vec![ChatMessage::user(question)], cancel.clone());
    let mut stdout = std::io::stdout();
    let mut received = 0usize;
    while let Some(token) = tokens.next().await {
        received += 1;
        write!(stdout, "{token}")?;
        stdout.flush()?;
    }
    writeln!(stdout)?;
    watcher.abort();

    if cancel.is_cancelled() {
        print_warning("Generation stopped");
    } else if received == 0 {
        print_warning("No answer was generated; run with --verbose for details");
    }
    Ok(())
}
