//! Prompt loop around a [`ClientSession`].

use crate::commands::{parse_line, Command, Parsed};
use crate::error::ClientError;
use crate::session::ClientSession;
use anyhow::Result;
use std::io::{BufRead, Write};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::debug;

const PROMPT: &str = "client> ";
const INTRO: &str = "Welcome to the Client Instance! Type help to list commands";

/// Read commands from stdin until `exit`, end of input, or Ctrl-C.
///
/// Any open connection is disconnected before returning.
pub async fn run(session: ClientSession) -> Result<()> {
    let lines = spawn_stdin_reader();
    let interrupts = spawn_interrupt_listener()?;
    run_with(session, lines, interrupts, &mut std::io::stdout()).await
}

/// Prompt loop over already-split input lines.
///
/// A value on `interrupts` ends the loop, including while a command is
/// waiting on the server.
pub async fn run_with<W: Write>(
    mut session: ClientSession,
    mut lines: mpsc::UnboundedReceiver<String>,
    mut interrupts: mpsc::UnboundedReceiver<()>,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "{INTRO}")?;

    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let line = tokio::select! {
            line = lines.recv() => line,
            Some(()) = interrupts.recv() => {
                writeln!(out)?;
                debug!("Interrupted at prompt");
                None
            }
        };
        let Some(line) = line else { break };

        match parse_line(&line) {
            Parsed::Empty => continue,
            Parsed::Help(text) | Parsed::Invalid(text) => writeln!(out, "{}", text.trim_end())?,
            Parsed::Command(Command::Exit) => break,
            Parsed::Command(command) => {
                let outcome = tokio::select! {
                    outcome = session.execute(command) => Some(outcome),
                    Some(()) = interrupts.recv() => None,
                };
                let Some(outcome) = outcome else {
                    writeln!(out)?;
                    debug!("Interrupted while running a command");
                    break;
                };

                let output = render(&session, outcome);
                if !output.is_empty() {
                    writeln!(out, "{output}")?;
                }
            }
        }
    }

    if session.disconnect().await {
        writeln!(out, "Successfully Disconnected")?;
    }
    Ok(())
}

/// Text shown for the outcome of one command.
pub fn render(session: &ClientSession, outcome: Result<String, ClientError>) -> String {
    match outcome {
        Ok(output) => output,
        Err(err) if err.is_transport() && !session.is_connected() => {
            format!("{err}\nSuccessfully Disconnected")
        }
        Err(err) => err.to_string(),
    }
}

// Stdin is read on a plain thread; a blocking read inside the runtime would
// keep it from shutting down after Ctrl-C.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

// One SIGINT stream for the whole session, so an interrupt is never missed
// between listeners.
fn spawn_interrupt_listener() -> Result<mpsc::UnboundedReceiver<()>> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while sigint.recv().await.is_some() {
            if tx.send(()).is_err() {
                break;
            }
        }
    });
    Ok(rx)
}
