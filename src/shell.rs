//! Interactive shell
//!
//! Reads one command per line until `quit`, end of input or Ctrl+C. The
//! serial port stays open across lines, and the switch history built by
//! `switch` commands feeds `scene save`.

use crate::app::App;
use crate::cli::{split_line, ShellCommand, ShellLine};
use crate::commands::{self, describe_connection};
use crate::error::{MatrixError, Result};
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

const PROMPT: &str = "mxl> ";

/// Run the shell on stdin/stdout
pub async fn run(app: &mut App) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    run_with(app, stdin, stdout).await
}

/// Run the shell on any line source and sink
pub async fn run_with<R, W>(app: &mut App, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    loop {
        write_out(&mut writer, PROMPT).await?;

        let line = tokio::select! {
            line = lines.next_line() => line.map_err(|source| MatrixError::Runtime { source })?,
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted");
                None
            }
        };
        let Some(line) = line else {
            break;
        };

        let words = split_line(&line);
        if words.is_empty() {
            continue;
        }

        let command = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                write_line(&mut writer, e.render().to_string().trim_end()).await?;
                continue;
            }
        };

        if command == ShellCommand::Quit {
            break;
        }
        let output = match handle(app, command).await {
            Ok(text) => text,
            Err(e) => format!("Error: {}", e),
        };
        if !output.is_empty() {
            write_line(&mut writer, &output).await?;
        }
    }

    if app.sender().is_open() {
        app.disconnect_serial()?;
    }
    Ok(())
}

async fn handle(app: &mut App, command: ShellCommand) -> Result<String> {
    match command {
        ShellCommand::Action(action) => commands::execute(app, action).await,
        ShellCommand::Connect { port } => {
            app.connect_serial(port.as_deref()).await?;
            Ok(format!(
                "Connected to {}",
                app.sender().connected_display_name().unwrap_or_default()
            ))
        }
        ShellCommand::Disconnect => {
            app.disconnect_serial()?;
            Ok("Disconnected".to_string())
        }
        ShellCommand::Status => Ok(status(app)),
        ShellCommand::Log { count } => Ok(app.logs().to_text_limited(count)),
        ShellCommand::History => Ok(app
            .history()
            .records()
            .iter()
            .map(|r| r.summary())
            .collect::<Vec<_>>()
            .join("\n")),
        ShellCommand::ClearHistory => {
            app.clear_history();
            Ok("History cleared".to_string())
        }
        ShellCommand::Quit => Ok(String::new()),
    }
}

fn status(app: &App) -> String {
    let link = match app.sender().connected_port() {
        Some(port) if app.sender().is_open() => format!("open ({})", port),
        Some(port) => format!("stale ({})", port),
        None => "closed".to_string(),
    };
    format!(
        "{}\nSerial link: {}\nPending switches: {}",
        describe_connection(&app.connection()),
        link,
        app.history().len()
    )
}

async fn write_out<W: AsyncWrite + Unpin>(writer: &mut W, text: &str) -> Result<()> {
    writer
        .write_all(text.as_bytes())
        .await
        .map_err(|source| MatrixError::Runtime { source })?;
    writer
        .flush()
        .await
        .map_err(|source| MatrixError::Runtime { source })
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, text: &str) -> Result<()> {
    write_out(writer, &format!("{}\n", text)).await
}
