//! Relaychat - terminal front end for a relay chat session.
//!
//! Usage: `relaychat <username> [persona]`. Lines typed on stdin are sent as
//! chat messages; lines starting with `/` are local commands (`/help`).

use anyhow::{Context, Result};
use relaychat_client::{ChatMessage, ChatSession, Sender, SessionConfig, SessionEvent, WsConnector};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
commands:
  /connect            open the relay connection again
  /disconnect         close it
  /user <name>        switch identity (reconnects)
  /persona [name]     set or clear the default persona
  /typing on|off      send a typing indicator
  /who                list users currently typing
  /quit               exit
messages:
  @Name text          ask Name (a user or persona) directly
  @From->@To: text    ask persona From to address persona To";

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they do not interleave with chat output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("relaychat=info,relaychat_client=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = SessionConfig::from_env().context("invalid relay configuration")?;

    let mut args = std::env::args().skip(1);
    let username = args
        .next()
        .or_else(|| std::env::var("RELAYCHAT_USERNAME").ok())
        .filter(|u| !u.trim().is_empty())
        .context("usage: relaychat <username> [persona]")?;
    let persona = args
        .next()
        .or_else(|| std::env::var("RELAYCHAT_PERSONA").ok())
        .filter(|p| !p.trim().is_empty());

    println!("-- {} connecting to {}", username, config.endpoint);
    let mut session = ChatSession::new(config, WsConnector)
        .with_identity(username, persona)
        .with_event_sink(print_event);
    session.connect();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            alive = session.process_next(), if session.has_transport() => {
                if !alive {
                    println!("-- connection ended; /connect to retry");
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if !handle_line(&mut session, &line) {
                    break;
                }
            }
        }
    }

    session.dispose();
    Ok(())
}

/// Returns `false` when the user asked to quit.
fn handle_line(session: &mut ChatSession, line: &str) -> bool {
    let Some(command) = line.trim().strip_prefix('/') else {
        session.send_message(line);
        return true;
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    match name {
        "quit" | "exit" => return false,
        "connect" => session.connect(),
        "disconnect" => session.disconnect(),
        "user" if !arg.is_empty() => session.set_current_user(Some(arg.to_string())),
        "persona" => session.set_persona(Some(arg.to_string()).filter(|p| !p.is_empty())),
        "typing" => session.send_typing_indicator(arg != "off"),
        "who" => {
            let typing: Vec<&str> = session.typing_users().iter().map(String::as_str).collect();
            if typing.is_empty() {
                println!("-- nobody is typing");
            } else {
                println!("-- typing: {}", typing.join(", "));
            }
        }
        _ => println!("{}", HELP),
    }
    true
}

fn print_event(event: SessionEvent) {
    match event {
        SessionEvent::StatusChanged(status) => println!("-- {}", status),
        SessionEvent::MessageAppended(message) => {
            if message.loading {
                println!("   ...");
            } else {
                println!("{}", format_message(&message));
            }
        }
        SessionEvent::MessageReconciled(message) => {
            println!("{}", format_message(&message));
        }
        SessionEvent::TypingChanged {
            username,
            is_typing,
        } => {
            if is_typing {
                println!("-- {} is typing", username);
            }
        }
    }
}

fn format_message(message: &ChatMessage) -> String {
    let author = match message.sender {
        Sender::Me | Sender::User => message.username.clone().unwrap_or_default(),
        Sender::Server => message
            .target_persona
            .clone()
            .unwrap_or_else(|| "relay".to_string()),
        Sender::Ai => message
            .target_persona
            .clone()
            .unwrap_or_else(|| "ai".to_string()),
        Sender::System => return format!("** {}", message.text),
    };
    match (&message.sender, &message.target_persona) {
        (Sender::Me, Some(target)) => format!("<{}> @{} {}", author, target, message.text),
        _ => format!("<{}> {}", author, message.text),
    }
}
