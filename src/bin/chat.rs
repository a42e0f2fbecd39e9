//! Line-based chat client.
//!
//! Each line typed on stdin is sent to the configured endpoint and the reply
//! is printed. `/provider <name>` switches provider, `/quit` exits. All
//! tracing output goes to stderr so stdout stays a clean transcript.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

use flappy_chat::chat::{ChatMessage, ConversationController, HttpChatBackend, Provider};
use flappy_chat::config::Config;
use flappy_chat::telemetry;

enum Command<'a> {
    Quit,
    Provider(Option<&'a str>),
    Say(&'a str),
    Nothing,
}

fn parse(line: &str) -> Command<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Command::Nothing;
    }
    match line.split_once(' ').unwrap_or((line, "")) {
        ("/quit" | "/exit", _) => Command::Quit,
        ("/provider", rest) => {
            let rest = rest.trim();
            Command::Provider((!rest.is_empty()).then_some(rest))
        }
        _ => Command::Say(line),
    }
}

/// Send `text` and draw a progress indicator for as long as the controller
/// reports a request in flight.
async fn send_with_indicator<W: AsyncWrite + Unpin>(
    controller: &ConversationController,
    text: &str,
    out: &mut W,
    tick: Duration,
) -> std::io::Result<ChatMessage> {
    let send = controller.send_user_message(text);
    tokio::pin!(send);
    let mut ticker = tokio::time::interval(tick);
    let mut shown = false;

    let reply = loop {
        tokio::select! {
            reply = &mut send => break reply,
            _ = ticker.tick() => {
                if controller.is_loading() {
                    let mark: &[u8] = if shown { b"." } else { b"... thinking" };
                    out.write_all(mark).await?;
                    out.flush().await?;
                    shown = true;
                }
            }
        }
    };

    if shown {
        out.write_all(b"\n").await?;
    }
    Ok(reply)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    telemetry::init_stderr(&config.log_level);

    let backend = HttpChatBackend::new(&config.chat_endpoint, config.chat_timeout)?;
    info!(endpoint = backend.endpoint(), provider = %config.chat_provider, "Chat client starting");
    let controller = ConversationController::new(Arc::new(backend), config.chat_provider);

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(b"Type a message. /provider <deepseek|openai|gemini> switches model, /quit exits.\n")
        .await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse(&line) {
            Command::Nothing => {}
            Command::Quit => break,
            Command::Provider(None) => {
                let text = format!("provider: {}\n", controller.provider());
                stdout.write_all(text.as_bytes()).await?;
            }
            Command::Provider(Some(name)) => {
                let text = match name.parse::<Provider>() {
                    Ok(provider) => {
                        controller.set_provider(provider);
                        format!("provider set to {provider}\n")
                    }
                    Err(e) => format!("{e}\n"),
                };
                stdout.write_all(text.as_bytes()).await?;
            }
            Command::Say(text) => {
                let reply =
                    send_with_indicator(&controller, text, &mut stdout, Duration::from_millis(300))
                        .await?;
                let text = format!("{}: {}\n", reply.author.display_name, reply.text);
                stdout.write_all(text.as_bytes()).await?;
            }
        }
    }

    info!(messages = controller.messages().len(), "Chat client exiting");
    Ok(())
}
