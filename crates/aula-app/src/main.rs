mod cli;

use std::io::Write as _;
use std::path::Path;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use aula_chat::{Attachment, ChatSession, ClientConfig, FileInput, HttpClient, Sender};

/// Load environment variables from a .env file (KEY=VALUE lines).
fn load_dotenv() {
    let candidates = [
        std::path::PathBuf::from(".env"),
        // Workspace root when run from crates/aula-app/
        std::path::PathBuf::from("../../.env"),
    ];

    for path in &candidates {
        if let Ok(contents) = std::fs::read_to_string(path) {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    let key = key.trim();
                    let value = value.trim().trim_matches('"').trim_matches('\'');
                    if std::env::var(key).is_err() {
                        std::env::set_var(key, value);
                    }
                }
            }
            return;
        }
    }
}

/// Best-effort mime type from the filename extension. The backend accepts
/// images and PDFs; anything else goes up as an octet stream and the
/// backend decides.
fn guess_mime(name: &str) -> &'static str {
    match name.rsplit('.').next() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

fn print_message(msg: &aula_chat::Message) {
    let who = match msg.sender {
        Sender::User => "you",
        Sender::Assistant => "assistant",
    };
    if msg.content.is_empty() && !msg.attachments.is_empty() {
        println!("[{who}] (attachments only)");
    } else {
        println!("[{who}] {}", msg.content);
    }
    for attachment in &msg.attachments {
        println!("        + {} ({})", attachment.name, attachment.mime_type);
    }
}

fn print_new_messages(session: &ChatSession, printed: &mut usize) {
    for msg in &session.messages()[*printed..] {
        print_message(msg);
    }
    *printed = session.messages().len();
}

fn attach(session: &mut ChatSession, path_arg: &str) {
    let path = Path::new(path_arg);
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.to_string(),
        None => {
            eprintln!("not a file path: {path_arg}");
            return;
        }
    };
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("could not read {path_arg}: {e}");
            return;
        }
    };
    let mime = guess_mime(&name);
    match session.stager_mut().stage(FileInput::new(name.clone(), mime, bytes)) {
        Some(_) => println!("staged {name}"),
        None => println!("{name} is already staged"),
    }
}

fn list_staged(staged: &[Attachment]) {
    if staged.is_empty() {
        println!("nothing staged");
        return;
    }
    for attachment in staged {
        println!("  {} ({})", attachment.name, attachment.mime_type);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    load_dotenv();

    let args = cli::parse();

    let log_directive = args.log_level.as_deref().unwrap_or("aula=info");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| "aula=info".parse().unwrap()),
            ),
        )
        .init();

    tracing::info!("Aula v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match args.base_url {
        Some(url) => ClientConfig::new(url),
        None => ClientConfig::from_env(),
    };
    tracing::info!("Backend at {}", config.base_url);

    let client = HttpClient::new(config);
    let mut session = ChatSession::new();
    let mut printed = 0usize;

    println!("session {}", session.session_id());
    println!("commands: /attach <path>, /detach <name>, /files, /reset, /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("stdin error: {e}");
                break;
            }
        };
        let line = line.trim();

        match line.split_once(' ').unwrap_or((line, "")) {
            ("/quit", _) | ("/exit", _) => break,
            ("/reset", _) => {
                let id = session.reset_identity();
                printed = 0;
                println!("new session {id}");
            }
            ("/attach", path) if !path.is_empty() => attach(&mut session, path),
            ("/detach", name) if !name.is_empty() => {
                session.stager_mut().unstage(name);
                println!("detached {name}");
            }
            ("/files", _) => list_staged(&session.stager().previews()),
            _ => {
                match session.submit(&client, line).await {
                    Ok(()) => {}
                    Err(aula_chat::ChatError::EmptySubmit) => {
                        println!("type a question or stage a file first");
                    }
                    Err(e) => tracing::warn!("submit rejected: {e}"),
                }
                print_new_messages(&session, &mut printed);
                if let Some(err) = session.last_error() {
                    eprintln!("(last error: {err})");
                }
            }
        }
    }

    tracing::info!("Shutdown complete");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_guess_covers_the_accepted_types() {
        assert_eq!(guess_mime("foto.png"), "image/png");
        assert_eq!(guess_mime("notes.pdf"), "application/pdf");
        assert_eq!(guess_mime("scan.jpeg"), "image/jpeg");
        assert_eq!(guess_mime("data.bin"), "application/octet-stream");
    }
}
