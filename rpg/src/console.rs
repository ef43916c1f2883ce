//! Line-oriented console front end.
//!
//! Reads one command per line from stdin, hands it to the game, and prints
//! whatever the game writes. Ends on quit, end of input, or Ctrl-C.

use rpg_core::config::Config;
use rpg_core::dialogue::{ChatBackend, DialogueAdapter, DialogueRequest, ReplyOutcome};
use rpg_core::game::write_farewell;
use rpg_core::{Flow, Game, Provider};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use tokio::sync::{mpsc, watch};
use tracing::error;

const PROMPT: &str = "> ";

/// Lines read from the player, ending when the sender hangs up.
pub type Input = mpsc::UnboundedReceiver<io::Result<String>>;

/// Flips to `true` once the player asks to stop.
pub type Interrupt = watch::Receiver<bool>;

/// Run the interactive game loop on stdin and stdout.
pub async fn run<B: ChatBackend>(mut game: Game<B>, debug: bool) -> io::Result<()> {
    let mut stdout = io::stdout();

    game.write_welcome(&mut stdout)?;
    game.look(&mut stdout)?;

    let input = spawn_stdin_reader();
    let interrupt = spawn_interrupt_listener();

    session(&mut game, input, interrupt, &mut stdout, debug).await
}

/// Prompt, read, and dispatch until quit, end of input, or interrupt.
///
/// An interrupt is honored both while waiting for input and while a command
/// is still running, so a stalled provider never traps the player.
pub async fn session<B: ChatBackend, W: Write>(
    game: &mut Game<B>,
    mut input: Input,
    mut interrupt: Interrupt,
    out: &mut W,
    debug: bool,
) -> io::Result<()> {
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let line = tokio::select! {
            line = input.recv() => line,
            _ = interrupted(&mut interrupt) => None,
        };

        let line = match line {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                error!(error = %e, "failed to read input");
                writeln!(out)?;
                writeln!(out, "Error reading input: {e}")?;
                break;
            }
            // End of input or interrupt.
            None => {
                writeln!(out)?;
                writeln!(out)?;
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let result = tokio::select! {
            result = game.handle_command(line, out) => Some(result),
            _ = interrupted(&mut interrupt) => None,
        };

        match result {
            Some(Ok(Flow::Quit)) => return Ok(()),
            Some(Ok(Flow::Continue)) => {}
            Some(Err(e)) => {
                error!(error = %e, command = line, "command failed");
                if debug {
                    writeln!(out, "Error: {e}")?;
                } else {
                    writeln!(out, "Something went wrong. Please try again.")?;
                }
                writeln!(out)?;
            }
            None => {
                writeln!(out)?;
                writeln!(out)?;
                break;
            }
        }
    }

    write_farewell(out)?;
    Ok(())
}

/// Resolves once the interrupt flag is set; never, if nobody can set it.
async fn interrupted(interrupt: &mut Interrupt) {
    if interrupt.wait_for(|&hit| hit).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Read stdin on its own thread so a pending read never holds up shutdown.
fn spawn_stdin_reader() -> Input {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let failed = line.is_err();
            if tx.send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}

/// Install the Ctrl-C handler once for the whole session.
fn spawn_interrupt_listener() -> Interrupt {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(true);
        }
    });
    rx
}

/// Send one probe message through the dialogue path and report the result.
pub async fn run_check<B: ChatBackend>(config: &Config, backend: B) -> ExitCode {
    println!("=== Provider check ===");
    println!("  Provider: {} ({})", config.provider, config.provider.description());
    println!("  Endpoint: {}", config.provider.endpoint());
    if config.model_is_suggested() {
        println!("  Model:    {}", config.model);
    } else {
        println!("  Model:    {} (not a suggested model for this provider)", config.model);
    }
    println!("  API key:  {}", config.masked_api_key());
    println!();
    println!("Sending test message...");

    let adapter = DialogueAdapter::new(backend, config.max_response_length);
    let reply = adapter
        .respond(DialogueRequest {
            character_name: "Assistant",
            personality: "A friendly helper who answers briefly.",
            player_message: "Hello, please introduce yourself briefly.",
            context: "",
        })
        .await;

    match reply.outcome {
        ReplyOutcome::Generated => {
            println!("[OK] Connection works.");
            println!("  Reply: {}", reply.text);
            ExitCode::SUCCESS
        }
        ReplyOutcome::Empty => {
            println!("[WARN] Connected, but the model returned no text.");
            ExitCode::FAILURE
        }
        ReplyOutcome::Failed(kind) => {
            println!("[ERROR] {:?}: {}", kind, reply.text);
            println!("  Re-run with --debug to see the raw error.");
            ExitCode::FAILURE
        }
    }
}

/// Print the provider table.
pub fn print_providers() {
    println!("Supported AI providers:");
    println!();
    for provider in Provider::all() {
        println!("  {} - {}", provider.name(), provider.description());
        println!("    Endpoint: {}", provider.endpoint());
        println!("    Models:   {}", provider.suggested_models().join(", "));
        println!();
    }
    println!("Set RPG_PROVIDER, RPG_API_KEY and RPG_MODEL in .env, then run `rpg`.");
}
