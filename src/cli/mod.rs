pub mod health;
pub mod transcript;

use anyhow::{Context, Result};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use xdb_agent::agent::MemoryAgent;
use xdb_agent::config::AgentConfig;

const EXIT_WORDS: &[&str] = &["quit", "exit", "bye", "q"];

/// What the loop should do with one line of input.
#[derive(Debug, PartialEq, Eq)]
enum LineAction<'a> {
    Quit,
    Reset,
    Help,
    Empty,
    Message(&'a str),
}

fn classify(line: &str) -> LineAction<'_> {
    let trimmed = line.trim();
    let lower = trimmed.to_ascii_lowercase();
    if trimmed.is_empty() {
        LineAction::Empty
    } else if EXIT_WORDS.contains(&lower.as_str()) {
        LineAction::Quit
    } else if lower == "reset" {
        LineAction::Reset
    } else if lower == "help" {
        LineAction::Help
    } else {
        LineAction::Message(trimmed)
    }
}

fn print_help(agent: &MemoryAgent) {
    println!("Commands:");
    println!("  help                 show this message");
    println!("  reset                forget the conversation and current user");
    println!("  quit | exit | bye    leave");
    println!();
    println!("Examples:");
    println!("  My user key is alice_01");
    println!("  Remember that I moved to Lisbon, tag it as personal");
    println!("  Show my memories about travel");
    println!();
    match agent.current_user() {
        Some(user) => println!("Current user: {user}"),
        None => println!("Current user: not identified yet"),
    }
}

fn prompt() -> Result<()> {
    print!("\nYou: ");
    std::io::stdout().flush().context("failed to flush stdout")
}

/// Line-oriented conversation on stdin/stdout. One utterance is fully
/// answered before the next line is read.
pub async fn chat(config: &AgentConfig) -> Result<()> {
    let mut agent = MemoryAgent::from_config(config)?;

    println!("XDB memory agent. Type 'help' for commands, 'quit' to leave.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt()?;
        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };

        match classify(&line) {
            LineAction::Quit => break,
            LineAction::Empty => println!("Please type a message, or 'help' for examples."),
            LineAction::Help => print_help(&agent),
            LineAction::Reset => {
                agent.reset_session();
                println!("Conversation reset.");
            }
            LineAction::Message(message) => {
                let reply = agent.chat(message).await;
                println!("\nAgent: {reply}");
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// Single-shot: one message, one reply.
pub async fn ask(config: &AgentConfig, message: &str) -> Result<()> {
    let mut agent = MemoryAgent::from_config(config)?;
    let reply = agent.chat(message).await;
    println!("{reply}");
    Ok(())
}
