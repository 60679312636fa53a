#![warn(clippy::all)]
#![allow(clippy::pedantic)]

use anyhow::{bail, Context, Result};
use banter_core::{Conversation, ConversationStore, OpenAiClient, Palette, Role};
use clap::{ArgAction, Parser};
use std::io::Read;
use tracing::{debug, Level};

mod config;

use config::StatePaths;

/// Named AI chat conversations for the terminal.
#[derive(Parser, Debug)]
#[command(name = "banter")]
#[command(version)]
#[command(about = "Chat with a language model, one named conversation at a time.", long_about = None)]
struct Cli {
    /// Name of the conversation (a new one is created if absent)
    #[arg(short = 'c', long = "chat", default_value = "default", value_name = "NAME")]
    chat: String,

    /// Role of the message to append (u/a/s or the full word)
    #[arg(short, long, default_value = "user", value_parser = parse_role)]
    role: Role,

    /// Increase output verbosity (use up to 2 times)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Disable ANSI escape sequences on output
    #[arg(short = 'n', long = "no-color")]
    no_color: bool,

    /// List stored conversation names and exit
    #[arg(long)]
    list: bool,

    /// Content to append (read from stdin until EOF when omitted)
    content: Vec<String>,
}

fn parse_role(s: &str) -> Result<Role, String> {
    Role::parse(s).ok_or_else(|| format!("unknown role '{s}' (use user, assistant, or system)"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let paths = StatePaths::resolve()?;
    debug!(state_dir = %paths.state_dir.display(), "resolved state directory");
    let store = ConversationStore::open(&paths.db_path)?;

    if cli.list {
        for name in store.names()? {
            println!("{name}");
        }
        return Ok(());
    }

    let palette = if cli.no_color {
        Palette::plain()
    } else {
        Palette::colored()
    };

    let mut conversation = store.get(&cli.chat)?;
    if !conversation.is_empty() {
        println!("Conversation so far:");
        print!("{}", conversation.render(&palette));
        if cli.verbose >= 1 {
            println!("[{}]", conversation.summary());
        }
    }

    let content = resolve_content(&cli)?;
    if content.is_empty() {
        // Nothing to say; never contact the service for empty input.
        return Ok(());
    }

    let api_key = std::env::var(config::API_KEY_ENV)
        .with_context(|| format!("{} is not set", config::API_KEY_ENV))?;
    let client = match std::env::var(config::BASE_URL_ENV) {
        Ok(base_url) => OpenAiClient::with_base_url(api_key, base_url),
        Err(_) => OpenAiClient::new(api_key),
    };

    conversation.add_message(cli.role, content);
    let response = conversation.send(&client, &serde_json::Map::new())?;

    if !store.put(&cli.chat, &conversation)? {
        bail!("refusing to store an empty conversation");
    }

    let usage = response.usage;
    println!(
        "Total tokens used: {}  (prompt: {}, completion: {})",
        usage.total_tokens, usage.prompt_tokens, usage.completion_tokens
    );
    if cli.verbose >= 2 {
        if let Some((request, reply)) = conversation.exchange_log.last() {
            println!("sent request:");
            println!("{}", serde_json::to_string_pretty(request)?);
            println!("response:");
            println!("{}", serde_json::to_string_pretty(reply)?);
        }
    }

    // Show the exchange that just happened.
    let len = conversation.len();
    for index in len.saturating_sub(2)..len {
        if let Some(rendered) = conversation.render_message(index, &palette) {
            print!("{rendered}");
        }
    }
    Ok(())
}

/// Positional words joined by spaces, else stdin until EOF. Always trimmed.
fn resolve_content(cli: &Cli) -> Result<String> {
    if !cli.content.is_empty() {
        return Ok(cli.content.join(" ").trim().to_string());
    }
    if console::user_attended() {
        eprintln!(
            "Enter content for conversation '{}', role {} (end with EOF):",
            cli.chat, cli.role
        );
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("reading content from stdin")?;
    Ok(buffer.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_has_no_flag_conflicts() {
        Cli::command().debug_assert();
    }

    #[test]
    fn role_abbreviations_parse() {
        assert_eq!(parse_role("u").unwrap(), Role::User);
        assert_eq!(parse_role("system").unwrap(), Role::System);
        assert!(parse_role("x").is_err());
    }
}
