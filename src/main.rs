mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Subscriber;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use xdb_agent::config::AgentConfig;

#[derive(Parser)]
#[command(name = "xdb-agent", version, about = "Conversational agent for the XDB memory service")]
struct Cli {
    /// Config file (default: ~/.xdb-agent/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat loop
    Chat,
    /// Send a single message and print the reply
    Ask {
        /// The message to send
        message: String,
    },
    /// Check that the memory service is reachable
    Health,
    /// Submit a transcript file for summary extraction
    Transcript {
        /// Transcript file (.json, .txt, .vtt, ...)
        path: PathBuf,
        /// User key the transcript belongs to
        #[arg(long)]
        user: String,
        /// Tag for the extracted memories
        #[arg(long, default_value = "meeting")]
        tag: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log to stderr so stdout carries only the conversation. The subscriber
    // is up before config loads; the configured level is applied after.
    let early_level = std::env::var("XDB_LOG_LEVEL").unwrap_or_else(|_| "warn".into());
    let (subscriber, filter_handle) = log_subscriber(&early_level, std::io::stderr);
    subscriber.init();

    let config = match &cli.config {
        Some(path) => AgentConfig::load_from(path)?,
        None => AgentConfig::load()?,
    };
    filter_handle.reload(parse_filter(&config.logging.log_level))?;

    match cli.command {
        Command::Chat => cli::chat(&config).await?,
        Command::Ask { message } => cli::ask(&config, &message).await?,
        Command::Health => cli::health::health(&config).await?,
        Command::Transcript { path, user, tag } => {
            cli::transcript::submit(&config, &path, &user, &tag).await?
        }
    }

    Ok(())
}

/// A subscriber whose level filter can be swapped once config is known.
fn log_subscriber<W>(
    level: &str,
    writer: W,
) -> (
    impl Subscriber + Send + Sync + 'static,
    reload::Handle<EnvFilter, Registry>,
)
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let (filter, handle) = reload::Layer::new(parse_filter(level));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer));
    (subscriber, handle)
}

fn parse_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn warnings_before_config_load_are_kept() {
        let buffer = Buffer::default();
        let sink = buffer.clone();
        let (subscriber, handle) = log_subscriber("warn", move || sink.clone());

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("ignoring unparseable environment override");
            handle.reload(parse_filter("error")).unwrap();
            tracing::warn!("after reload");
        });

        let logged = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("ignoring unparseable environment override"));
        assert!(!logged.contains("after reload"));
    }
}
