use anyhow::{bail, Result};
use std::path::Path;

use xdb_agent::client::MemoryServiceClient;
use xdb_agent::config::AgentConfig;
use xdb_agent::transcript::load_transcript;

/// Load a transcript and submit it for summary extraction.
pub async fn submit(config: &AgentConfig, path: &Path, user: &str, tag: &str) -> Result<()> {
    config.validate()?;
    let transcript = load_transcript(path)?;
    if transcript.trim().is_empty() {
        bail!("transcript {} is empty", path.display());
    }

    let client = MemoryServiceClient::new(&config.service)?;
    println!(
        "Submitting {} ({} chars) for user {user}...",
        path.display(),
        transcript.len()
    );

    match client.process_transcript(user, &transcript, tag).await {
        Ok(submission) => {
            println!("Transcript accepted.");
            println!(
                "Process ID: {}",
                submission.process_id.as_deref().unwrap_or("N/A")
            );
            if !submission.message.is_empty() {
                println!("Message: {}", submission.message);
            }
            Ok(())
        }
        Err(failure) => bail!("transcript submission failed: {failure}"),
    }
}
