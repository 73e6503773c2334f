use anyhow::{bail, Result};

use xdb_agent::client::MemoryServiceClient;
use xdb_agent::config::AgentConfig;

/// Call the service health endpoint and print what it reports.
pub async fn health(config: &AgentConfig) -> Result<()> {
    config.validate()?;
    let client = MemoryServiceClient::new(&config.service)?;

    println!("Memory service: {}", client.base_url());
    println!(
        "Request signing: {}",
        if client.signing_mode().is_signed() {
            "enabled"
        } else {
            "disabled"
        }
    );

    match client.health_check().await {
        Ok(status) => {
            println!("Status: {}", status.status);
            if let Some(message) = status.message {
                println!("Message: {message}");
            }
            Ok(())
        }
        Err(failure) => bail!("health check failed: {failure}"),
    }
}
