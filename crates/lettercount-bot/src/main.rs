//! Lettercount bot binary.

use lettercount_bot::{BotConfig, BotNode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lettercount_bot=info,lettercount_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting lettercount bot");

    let config = BotConfig::from_env()?;

    let node = BotNode::new(config).await?;
    node.run().await?;

    Ok(())
}
