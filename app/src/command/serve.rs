use tracing::{info, warn};

use super::Runtime;

/// Runs the reminder scheduler until Ctrl+C.
#[derive(Debug, Clone, Copy)]
pub struct ServeStrategy;

impl super::CommandStrategy for ServeStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let runtime = Runtime::load()?;
        let scheduler = runtime.scheduler()?;

        scheduler
            .run(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Failed to listen for Ctrl+C: {e}");
                    std::future::pending::<()>().await;
                }
                info!("Shutdown requested");
            })
            .await;
        Ok(())
    }
}
