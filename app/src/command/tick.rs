use chrono::Utc;

use super::Runtime;

/// One due-reminder search, for cron-driven setups.
#[derive(Debug, Clone, Copy)]
pub struct TickStrategy;

impl super::CommandStrategy for TickStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let runtime = Runtime::load()?;
        let fired = runtime.scheduler()?.tick_and_wait(Utc::now()).await?;
        if fired.is_empty() {
            println!("No reminders due");
        }
        Ok(())
    }
}
