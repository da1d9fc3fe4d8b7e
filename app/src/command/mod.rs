//! Static strategy pattern for CLI commands.
//!
//! Each command is its own strategy type with its own input, dispatched
//! statically from `main`.

use aria_config::Config;
use aria_core::{Broadcast, Dispatcher, MemoryStore, MessageLog};
use aria_directives::{DirectiveDeps, default_registry};
use aria_reminders::{ReminderEngine, ReminderScheduler};
use aria_store::{JsonFileReminderRepository, JsonlMemoryStore, JsonlMessageLog, StdoutBroadcast};
use std::sync::Arc;
use tracing::info;

mod agent;
mod info;
mod init;
mod process;
mod serve;
mod tick;
mod version;

pub use agent::{AgentInput, AgentStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use process::{ProcessInput, ProcessStrategy};
pub use serve::ServeStrategy;
pub use tick::TickStrategy;
pub use version::VersionStrategy;

/// Contract for every command strategy.
pub trait CommandStrategy: Send + Sync + 'static {
    /// Each strategy defines its own input type.
    type Input;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Components shared by the commands that touch the data directory.
pub struct Runtime {
    pub config: Config,
    pub engine: Arc<ReminderEngine>,
    pub log: Arc<dyn MessageLog>,
    pub broadcast: Arc<dyn Broadcast>,
    pub dispatcher: Dispatcher,
}

impl Runtime {
    pub fn load() -> anyhow::Result<Self> {
        let config = Config::load()?;
        let data_dir = config.storage.data_dir()?;
        info!("Data directory: {}", data_dir.display());

        let ctx = config.scheduler.time_context()?;
        info!("Time zone: {}", ctx.tz);
        let engine = Arc::new(ReminderEngine::new(
            Arc::new(JsonFileReminderRepository::new(&data_dir)),
            ctx,
        ));
        let memory: Arc<dyn MemoryStore> = Arc::new(JsonlMemoryStore::new(&data_dir));
        let log: Arc<dyn MessageLog> = Arc::new(JsonlMessageLog::new(&data_dir));
        let broadcast: Arc<dyn Broadcast> = Arc::new(StdoutBroadcast);

        let deps = DirectiveDeps {
            memory,
            broadcast: Arc::clone(&broadcast),
            reminders: Arc::clone(&engine),
        };
        let dispatcher = Dispatcher::new(Arc::new(default_registry(&deps)));

        Ok(Self {
            config,
            engine,
            log,
            broadcast,
            dispatcher,
        })
    }

    pub fn scheduler(&self) -> anyhow::Result<ReminderScheduler> {
        Ok(ReminderScheduler::new(
            Arc::clone(&self.engine),
            Arc::clone(&self.broadcast),
            self.config.scheduler.tick_period()?,
        ))
    }
}
