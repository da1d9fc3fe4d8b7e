use aria_core::Assistant;
use aria_providers::OpenAiProvider;
use tracing::info;

use super::Runtime;

#[derive(Debug, Clone)]
pub struct AgentInput {
    /// Optional single message to send (non-interactive mode)
    pub message: Option<String>,
    /// Optional model override
    pub model: Option<String>,
}

/// Talks to the model. Interactive sessions also run the reminder scheduler in
/// the background so reminders fire while the user is chatting.
#[derive(Debug, Clone, Copy)]
pub struct AgentStrategy;

impl super::CommandStrategy for AgentStrategy {
    type Input = AgentInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let runtime = Runtime::load()?;
        let defaults = &runtime.config.agents.defaults;
        let openai = &runtime.config.providers.openai;

        let provider = OpenAiProvider::new(openai.api_key.clone())
            .with_base_url(&openai.base_url)
            .with_sampling(defaults.max_tokens, defaults.temperature);

        let mut assistant_config = defaults.assistant_config();
        if let Some(model) = input.model {
            assistant_config.model = model;
        }
        info!("Using model {}", assistant_config.model);

        let assistant = Assistant::new(
            provider,
            runtime.dispatcher.clone(),
            runtime.log.clone(),
            assistant_config,
        );

        match input.message {
            Some(msg) => {
                let reply = assistant.respond("cli", &msg).await?;
                println!("{}", reply.text.trim());
            }
            None => {
                let scheduler = runtime.scheduler()?;
                let background = tokio::spawn(async move {
                    scheduler.run(std::future::pending::<()>()).await;
                });
                let result = assistant.run_interactive().await;
                background.abort();
                result?;
            }
        }

        Ok(())
    }
}
