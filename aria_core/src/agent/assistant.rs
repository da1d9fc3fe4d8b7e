//! One assistant turn: ask the model, then act on the directives in its reply.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

use crate::util::DEFAULT_SYSTEM_PROMPT;
use crate::{
    ChatMessage, DirectiveResult, Dispatcher, LLMProvider, LogEntry, MessageLog, Role,
};

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub system_prompt: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 4096,
            temperature: 0.7,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// The reply shown to the user plus the outcome of every directive in it.
#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub results: Vec<DirectiveResult>,
}

pub struct Assistant<P = Arc<dyn LLMProvider>>
where
    P: Send + Sync,
{
    provider: P,
    dispatcher: Dispatcher,
    log: Arc<dyn MessageLog>,
    config: AssistantConfig,
    running: Arc<AtomicBool>,
}

impl<P> Assistant<P>
where
    P: LLMProvider + Send + Sync,
{
    pub fn new(
        provider: P,
        dispatcher: Dispatcher,
        log: Arc<dyn MessageLog>,
        config: AssistantConfig,
    ) -> Self {
        Self {
            provider,
            dispatcher,
            log,
            config,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub async fn run_interactive(&self) -> anyhow::Result<()> {
        println!("aria started. Type 'exit' to quit.\n");

        while self.running.load(Ordering::Relaxed) {
            print!("> ");
            std::io::stdout().flush()?;

            let mut input = String::new();
            if std::io::stdin().read_line(&mut input)? == 0 {
                break;
            }
            let input = input.trim();

            if input == "exit" {
                break;
            }
            if input.is_empty() {
                continue;
            }

            match self.respond("cli", input).await {
                Ok(reply) => println!("\n{}\n", reply.text.trim()),
                Err(e) => eprintln!("Error: {e}"),
            }
        }

        Ok(())
    }

    /// Handle one user message from `source`.
    pub async fn respond(&self, source: &str, content: &str) -> anyhow::Result<Reply> {
        info!("Processing message from {source}");
        self.record(Role::User, content, source).await;

        let messages = vec![
            ChatMessage {
                role: Role::System,
                content: self.build_system_prompt(),
            },
            ChatMessage {
                role: Role::User,
                content: content.to_string(),
            },
        ];

        let response = self.provider.chat(&messages, &self.config.model).await?;
        if let Some(usage) = &response.usage {
            info!(
                "Token usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        let (text, results) = self.dispatcher.process(&response.content).await;
        info!(
            "Reply carried {} directive(s), {} ok",
            results.len(),
            results.iter().filter(|r| r.is_ok()).count()
        );

        self.record(Role::Assistant, &text, source).await;
        Ok(Reply { text, results })
    }

    /// System prompt: the configured persona followed by the directive guide.
    #[must_use]
    pub fn build_system_prompt(&self) -> String {
        format!(
            "{}\n\n{}",
            self.config.system_prompt,
            self.dispatcher.registry().prompt_guide()
        )
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    async fn record(&self, role: Role, text: &str, source: &str) {
        if let Err(e) = self.log.record(LogEntry::now(role, text, source)).await {
            warn!("Failed to record {role:?} message: {e}");
        }
    }
}
