use std::io::Read;

use super::Runtime;

#[derive(Debug, Clone)]
pub struct ProcessInput {
    /// Text to scan; stdin when `None`
    pub text: Option<String>,
    pub json: bool,
}

/// Runs the directives found in a text without a model in the loop and prints
/// the cleaned text.
#[derive(Debug, Clone, Copy)]
pub struct ProcessStrategy;

impl super::CommandStrategy for ProcessStrategy {
    type Input = ProcessInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let text = match input.text {
            Some(text) => text,
            None => {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            }
        };

        let runtime = Runtime::load()?;
        let (cleaned, results) = runtime.dispatcher.process(&text).await;

        if input.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "text": cleaned,
                    "results": results,
                }))?
            );
        } else {
            print!("{cleaned}");
            for result in results.iter().filter(|r| !r.is_ok()) {
                eprintln!(
                    "{} {}: {}",
                    result.name,
                    result.status.as_str(),
                    result.error.as_deref().unwrap_or_default()
                );
            }
        }

        // Let spawned deliveries reach stdout before the runtime shuts down.
        tokio::task::yield_now().await;
        Ok(())
    }
}
