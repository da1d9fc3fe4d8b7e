use super::Runtime;

/// Prints the effective configuration and what the data directory holds.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let runtime = Runtime::load()?;
        let config = &runtime.config;

        println!("=== aria Configuration ===\n");

        println!("Provider:");
        println!("  Base URL: {}", config.providers.openai.base_url);
        println!("  API Key: {}", mask(&config.providers.openai.api_key));
        println!();

        println!("Agent Defaults:");
        println!("  Model: {}", config.agents.defaults.model);
        println!("  Max Tokens: {}", config.agents.defaults.max_tokens);
        println!("  Temperature: {}", config.agents.defaults.temperature);
        if let Some(ref prompt) = config.agents.defaults.system_prompt {
            println!("  System Prompt: {}", truncate(prompt, 60));
        }
        println!();

        println!("Storage:");
        println!("  Data Dir: {}", config.storage.data_dir()?.display());
        println!();

        let scheduler = &config.scheduler;
        println!("Scheduler:");
        println!("  Time Zone: {}", scheduler.timezone);
        println!("  Tick: {}s", scheduler.tick_secs);
        println!("  Tolerance: {}s", scheduler.tolerance_secs);
        println!("  Bias: {}s", scheduler.bias_secs);
        println!("  Max Catch-up: {}s", scheduler.max_catch_up_secs);
        match &scheduler.quiet_hours {
            Some(quiet) => println!("  Quiet Hours: {} - {}", quiet.start, quiet.end),
            None => println!("  Quiet Hours: (none)"),
        }
        println!();

        let reminders = runtime.engine.list().await?;
        let enabled = reminders.iter().filter(|r| r.is_enabled()).count();
        println!("Reminders: {} ({enabled} enabled)", reminders.len());

        let mut names = runtime.dispatcher.registry().names();
        names.sort_unstable();
        println!("Directives: {}", names.join(", "));

        Ok(())
    }
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "***".to_string()
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_hides_middle_of_key() {
        assert_eq!(mask("sk-1234567890abcd"), "sk-1...abcd");
        assert_eq!(mask("short"), "***");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
        assert_eq!(truncate("hi", 8), "hi");
    }
}
