use aria_config::Config;

/// Creates the default configuration file at `~/aria/config.json`.
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let path = Config::create_config()?;

        println!("✅ Created config file at: {}", path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Edit the config file and add your API key");
        println!("   2. Set scheduler.timezone to your IANA time zone");
        println!("   3. Run 'aria agent' to start a conversation, 'aria serve' for reminders");
        println!();
        Ok(())
    }
}
