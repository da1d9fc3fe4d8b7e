#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;

use clap::{Parser, Subcommand};
use command::{
    AgentInput, AgentStrategy, CommandStrategy, InfoStrategy, InitStrategy, ProcessInput,
    ProcessStrategy, ServeStrategy, TickStrategy, VersionStrategy,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "aria")]
#[command(about = "aria personal assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the assistant interactively
    Agent {
        /// Single message to send
        #[arg(short = 'm', long)]
        message: Option<String>,

        /// Model to use
        #[arg(short = 'M', long)]
        model: Option<String>,
    },
    /// Run the directives in a text without calling a model
    Process {
        /// Text to process; read from stdin when omitted
        #[arg(short, long)]
        text: Option<String>,

        /// Print directive results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run one due-reminder search and deliver what is due
    Tick,
    /// Run the reminder scheduler until Ctrl+C
    Serve,
    /// Show configuration
    Info,
    /// Initialize configuration
    Init,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Agent { message, model } => {
            AgentStrategy
                .execute(AgentInput { message, model })
                .await
        }
        Commands::Process { text, json } => {
            ProcessStrategy
                .execute(ProcessInput { text, json })
                .await
        }
        Commands::Tick => TickStrategy.execute(()).await,
        Commands::Serve => ServeStrategy.execute(()).await,
        Commands::Info => InfoStrategy.execute(()).await,
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Version => VersionStrategy.execute(()).await,
    }
}
