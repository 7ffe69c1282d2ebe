use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};

mod cli;

/// recipebox - recipes, ratings and per-user lists
#[derive(Parser)]
#[command(name = "recipebox")]
#[command(about = "Recipe backend with rating aggregation and recipe assembly", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the services and run until Ctrl+C or SIGTERM
    Serve,
    /// Run database migrations
    Migrate,
    /// Print an assembled recipe as JSON
    Show {
        recipe_id: String,

        /// Personalize the output for this user
        #[arg(long)]
        viewer: Option<String>,
    },
    /// Add, change or remove a user's rating of a recipe
    #[command(group(ArgGroup::new("action").required(true).args(["value", "remove"])))]
    Rate {
        recipe_id: String,

        #[arg(long)]
        user: String,

        #[arg(long)]
        value: Option<f64>,

        #[arg(long)]
        remove: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = recipebox::config::Config::load(cli.config.clone())?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    recipebox::observability::init(&config.observability.log_level, config.observability.json)?;

    match cli.command {
        Commands::Serve => cli::serve::serve(config).await,
        Commands::Migrate => cli::serve::migrate(config).await,
        Commands::Show { recipe_id, viewer } => {
            cli::recipe::show(config, recipe_id, viewer).await
        }
        Commands::Rate {
            recipe_id,
            user,
            value,
            ..
        } => cli::recipe::rate(config, recipe_id, user, value).await,
    }
}
