use clap::Parser;
use recipe_engine::{
    action::register_builtin_actions,
    config::ClientConfig,
    source::{JsonFileContextSource, JsonFileRecipeSource},
    ActionRegistry, Error, RecipeClient, TracingDriver,
};
use std::{path::PathBuf, sync::Arc};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Recipes as a JSON list or a `{"results": [...]}` page
    #[arg(short, long, default_value = "recipes.json")]
    recipes: PathBuf,

    /// Client context as a JSON object
    #[arg(long, default_value = "context.json")]
    context: PathBuf,

    /// Path to config file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Run once, wait for the actions, and exit
    #[arg(long)]
    once: bool,

    /// Enable debug mode
    #[arg(short, long)]
    verbose: bool,
}

async fn run(cli: &Cli) -> Result<(), Error> {
    let config = if cli.config.exists() {
        ClientConfig::from_file(&cli.config)?
    } else {
        ClientConfig::default()
    };
    debug!("config: {:?}", config);

    let registry = ActionRegistry::new();
    register_builtin_actions(&registry);
    info!("Registered actions: {}", registry.names().join(", "));

    let client = RecipeClient::new(
        config,
        registry,
        Arc::new(JsonFileRecipeSource::new(&cli.recipes)),
        Arc::new(JsonFileContextSource::new(&cli.context)),
        Arc::new(TracingDriver::new()),
    );

    if cli.once {
        let outcomes = client.run_once().await?.wait().await;
        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        println!(
            "{} actions ran, {} failed",
            outcomes.len() - failed,
            failed
        );
        return Ok(());
    }

    let (shutdown, signal) = tokio::sync::watch::channel(false);
    let client = Arc::new(client);
    let worker = {
        let client = client.clone();
        tokio::spawn(async move { client.start(signal).await })
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.map_err(|e| Error::internal(format!("Failed to wait for Ctrl+C: {}", e)))?;
            println!("Shutdown signal received.");
            // The worker may already have exited on its run limit.
            let _ = shutdown.send(true);
        }
        _ = shutdown.closed() => {}
    }

    let runs = worker
        .await
        .map_err(|e| Error::internal(format!("Client task failed: {}", e)))?;
    println!("Recipe client finished after {} runs.", runs);
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
