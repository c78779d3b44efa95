use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use harmonix::{
    build_recommender, enrich, lookup_producer, CatalogSource, JsonFileCatalog, KeywordTranslator,
    RecommendQuery, Recommendation, Recommender, RecommenderConfig, ServiceStatus,
};

#[derive(Parser, Debug)]
#[command(name = "harmonix", version, about = "Music producer recommendations")]
struct CliArgs {
    /// YAML configuration file. Defaults apply when omitted.
    #[arg(long, env = "HARMONIX_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train on a catalog file and persist the model.
    Train {
        #[arg(long)]
        catalog: PathBuf,
    },
    /// Recommend producers for explicit tags.
    Recommend {
        #[arg(long = "genre")]
        genres: Vec<String>,
        #[arg(long = "skill")]
        skills: Vec<String>,
        #[arg(long = "tool")]
        tools: Vec<String>,
        #[arg(long)]
        experience: Option<String>,
        #[arg(long)]
        top_n: Option<usize>,
        /// Join results with full catalog records.
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Recommend producers for a free-text request.
    Query {
        text: String,
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Print the tag vocabulary of the current model.
    Vocab,
    /// Show a catalog producer, looked up by id or else by name.
    Producer {
        key: String,
        #[arg(long)]
        catalog: PathBuf,
    },
    /// Report whether a model is loaded and when the next retrain is due.
    Status,
    /// Retrain monthly until interrupted.
    Schedule {
        #[arg(long)]
        catalog: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    let config = match &cli_args.config {
        Some(path) => RecommenderConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => RecommenderConfig::default(),
    };
    harmonix::telemetry::init_tracing(&config.logging.level, config.logging.json)?;

    let engine = build_recommender(&config).context("opening the recommender")?;

    match cli_args.command {
        Command::Train { catalog } => {
            let source = JsonFileCatalog::new(catalog);
            let outcome = engine.train_from(&source)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Recommend {
            genres,
            skills,
            tools,
            experience,
            top_n,
            catalog,
        } => {
            let query = RecommendQuery {
                genres,
                skills,
                tools,
                experience,
                top_n,
            };
            let hits = engine.recommend(&query)?;
            print_hits(&hits, catalog, "").await?;
        }
        Command::Query { text, catalog } => {
            let hits = engine.recommend_text(&text, &KeywordTranslator).await?;
            print_hits(&hits, catalog, &text).await?;
        }
        Command::Vocab => match engine.vocabulary() {
            Some(vocabulary) => println!("{}", serde_json::to_string_pretty(&vocabulary)?),
            None => bail!("no model loaded; run `harmonix train` first"),
        },
        Command::Producer { key, catalog } => {
            let source = JsonFileCatalog::new(catalog);
            match lookup_producer(&source, &key)? {
                Some(profile) => println!("{}", serde_json::to_string_pretty(&profile)?),
                None => bail!("no producer with id or name {key:?}"),
            }
        }
        Command::Status => {
            let schedule = config.retrain_schedule();
            let status = ServiceStatus::collect(&engine, schedule.as_ref(), chrono::Utc::now());
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::Schedule { catalog } => {
            let Some(schedule) = config.retrain_schedule() else {
                bail!("schedule is disabled in the configuration");
            };
            let engine: Arc<Recommender> = Arc::new(engine);
            let source: Arc<dyn CatalogSource> = Arc::new(JsonFileCatalog::new(catalog));
            schedule.run(engine, source, shutdown_signal()).await;
        }
    }
    Ok(())
}

async fn print_hits(hits: &[Recommendation], catalog: Option<PathBuf>, query_text: &str) -> Result<()> {
    match catalog {
        Some(path) => {
            let source = JsonFileCatalog::new(path);
            let enriched = enrich(hits, &source, None, query_text).await;
            println!("{}", serde_json::to_string_pretty(&enriched)?);
        }
        None => println!("{}", serde_json::to_string_pretty(hits)?),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "ctrl_c_handler_failure");
        std::future::pending::<()>().await;
    }
    tracing::info!("received Ctrl+C, shutting down");
}
