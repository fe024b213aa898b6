use clap::Parser;
use insk_core::{CategoryFilter, Error, Result};
use insk_inference::{create_model, Config, PipelineCache, Secrets};
use insk_ingest::{analyze_insights, search_articles, summary_stats, KeywordView, TableCache, WarningLevel};
use insk_web::{create_app, AppState, ChatBackend};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "AI news dashboard over scored article spreadsheets", long_about = None)]
pub struct Cli {
    /// Spreadsheet to load (CSV or Excel); repeat for several files
    #[arg(long = "file", env = "INSK_FILES", value_delimiter = ',', default_values = ["final_insk03.xlsx", "final_insk02.xlsx"])]
    files: Vec<PathBuf>,
    /// TOML secrets file holding `[google] api_key`
    #[arg(long, env = "INSK_SECRETS", default_value = "secrets.toml")]
    secrets: PathBuf,
    #[arg(long, env = "INSK_MODEL", default_value = "gemini", help = "Model to use for the chatbot. Available models: gemini (default), dummy")]
    model: String,
    /// Seconds before the loaded table is considered stale
    #[arg(long, default_value_t = 3600)]
    cache_ttl: u64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the dashboard API
    Serve {
        #[arg(long, env = "INSK_ADDR", default_value = "127.0.0.1:8501")]
        addr: SocketAddr,
    },
    /// Print the news cards, optionally for one category
    List {
        #[arg(long, default_value = "All")]
        category: String,
    },
    /// Find articles whose title or summary contains the text
    Search {
        query: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the most mentioned keywords
    Keywords {
        #[arg(long)]
        top: Option<usize>,
    },
    /// Print the insight summary and metrics
    Insights,
    /// Ask the news chatbot a single question
    Ask {
        question: String,
    },
}

/// Any secrets or model problem disables the chat instead of aborting.
async fn create_chat_backend(cli: &Cli) -> ChatBackend {
    let model = match Secrets::load(&cli.secrets) {
        Ok(secrets) => {
            let config = Config {
                api_key: secrets.resolve_api_key(),
                model_name: Some(cli.model.clone()),
                ..Config::default()
            };
            create_model(Some(config.clone())).await.map(|model| (model, config))
        }
        Err(e) => Err(e),
    };

    match model {
        Ok((model, config)) => ChatBackend::Ready(PipelineCache::new(model, config)),
        Err(e) => {
            warn!("⚠️ Chatbot disabled: {}", e);
            ChatBackend::Unavailable(e.to_string())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let tables = Arc::new(TableCache::new(cli.files.clone(), Duration::from_secs(cli.cache_ttl)));
    let table = tables.get().await?;
    for warning in &table.warnings {
        let marker = match warning.level {
            WarningLevel::Warning => "⚠️",
            WarningLevel::Error => "❌",
        };
        eprintln!("{} {}: {}", marker, warning.file, warning.message);
    }
    info!("📰 {} articles loaded from {} files", table.len(), cli.files.len());

    match &cli.command {
        Commands::Serve { addr } => {
            let chat = create_chat_backend(&cli).await;
            let app = create_app(AppState::new(tables.clone(), chat));
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!("🌐 Dashboard API listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::List { category } => {
            let filter: CategoryFilter = category.parse()?;
            if table.is_empty() {
                println!("No data could be loaded. Check the spreadsheet file paths.");
                return Ok(());
            }
            let articles = table.filter(filter);
            println!("{} news ({})", articles.len(), filter.label());
            if articles.is_empty() {
                println!("No news in this category.");
            }
            for article in articles {
                println!("[{}] [{}] {}", article.category, article.importance, article.title);
                println!("    {}", article.summary);
                if !article.url.is_empty() {
                    println!("    {}", article.url);
                }
            }
        }
        Commands::Search { query, limit } => {
            let hits = search_articles(&table, query, *limit);
            println!("{} results for \"{}\"", hits.len(), query.trim());
            for article in hits {
                println!("[{}] {}", article.category, article.title);
                println!("    {}", article.summary);
            }
        }
        Commands::Keywords { top } => {
            let view = KeywordView::build(&table, *top);
            println!(
                "{} keywords from {:?} ({} distinct, showing {})",
                view.total_mentions, view.source, view.distinct_keywords, view.top
            );
            if view.keywords.is_empty() {
                println!("No keywords to show.");
            }
            for keyword in &view.keywords {
                println!("{:>4}  {}", keyword.count, keyword.keyword);
            }
        }
        Commands::Insights => {
            let insights = analyze_insights(&table);
            if insights.is_empty() {
                println!("Not enough data to derive insights.");
                return Ok(());
            }
            for insight in insights {
                println!("{}\n    {}", insight.title, insight.content);
            }
            let stats = summary_stats(&table);
            println!(
                "Total news: {}  Categories: {}  High importance: {}",
                stats.total, stats.categories, stats.high_importance
            );
        }
        Commands::Ask { question } => {
            let cache = match create_chat_backend(&cli).await {
                ChatBackend::Ready(cache) => cache,
                ChatBackend::Unavailable(reason) => return Err(Error::Config(reason)),
            };
            let pipeline = cache
                .get_or_build(&table)
                .await?
                .ok_or_else(|| Error::InvalidInput("No articles loaded, nothing to ask about".to_string()))?;
            let answer = pipeline.ask(question).await?;
            println!("{}", answer.answer);
            if !answer.sources.is_empty() {
                println!("\nReferenced news:");
                for source in answer.sources {
                    println!("- {}", source);
                }
            }
        }
    }

    Ok(())
}
