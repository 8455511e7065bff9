//! A3S WebSearch CLI - multi-engine search and deep reading from the command line.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use a3s_websearch::{
    DeepReaderConfig, Engine, EngineRegistry, HtmlRenderer, PageRenderer, Search, SearchOptions,
    DEFAULT_PRIORITY,
};

/// A3S WebSearch - multi-engine web search and content extraction
#[derive(Parser)]
#[command(name = "a3s-websearch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose (debug) logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Render pages in headless Chrome instead of plain HTTP
    #[cfg(feature = "headless")]
    #[arg(long, global = true)]
    headless: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Search one engine, falling back to the others on failure
    Search(SearchArgs),

    /// Search several engines concurrently and extract page content
    Deep(SearchArgs),

    /// Search with content extraction and print one aggregated document
    Summary(SummaryArgs),

    /// Read a page and crawl its most relevant links
    Read(ReadArgs),

    /// Print one page as markdown
    Fetch(FetchArgs),

    /// Capture a page as an image in headless Chrome
    #[cfg(feature = "headless")]
    Screenshot(ScreenshotArgs),

    /// List available search engines
    Engines,
}

#[derive(Parser)]
struct SearchArgs {
    /// Search query
    query: String,

    /// Engines to use, in order (comma-separated names or shortcuts)
    #[arg(short, long, value_delimiter = ',')]
    engines: Vec<String>,

    /// Maximum number of results
    #[arg(short, long, default_value = "10")]
    limit: usize,

    /// Overall timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Extract page content for each result (always on for `deep`)
    #[arg(short, long)]
    content: bool,
}

impl SearchArgs {
    fn options(&self) -> SearchOptions {
        let mut options = SearchOptions::new()
            .with_max_results(self.limit)
            .with_engines(self.engines.iter().cloned())
            .with_content(self.content);
        if let Some(secs) = self.timeout {
            options = options.with_timeout(Duration::from_secs(secs));
        }
        options
    }
}

#[derive(Parser)]
struct SummaryArgs {
    /// Search query
    query: String,

    /// Maximum number of results
    #[arg(short, long, default_value = "5")]
    limit: usize,
}

#[derive(Parser)]
struct ReadArgs {
    /// Seed page URL
    url: String,

    /// Maximum number of links to crawl (1-20)
    #[arg(short, long, default_value = "10")]
    max_links: usize,

    /// Also follow links to other domains
    #[arg(long)]
    any_domain: bool,
}

#[derive(Parser)]
struct FetchArgs {
    /// Page URL
    url: String,
}

#[cfg(feature = "headless")]
#[derive(Parser)]
struct ScreenshotArgs {
    /// Page URL
    url: String,

    /// Output file
    #[arg(short, long)]
    output: std::path::PathBuf,

    /// Capture the whole scrollable page (JPEG) instead of the viewport (PNG)
    #[arg(long)]
    full_page: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Markdown text output
    Text,
    /// JSON output
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Engines = cli.command {
        list_engines();
        return Ok(());
    }

    let search = Search::new(EngineRegistry::with_defaults(), renderer(&cli)?);
    match cli.command {
        Commands::Search(args) => run_search(&search, args, cli.format, false).await,
        Commands::Deep(args) => run_search(&search, args, cli.format, true).await,
        Commands::Summary(args) => run_summary(&search, args, cli.format).await,
        Commands::Read(args) => run_read(search, args, cli.format).await,
        Commands::Fetch(args) => run_fetch(&search, args).await,
        Commands::Engines => Ok(()),
        #[cfg(feature = "headless")]
        Commands::Screenshot(args) => run_screenshot(&args, cli.format).await,
    }
}

#[cfg(feature = "headless")]
fn renderer(cli: &Cli) -> Result<Arc<dyn PageRenderer>> {
    use a3s_websearch::browser::{BrowserFetcher, BrowserPool, BrowserPoolConfig};

    if cli.headless {
        let pool = Arc::new(BrowserPool::new(BrowserPoolConfig::default()));
        let fetcher = BrowserFetcher::new(pool);
        return Ok(Arc::new(HtmlRenderer::new(Arc::new(fetcher))));
    }
    Ok(Arc::new(HtmlRenderer::http()?))
}

#[cfg(not(feature = "headless"))]
fn renderer(_cli: &Cli) -> Result<Arc<dyn PageRenderer>> {
    Ok(Arc::new(HtmlRenderer::http()?))
}

#[cfg(feature = "headless")]
async fn run_screenshot(args: &ScreenshotArgs, format: OutputFormat) -> Result<()> {
    use a3s_websearch::browser::{BrowserFetcher, BrowserPool, BrowserPoolConfig};

    let pool = Arc::new(BrowserPool::new(BrowserPoolConfig::default()));
    let image = BrowserFetcher::new(Arc::clone(&pool))
        .screenshot(&args.url, args.full_page)
        .await?;
    pool.shutdown().await;

    tokio::fs::write(&args.output, &image).await?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "url": args.url,
                "path": args.output,
                "bytes": image.len(),
            })
        ),
        OutputFormat::Text => println!(
            "Captured {} ({} bytes) to {}",
            args.url,
            image.len(),
            args.output.display()
        ),
    }
    Ok(())
}

fn list_engines() {
    let registry = EngineRegistry::with_defaults();
    println!("Available search engines (fallback order):\n");
    for name in DEFAULT_PRIORITY {
        if let Some(engine) = registry.get(name) {
            println!("  {:<12} {}", engine.name(), engine.shortcut());
        }
    }
    println!();
    println!("Usage: a3s-websearch deep \"query\" -e ddg,bing");
}

async fn run_search(search: &Search, args: SearchArgs, format: OutputFormat, deep: bool) -> Result<()> {
    let results = if deep {
        search.deep_search(&args.query, &args.options().with_content(true)).await?
    } else {
        search.search(&args.query, &args.options()).await?
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Text => {
            let aggregator = search.aggregator();
            if deep || args.content {
                print!("{}", aggregator.format_with_content(&results));
            } else {
                print!("{}", aggregator.format_basic(&results));
            }
        }
    }
    Ok(())
}

async fn run_summary(search: &Search, args: SummaryArgs, format: OutputFormat) -> Result<()> {
    let document = search.search_and_aggregate(&args.query, args.limit).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "query": args.query, "document": document })),
        OutputFormat::Text => print!("{}", document),
    }
    Ok(())
}

async fn run_read(search: Search, args: ReadArgs, format: OutputFormat) -> Result<()> {
    let config = DeepReaderConfig::default()
        .with_max_links(args.max_links)
        .with_same_domain(!args.any_domain);
    let search = search.with_reader_config(config);

    let result = search.deep_read(&args.url).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print!("{}", search.aggregator().format_deep_read(&result)),
    }
    Ok(())
}

async fn run_fetch(search: &Search, args: FetchArgs) -> Result<()> {
    println!("{}", search.fetch_page(&args.url).await?);
    Ok(())
}
