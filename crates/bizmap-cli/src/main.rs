mod commands;
mod render;

use bizmap_core::Coordinates;
use bizmap_view::{ColumnKey, SortDescriptor, ViewMode};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "bizmap-cli")]
#[command(about = "Browse, filter and select registered businesses by city")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the cities the directory knows about
    Cities,
    /// Show the filtered records as a table, a map feed, or both
    Browse(BrowseArgs),
    /// Change which records are selected
    Select {
        /// City to load (defaults to the city of the saved session)
        #[arg(long)]
        city: Option<String>,
        #[command(flatten)]
        action: SelectAction,
    },
    /// Show industry codes present in the city with record counts
    Facets {
        /// City to load (defaults to the city of the saved session)
        #[arg(long)]
        city: Option<String>,
    },
}

#[derive(Debug, Args)]
struct BrowseArgs {
    /// City to load (defaults to the city of the saved session)
    #[arg(long)]
    city: Option<String>,
    /// Case-insensitive name search; pass an empty string to clear it
    #[arg(long)]
    search: Option<String>,
    /// Industry code to filter by; repeat for several, replaces the saved set
    #[arg(long = "industry")]
    industries: Vec<String>,
    /// Your location as LAT,LON
    #[arg(long, value_parser = parse_location, allow_hyphen_values = true)]
    near: Option<Coordinates>,
    /// Maximum distance from --near in kilometres
    #[arg(long)]
    radius: Option<f64>,
    /// Forget the saved location and distance limit
    #[arg(long, conflicts_with_all = ["near", "radius"])]
    clear_location: bool,
    /// Reset search, industries and distance (sort is kept)
    #[arg(long)]
    reset: bool,
    /// Sort as FIELD or FIELD:asc|desc, e.g. registeredAt:desc
    #[arg(long, value_parser = SortDescriptor::parse)]
    sort: Option<SortDescriptor>,
    /// 1-based page number; out-of-range values are clamped
    #[arg(long, conflicts_with_all = ["next", "prev"])]
    page: Option<usize>,
    /// Go to the next page
    #[arg(long, conflicts_with = "prev")]
    next: bool,
    /// Go to the previous page
    #[arg(long)]
    prev: bool,
    /// Rows per page
    #[arg(long)]
    page_size: Option<usize>,
    /// table, map or split
    #[arg(long)]
    view: Option<ViewMode>,
    /// Show or hide a table column; repeatable
    #[arg(long = "toggle-column")]
    toggle_columns: Vec<ColumnKey>,
    /// Restore the default column set
    #[arg(long)]
    reset_columns: bool,
    /// List every column and whether it is visible
    #[arg(long)]
    columns: bool,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct SelectAction {
    /// Flip the selection of one business id
    #[arg(long)]
    toggle: Option<String>,
    /// Select every record matching the current filters, including future matches
    #[arg(long)]
    all: bool,
    /// Add the records on the current page to the selection
    #[arg(long)]
    page: bool,
    /// Deselect everything
    #[arg(long)]
    clear: bool,
}

fn parse_location(raw: &str) -> Result<Coordinates, String> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got '{raw}'"))?;
    Coordinates::parse_pair(lat, lon).ok_or_else(|| format!("invalid coordinates '{raw}'"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = bizmap_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(env = %config.env, session = %config.session_path.display(), "starting");

    match cli.command {
        Commands::Cities => commands::run_cities(&config).await,
        Commands::Browse(args) => commands::run_browse(&config, &args).await,
        Commands::Select { city, action } => {
            commands::run_select(&config, city.as_deref(), &action).await
        }
        Commands::Facets { city } => commands::run_facets(&config, city.as_deref()).await,
    }
}
