use clap::{Parser, Subcommand, builder::styling};
use eyre::Result;
use owo_colors::OwoColorize;
use trip_loader::cli::{self, TripsOptions};
use trip_loader::client::{Dataset, ZONE_LOOKUP_URL};
use trip_loader::db::ConnectionOpts;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// Trip Loader: --{tripload}-> hauls NYC TLC trip records into PostgreSQL
#[derive(Parser)]
#[command(name = "tripload", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source connection settings from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging and retention of downloaded files
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a month of trip records into the database
    Trips {
        #[command(flatten)]
        db: ConnectionOpts,

        /// Trip-record dataset to ingest
        #[arg(short, long, value_enum, default_value_t = Dataset::Yellow)]
        dataset: Dataset,

        /// Year of the data
        #[arg(short, long, default_value_t = 2025)]
        year: u16,

        /// Month of the data
        #[arg(short, long, default_value_t = 11)]
        month: u8,

        /// Target table name (defaults to <dataset>_taxi_data)
        #[arg(short, long)]
        target_table: Option<String>,

        /// Rows per insert batch
        #[arg(long, default_value_t = 100_000)]
        chunk_size: usize,

        /// Load the whole file as a single batch instead of chunking
        #[arg(long)]
        whole_file: bool,

        /// Keep the download in memory instead of staging it to disk
        #[arg(long)]
        in_memory: bool,

        /// Print the load report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Refresh the taxi zone lookup table
    Zones {
        #[command(flatten)]
        db: ConnectionOpts,

        /// Source URL for the zone lookup CSV
        #[arg(long, default_value = ZONE_LOOKUP_URL)]
        url: String,

        /// Target table name
        #[arg(short, long, default_value = "zones")]
        target_table: String,

        /// Print the load report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Test the database connection
    Ping {
        #[command(flatten)]
        db: ConnectionOpts,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::from_filename(&cli.env).ok();

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    match cli.command {
        Commands::Trips {
            db,
            dataset,
            year,
            month,
            target_table,
            chunk_size,
            whole_file,
            in_memory,
            json,
        } => {
            let table = target_table.unwrap_or_else(|| dataset.default_table().to_string());
            log::info!(
                "Ingesting {} {}-{:02} into {}",
                dataset.cyan(),
                year,
                month,
                table.bright_black()
            );
            let options = TripsOptions {
                chunk_size,
                whole_file,
                in_memory,
                keep_download: cli.debug,
            };
            let report = cli::ingest_trips(&db, dataset, year, month, &table, &options).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Commands::Zones {
            db,
            url,
            target_table,
            json,
        } => {
            log::info!("Refreshing zone lookup table {}", target_table.bright_black());
            let report = cli::ingest_zones(&db, &url, &target_table).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Commands::Ping { db } => {
            cli::ping(&db).await?;
        }
    }

    Ok(())
}
