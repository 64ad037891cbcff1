//! Heat pump dashboard CLI.
//!
//! Set `RUST_LOG=info` (or debug) to see cache and request activity.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use heatpump::{
    build_catalog_file, ArchiveClient, CityCatalog, Dashboard, LatLon, RollingWindow,
    TemperatureUnit,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "heatpump",
    version,
    about = "Daily heat pump efficiency counter for US cities"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the city catalog from a raw US city list
    BuildCatalog {
        /// Raw city CSV with city, state_name, population, lat and lng columns
        #[arg(short, long, default_value = "data-raw/uscities.csv")]
        input: PathBuf,

        /// Where to write the catalog
        #[arg(short, long, default_value = "data/cities.csv")]
        output: PathBuf,
    },

    /// List catalogued cities
    Cities {
        #[arg(short, long, default_value = "data/cities.csv")]
        catalog: PathBuf,

        /// Only show cities whose name contains this text (case insensitive)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Find catalogued cities near a coordinate
    Nearest {
        #[arg(short, long, default_value = "data/cities.csv")]
        catalog: PathBuf,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        #[arg(long, default_value_t = 5)]
        limit: usize,

        #[arg(long, default_value_t = 50.0)]
        max_distance_km: f64,
    },

    /// Fetch a city's daily minimum temperatures and print the cold-day table
    Report {
        #[arg(short, long, default_value = "data/cities.csv")]
        catalog: PathBuf,

        /// Catalog key, e.g. "Champaign, Illinois"
        #[arg(long, default_value = "Champaign, Illinois")]
        city: String,

        #[arg(long, default_value = "2020-01-01")]
        start: NaiveDate,

        #[arg(long, default_value = "2024-01-01")]
        end: NaiveDate,

        /// fahrenheit or celsius
        #[arg(long, default_value = "fahrenheit")]
        unit: TemperatureUnit,

        /// Plot threshold; defaults to 5 °F / -15 °C
        #[arg(long, allow_hyphen_values = true)]
        threshold: Option<f64>,

        /// Add the 7-day rolling average
        #[arg(long)]
        weekly: bool,

        /// Add the 30-day rolling average
        #[arg(long)]
        monthly: bool,

        /// Lowest table temperature; defaults to 0 °F / -20 °C
        #[arg(long, allow_hyphen_values = true)]
        table_low: Option<i32>,

        /// Highest table temperature; defaults to 15 °F / -10 °C
        #[arg(long, allow_hyphen_values = true)]
        table_high: Option<i32>,

        /// Number of most recent days to print
        #[arg(long, default_value_t = 10)]
        days: usize,

        /// Always query the archive instead of the response cache
        #[arg(long)]
        no_cache: bool,

        /// Response cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::BuildCatalog { input, output } => {
            let records = build_catalog_file(&input, &output)
                .with_context(|| format!("failed to build catalog from {}", input.display()))?;
            println!("Wrote {} cities to {}", records.len(), output.display());
        }
        Command::Cities { catalog, filter } => {
            let catalog = load_catalog(&catalog)?;
            let needle = filter.map(|f| f.to_lowercase());
            for name in catalog.names() {
                if needle
                    .as_deref()
                    .map_or(true, |n| name.to_lowercase().contains(n))
                {
                    println!("{}", name);
                }
            }
        }
        Command::Nearest {
            catalog,
            lat,
            lng,
            limit,
            max_distance_km,
        } => {
            let catalog = load_catalog(&catalog)?;
            let found = catalog.nearest(LatLon(lat, lng), limit, max_distance_km);
            if found.is_empty() {
                println!("No cities within {} km", max_distance_km);
            }
            for (city, distance_km) in found {
                println!(
                    "{:>8.1} km  {} ({}, {})",
                    distance_km, city.city_state, city.lat, city.lng
                );
            }
        }
        Command::Report {
            catalog,
            city,
            start,
            end,
            unit,
            threshold,
            weekly,
            monthly,
            table_low,
            table_high,
            days,
            no_cache,
            cache_dir,
        } => {
            let client = ArchiveClient::builder()
                .use_cache(!no_cache)
                .maybe_cache_folder(cache_dir)
                .build()
                .context("failed to create archive client")?;
            let dashboard = Dashboard::new(load_catalog(&catalog)?, client);

            let mut rolling_windows = Vec::new();
            if weekly {
                rolling_windows.push(RollingWindow::Weekly);
            }
            if monthly {
                rolling_windows.push(RollingWindow::Monthly);
            }

            let view = dashboard
                .view()
                .city_state(city.as_str())
                .start_date(start)
                .end_date(end)
                .unit(unit)
                .maybe_threshold(threshold)
                .rolling_windows(rolling_windows)
                .maybe_table_low(table_low)
                .maybe_table_high(table_high)
                .call()
                .await
                .with_context(|| format!("failed to build report for {}", city))?;

            let above = view
                .annotated
                .points
                .iter()
                .filter(|p| p.above_threshold)
                .count();
            println!("{}  ({})", view.city.city_state, view.coordinates_label());
            println!(
                "{} days, {} above {} {}",
                view.annotated.len(),
                above,
                view.annotated.threshold,
                unit.symbol()
            );
            println!("{}", view.series_frame()?.tail(Some(days)));
            println!("{}", view.table_frame()?);
        }
    }

    Ok(())
}

fn load_catalog(path: &Path) -> anyhow::Result<CityCatalog> {
    CityCatalog::load(path).with_context(|| format!("failed to load catalog {}", path.display()))
}
