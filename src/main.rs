use anyhow::Result;
use clap::Parser;
use log::{error, info};
use scene_locator::stac_operations::StacApi;
use scene_locator::{locate_scene, LocateRequest, LocatorSettings};
use std::path::PathBuf;
use std::time::Instant;

/// Finds a Sentinel-2 scene covering an area of interest and prints the gdalwarp
/// command that crops its red band to the area.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Start date in yyyy-mm-dd format
    #[arg(long = "startdate")]
    start_date: String,

    /// End date in yyyy-mm-dd format
    #[arg(long = "enddate")]
    end_date: String,

    /// GeoJSON FeatureCollection of the area of interest; only the first feature is used
    #[arg(long = "aoi_geojson")]
    aoi_geojson: Option<PathBuf>,

    /// EPSG code of output subsets, e.g. EPSG:32633 (currently unused)
    #[arg(long = "output_epsg")]
    output_epsg: String,

    /// Destination directory to save outputs
    #[arg(long = "dstdir")]
    dstdir: PathBuf,

    /// Directory for intermediate files (currently unused)
    #[arg(long = "tmpdir")]
    tmpdir: PathBuf,

    /// TOML file overriding the catalog and command settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Search up to --enddate instead of the pinned end date
    #[arg(long = "honor_enddate")]
    honor_end_date: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let started = Instant::now();

    let cli = Cli::parse();
    let outcome = run(cli).await;
    if let Err(e) = &outcome {
        error!("{e:#}");
    }
    info!("Finished in {:.2?}", started.elapsed());
    outcome
}

async fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.config {
        Some(path) => LocatorSettings::read(path)?,
        None => LocatorSettings::default(),
    };
    let catalog = StacApi::from_settings(&settings)?;

    let request = LocateRequest {
        start_date: cli.start_date,
        end_date: cli.end_date,
        aoi_geojson: cli.aoi_geojson,
        output_epsg: cli.output_epsg,
        dstdir: cli.dstdir,
        tmpdir: cli.tmpdir,
        honor_end_date: cli.honor_end_date,
    };

    if let Some(command) = locate_scene(&catalog, &request, &settings).await? {
        println!("{command}");
    }
    Ok(())
}
