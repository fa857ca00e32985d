use crate::area_of_interest::AreaOfInterest;
use crate::error::LocatorError;
use crate::settings::LocatorSettings;
use crate::stac_operations::{asset_titles, day_start_instant, AssetInfo, Catalog, SearchCriteria};
use crate::warp_command::WarpCommand;
use log::{debug, info, warn};
use std::path::PathBuf;

/// Caller-supplied inputs of one run.
#[derive(Debug, Clone)]
pub struct LocateRequest {
    pub start_date: String,
    pub end_date: String,
    pub aoi_geojson: Option<PathBuf>,
    /// Accepted but not consulted; the command keeps the source CRS.
    pub output_epsg: String,
    pub dstdir: PathBuf,
    /// Accepted but not consulted; nothing is staged on disk.
    pub tmpdir: PathBuf,
    /// Send `end_date` rather than the settings' pinned end instant.
    pub honor_end_date: bool,
}

/// Finds the first scene covering the area of interest and builds the crop
/// command for its configured band. Returns `None` when the catalog has no match.
pub async fn locate_scene(
    catalog: &impl Catalog,
    request: &LocateRequest,
    settings: &LocatorSettings,
) -> Result<Option<WarpCommand>, LocatorError> {
    debug!(
        "output_epsg={} and tmpdir={} are not used",
        request.output_epsg,
        request.tmpdir.display()
    );

    let start = day_start_instant(&request.start_date)?;
    let requested_end = day_start_instant(&request.end_date)?;
    println!("{requested_end}");

    let aoi_path = request
        .aoi_geojson
        .as_ref()
        .ok_or(LocatorError::Input("no area of interest given".to_string()))?;
    let aoi = AreaOfInterest::read(aoi_path)?;

    let end = match (&settings.pinned_end_date, request.honor_end_date) {
        (Some(pinned), false) => {
            if *pinned != requested_end {
                warn!("Searching up to pinned end {pinned} instead of requested {requested_end}");
            }
            pinned.clone()
        }
        _ => requested_end,
    };

    let criteria = SearchCriteria {
        start,
        end,
        geometry: aoi.geometry.clone(),
        collection: settings.collection.clone(),
        limit: settings.max_items,
    };
    let results = catalog.search(&criteria).await?;
    info!("Found {} matching scenes.", results.matched);

    if results.matched == 0 {
        return Ok(None);
    }
    let Some(scene) = results.items.first() else {
        warn!("Catalog reported matches but returned no items");
        return Ok(None);
    };

    let titles = asset_titles(scene);
    info!("ASSETS of the first found scene:");
    info!("{:?}", titles.iter().map(|(k, _)| k).collect::<Vec<_>>());
    for (key, title) in &titles {
        println!("{key}: {}", title.as_deref().unwrap_or(""));
    }

    let asset = AssetInfo::from_item(scene, &settings.asset_key)?;
    info!("url of {}: {}", asset.key, asset.href);

    let bbox = aoi.bounding_box()?;
    info!("bounding box of aoi polygon:");
    info!("{:?}", bbox.to_array());

    let command = WarpCommand::new(&bbox, &asset.href, &request.dstdir, settings);
    Ok(Some(command))
}
