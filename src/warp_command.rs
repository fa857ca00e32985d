use crate::area_of_interest::BoundingBox;
use crate::settings::LocatorSettings;
use std::fmt;
use std::path::Path;

const PROGRAM: &str = "gdalwarp";
/// GDAL virtual filesystem prefix for reading remote files by HTTP range requests.
pub const VSICURL_PREFIX: &str = "/vsicurl/";

/// A `gdalwarp` invocation cropping a remote raster to a bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpCommand {
    tokens: Vec<String>,
}

impl WarpCommand {
    pub fn new(bbox: &BoundingBox, href: &str, dstdir: &Path, settings: &LocatorSettings) -> Self {
        let mut tokens = vec![PROGRAM.to_string(), "-te".to_string()];
        tokens.extend(bbox.to_array().iter().map(|v| format_extent(*v)));
        tokens.extend([
            "-te_srs".to_string(),
            settings.extents_srs.clone(),
            "-tr".to_string(),
            settings.target_resolution[0].to_string(),
            settings.target_resolution[1].to_string(),
            format!("{VSICURL_PREFIX}{href}"),
            dstdir.join(&settings.output_filename).display().to_string(),
        ]);
        Self { tokens }
    }

    pub fn tokens(self: &Self) -> &[String] {
        &self.tokens
    }

    /// The tokens following `flag`, up to the next flag or the positional arguments.
    pub fn option(self: &Self, flag: &str) -> Option<&[String]> {
        let start = self.tokens.iter().position(|t| t == flag)?;
        let len = match flag {
            "-te" => 5,
            "-tr" => 3,
            _ => 2,
        };
        self.tokens.get(start..start + len)
    }

    pub fn source(self: &Self) -> &str {
        &self.tokens[self.tokens.len() - 2]
    }

    pub fn destination(self: &Self) -> &str {
        &self.tokens[self.tokens.len() - 1]
    }
}

impl fmt::Display for WarpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tokens.join(" "))
    }
}

// Debug formatting keeps the fractional part of whole numbers ("10.0", not "10").
fn format_extent(value: f64) -> String {
    format!("{value:?}")
}
