#![allow(async_fn_in_trait)]
pub mod area_of_interest;
pub mod error;
pub mod locator;
pub mod settings;
pub mod stac_operations;
pub mod warp_command;

pub use error::LocatorError;
pub use locator::{locate_scene, LocateRequest};
pub use settings::LocatorSettings;
