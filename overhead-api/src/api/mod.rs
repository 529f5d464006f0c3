//! HTTP API handlers for overhead-api

pub mod health;
pub mod redirect;
pub mod site;
pub mod tracks;

pub use health::health_routes;
pub use redirect::go_to_map;
pub use site::{robots, root};
pub use tracks::{all_tracks, date_index, tracks_for_day};
