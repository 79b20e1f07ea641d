//! fastlabel - image annotation server
//!
//! Serves a directory of images and their per-image label files to a
//! browser-based labelling client. Labels (points, boxes, ellipses,
//! polygons, composites and groups) are validated, given globally unique
//! ids and saved atomically as JSON next to the images or in a separate
//! labels directory. Optional assisted segmentation turns a few clicked
//! points into polygon regions via a pluggable [`session::Segmenter`].

pub mod config;
pub mod constants;
pub mod data;
pub mod format;
pub mod model;
pub mod reconcile;
pub mod server;
pub mod session;
pub mod store;

pub use config::{ConfigError, LogLevel, ServerConfig};
pub use session::SessionHandler;
pub use store::{LabelStore, StoreOptions};
