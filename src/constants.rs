//! Global constants for the fastlabel server

/// Address the server binds to when none is configured
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Port the server listens on when none is configured
pub const DEFAULT_PORT: u16 = 5000;

/// Image file extensions scanned for when none are configured
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &["jpg", "png"];
