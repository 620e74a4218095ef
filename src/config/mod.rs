use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Maximum upload size in bytes (50 MiB)
pub const DEFAULT_MAX_FILE_SIZE: usize = 50 * 1024 * 1024;

/// Configuration for the media ingestion pipeline
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Root read by the public asset endpoint (default: "./uploads")
    pub serving_root: PathBuf,

    /// Root consumed by the site's static bundling (default: "./client/src/assets/uploads")
    pub build_assets_root: PathBuf,

    /// Maximum file size in bytes (default: 50 MiB)
    pub max_file_size: usize,

    /// Bounding box for normalized images (default: 1920x1080)
    pub max_width: u32,
    pub max_height: u32,

    /// JPEG quality for the primary raster path (default: 85)
    pub jpeg_quality: u8,

    /// JPEG quality for HEIC/HEIF conversions and their fallback (default: 80)
    pub heif_quality: u8,

    /// Upper bound on a single image conversion before falling back to passthrough (default: 5s)
    pub conversion_timeout_secs: u64,

    /// ffmpeg binary used to decode HEIC/HEIF (default: "ffmpeg")
    pub ffmpeg_path: PathBuf,

    /// URL prefix under which stored assets are served (default: "/assets")
    pub public_url_prefix: String,

    /// Return detailed storage errors to clients (development only)
    pub expose_error_details: bool,

    /// Allowed CORS Origins (comma separated, "*" for any)
    pub allowed_origins: Vec<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            serving_root: PathBuf::from("./uploads"),
            build_assets_root: PathBuf::from("./client/src/assets/uploads"),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_width: 1920,
            max_height: 1080,
            jpeg_quality: 85,
            heif_quality: 80,
            conversion_timeout_secs: 5,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            public_url_prefix: "/assets".to_string(),
            expose_error_details: false,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl MediaConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            serving_root: env::var("SERVING_ROOT")
                .map(PathBuf::from)
                .unwrap_or(default.serving_root),

            build_assets_root: env::var("BUILD_ASSETS_ROOT")
                .map(PathBuf::from)
                .unwrap_or(default.build_assets_root),

            max_file_size: parse_var("MAX_FILE_SIZE").unwrap_or(default.max_file_size),

            max_width: parse_var("MAX_IMAGE_WIDTH").unwrap_or(default.max_width),

            max_height: parse_var("MAX_IMAGE_HEIGHT").unwrap_or(default.max_height),

            jpeg_quality: parse_var("JPEG_QUALITY")
                .map(clamp_quality)
                .unwrap_or(default.jpeg_quality),

            heif_quality: parse_var("HEIF_QUALITY")
                .map(clamp_quality)
                .unwrap_or(default.heif_quality),

            conversion_timeout_secs: parse_var("CONVERSION_TIMEOUT_SECS")
                .unwrap_or(default.conversion_timeout_secs),

            ffmpeg_path: env::var("FFMPEG_PATH")
                .map(PathBuf::from)
                .unwrap_or(default.ffmpeg_path),

            public_url_prefix: env::var("PUBLIC_URL_PREFIX")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(default.public_url_prefix),

            expose_error_details: env::var("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("development"))
                .unwrap_or(default.expose_error_details),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Create config for development (detailed errors, generous conversion budget)
    pub fn development() -> Self {
        Self {
            conversion_timeout_secs: 30,
            expose_error_details: true,
            ..Self::default()
        }
    }

    pub fn conversion_timeout(&self) -> Duration {
        Duration::from_secs(self.conversion_timeout_secs)
    }

    /// Public URL for a stored filename
    pub fn public_url(&self, filename: &str) -> String {
        format!("{}/{}", self.public_url_prefix, filename)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

fn clamp_quality(q: u8) -> u8 {
    q.clamp(1, 100)
}
