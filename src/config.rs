// Application configuration, loaded from environment variables and CLI flags.

use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database URL (SQLite connection string).
    pub database_url: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Password required by admin endpoints (x-admin-password header).
    pub admin_password: String,
    /// Base URL of the uwu-logs site to scrape reports from.
    pub uwu_base_url: String,
    /// Per-request timeout for report page fetches, in seconds.
    pub fetch_timeout_secs: u64,
    /// Directory containing pre-built frontend files to serve.
    /// When set, the backend serves static files from this path.
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables and CLI arguments.
    ///
    /// Environment variables:
    /// - `DATABASE_URL` - SQLite connection string (default: `sqlite:titan.db?mode=rwc`)
    /// - `PORT` - HTTP server port (default: 3000)
    /// - `ADMIN_PASSWORD` - Admin password (default: `titan2026`)
    /// - `UWU_BASE_URL` - Log site base URL (default: `https://uwu-logs.xyz`)
    /// - `FETCH_TIMEOUT_SECS` - Log fetch timeout (default: 15)
    /// - `STATIC_DIR` - Path to frontend dist directory for static file serving
    ///
    /// CLI flags:
    /// - `--port <PORT>` - Override the port
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().collect();

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:titan.db?mode=rwc".to_string());

        // Port: CLI flag --port takes precedence, then env var, then default
        let port = Self::parse_cli_value(&args, "--port")
            .and_then(|v| v.parse().ok())
            .or_else(|| std::env::var("PORT").ok().and_then(|v| v.parse().ok()))
            .unwrap_or(3000);

        let admin_password =
            std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "titan2026".to_string());

        let uwu_base_url =
            std::env::var("UWU_BASE_URL").unwrap_or_else(|_| "https://uwu-logs.xyz".to_string());

        let fetch_timeout_secs = std::env::var("FETCH_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(15);

        let static_dir = std::env::var("STATIC_DIR").ok().map(PathBuf::from);

        Config {
            database_url,
            port,
            admin_password,
            uwu_base_url,
            fetch_timeout_secs,
            static_dir,
        }
    }

    /// Parse a CLI flag value like `--port 8080`.
    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }
}
