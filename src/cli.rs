//! Command-line interface definitions for the adjustment scraper.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Options that point at the local machine (the Chrome binary) can also be
//! provided via environment variables.

use clap::Parser;

/// Command-line arguments for the adjustment scraper.
///
/// # Examples
///
/// ```sh
/// # Scrape into ./output with built-in defaults
/// hok_patch_scrape
///
/// # Custom output directory and config file
/// hok_patch_scrape -o ./data -c scrape.yaml
///
/// # Point at a specific Chromium binary and watch it work
/// hok_patch_scrape --chrome-path /usr/bin/chromium --headful
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output directory for the scraped JSON document
    #[arg(short, long, default_value = "output")]
    pub output_dir: String,

    /// Optional path to a YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Path to a Chrome or Chromium executable (otherwise auto-detected)
    #[arg(long, env = "CHROME_PATH")]
    pub chrome_path: Option<String>,

    /// Run the browser with a visible window instead of headless
    #[arg(long)]
    pub headful: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["hok_patch_scrape"]);

        assert_eq!(cli.output_dir, "output");
        assert_eq!(cli.config, None);
        assert!(!cli.headful);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["hok_patch_scrape", "-o", "/tmp/out", "-c", "scrape.yaml"]);

        assert_eq!(cli.output_dir, "/tmp/out");
        assert_eq!(cli.config.as_deref(), Some("scrape.yaml"));
    }

    #[test]
    fn test_cli_long_flags() {
        let cli = Cli::parse_from([
            "hok_patch_scrape",
            "--output-dir",
            "./data",
            "--chrome-path",
            "/usr/bin/chromium",
            "--headful",
        ]);

        assert_eq!(cli.output_dir, "./data");
        assert_eq!(cli.chrome_path.as_deref(), Some("/usr/bin/chromium"));
        assert!(cli.headful);
    }
}
