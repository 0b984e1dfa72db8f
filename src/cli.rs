//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use gopro_sync::DEFAULT_MAX_RETRIES;
use gopro_sync::api::{DEFAULT_API_BASE, DEFAULT_PAGE_SIZE};

/// Mirror your GoPro cloud media library into a local folder.
///
/// Already-synced files (same name and size) are skipped, so the command can
/// be re-run at any time to pick up new captures.
#[derive(Parser, Debug)]
#[command(name = "gopro-sync")]
#[command(author, version, about)]
pub struct Args {
    /// Target folder for downloaded media (defaults to the current directory)
    #[arg(short, long, value_name = "DIR")]
    pub folder: Option<PathBuf>,

    /// Auth token (falls back to GO_PRO_AUTH_TOKEN, then the OS keyring)
    #[arg(short, long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Store the --token value in the OS keyring for later runs
    #[arg(long, requires = "token")]
    pub save_token: bool,

    /// Stop listing the catalog after this many pages
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_pages: Option<u32>,

    /// Items requested per catalog page (1-100)
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub page_size: u32,

    /// Attempts against the archive endpoint per item (1-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_RETRIES as u8, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub retries: u8,

    /// Keep .360 containers as downloaded instead of extracting the inner media file
    #[arg(long)]
    pub no_unwrap: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// API host override
    #[arg(long, hide = true, default_value = DEFAULT_API_BASE)]
    pub api_base: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["gopro-sync"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(args.folder.is_none());
        assert!(args.token.is_none());
        assert!(args.max_pages.is_none());
        assert_eq!(args.page_size, 30);
        assert_eq!(args.retries, 3);
        assert!(!args.no_unwrap);
        assert_eq!(args.api_base, "https://api.gopro.com");
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["gopro-sync", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["gopro-sync", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["gopro-sync", "--quiet"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["gopro-sync", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_help_hides_api_base() {
        let err = Args::try_parse_from(["gopro-sync", "--help"]).unwrap_err();
        assert!(!err.to_string().contains("--api-base"));
    }

    #[test]
    fn test_cli_folder_and_token() {
        let args =
            Args::try_parse_from(["gopro-sync", "-f", "/media/gopro", "-t", "abc"]).unwrap();
        assert_eq!(args.folder, Some(PathBuf::from("/media/gopro")));
        assert_eq!(args.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_cli_save_token_requires_token() {
        let err = Args::try_parse_from(["gopro-sync", "--save-token"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let args = Args::try_parse_from(["gopro-sync", "--save-token", "-t", "abc"]).unwrap();
        assert!(args.save_token);
    }

    #[test]
    fn test_cli_max_pages_zero_rejected() {
        let err = Args::try_parse_from(["gopro-sync", "--max-pages", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);

        let args = Args::try_parse_from(["gopro-sync", "--max-pages", "2"]).unwrap();
        assert_eq!(args.max_pages, Some(2));
    }

    #[test]
    fn test_cli_page_size_bounds() {
        assert!(Args::try_parse_from(["gopro-sync", "--page-size", "0"]).is_err());
        assert!(Args::try_parse_from(["gopro-sync", "--page-size", "101"]).is_err());
        let args = Args::try_parse_from(["gopro-sync", "--page-size", "100"]).unwrap();
        assert_eq!(args.page_size, 100);
    }

    #[test]
    fn test_cli_retries_bounds() {
        let err = Args::try_parse_from(["gopro-sync", "-r", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert!(Args::try_parse_from(["gopro-sync", "--retries", "11"]).is_err());
        let args = Args::try_parse_from(["gopro-sync", "--retries", "5"]).unwrap();
        assert_eq!(args.retries, 5);
    }

    #[test]
    fn test_cli_no_unwrap_flag() {
        let args = Args::try_parse_from(["gopro-sync", "--no-unwrap"]).unwrap();
        assert!(args.no_unwrap);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["gopro-sync", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
