//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use patchget::catalog::DEFAULT_CATALOG_FILE;
use patchget::transport::constants::DEFAULT_PORTAL_URL;

/// Download patch archives from the vendor support portal.
///
/// Run parameters are given as key=value tokens:
///
///   patch=<n>[,<n>...]  platform=<code>[,<code>...]  regexp=<pattern>
///   reset=yes  download=all  stagedir=<dir>  MOSUser=<user>  MOSPass=<pass>
///   silent=yes  debug=yes
#[derive(Parser, Debug)]
#[command(name = "patchget")]
#[command(author, version, about, verbatim_doc_comment)]
pub struct Args {
    /// Run parameters (key=value)
    #[arg(value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Platform cache file
    #[arg(long, default_value = DEFAULT_CATALOG_FILE)]
    pub catalog_file: PathBuf,

    /// Portal base URL
    #[arg(long, default_value = DEFAULT_PORTAL_URL, hide = true)]
    pub portal_url: String,
}

impl Args {
    /// Log filter used when `RUST_LOG` is not set.
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}
