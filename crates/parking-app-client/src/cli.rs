use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[arg(
        short = 's',
        long = "stdout",
        action,
        help = "Controls if it logs to stdout/stderr instead of to a file"
    )]
    pub is_to_std_out: bool,

    #[arg(long, default_value = "traces", help = "Folder log files are written to")]
    pub log_folder: PathBuf,

    #[arg(long, help = "Base address of the REST API, overrides the configuration")]
    pub server_address: Option<String>,

    #[arg(
        long,
        default_value = "configuration/client.toml",
        help = "Optional settings file"
    )]
    pub config_file: PathBuf,

    #[arg(
        long,
        help = "Page to open on start, e.g. a link received by email such as /activate-account/<token>"
    )]
    pub route: Option<String>,
}
