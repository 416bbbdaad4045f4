use std::path::PathBuf;


/// Load generator that races simulated users for a small pool of seats, to
/// check that a booking service never double-books under contention.
#[derive(clap::Parser)]
#[command(version, about)]
pub struct Cli {
    #[clap(subcommand)]
    pub cmd: Command,

    /// Specifies config file location. Default locations are: 'seatrush.toml'
    /// and '/etc/seatrush/config.toml'. Can also be set via env
    /// `SEATRUSH_CONFIG_PATH`. If no file exists, defaults are used.
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Runs the load test against the configured target.
    Run,

    /// Checks the config and prints the resolved endpoints and ramp
    /// schedule. Does not send any requests.
    Check,

    /// Outputs a template of the configuration, including all config options
    /// with descriptions, great as a starting point.
    GenConfigTemplate {
        /// File to write it to. If unspecified, written to stdout.
        #[clap(short, long)]
        out: Option<PathBuf>,
    },
}
