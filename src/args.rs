use std::{net::SocketAddr, path::PathBuf};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "deployhook",
    about = "Keep local repositories in sync with their upstream on push"
)]
pub struct Args {
    /// The listen address and port
    ///
    /// The port and address where the server should listen to receive webhooks
    #[structopt(short, long)]
    pub address: Option<SocketAddr>,

    /// The configuration file location
    ///
    /// Where the configuration file should be loaded from. The environment
    /// variable DEPLOYHOOK_CONFIG can also be used. When omitted, the
    /// configuration is read from the environment (SECRET, PORT, REPO_PATH0..).
    #[structopt(short, long, env = "DEPLOYHOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// The minimum level to log at
    ///
    /// The minimum log level specification, supports the rust log format. The
    /// environment variable RUST_LOG can also be used.
    #[structopt(short, long, env = "RUST_LOG")]
    pub log_level: Option<String>,
}
