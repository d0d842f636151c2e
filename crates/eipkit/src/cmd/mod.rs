use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use eipkit_client::{ClientConfig, Session};

use crate::exit::{client_error, CliError, CliResult, DATA_INVALID, USAGE};
use crate::output::OutputFormat;

pub mod identity;
pub mod read;
pub mod tags;
pub mod version;
pub mod write;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the controller's tags.
    Tags(HostArgs),
    /// Read one tag.
    Read(ReadArgs),
    /// Write one tag.
    Write(WriteArgs),
    /// Query device identity (ListIdentity).
    Identity(HostArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, connect: &ConnectOptions, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Tags(args) => tags::run(args, connect, format),
        Command::Read(args) => read::run(args, connect, format),
        Command::Write(args) => write::run(args, connect, format),
        Command::Identity(args) => identity::run(args, connect, format),
        Command::Version(args) => version::run(args),
    }
}

/// Connection flags shared by every networked command.
#[derive(Args, Debug, Default)]
pub struct ConnectOptions {
    /// EtherNet/IP TCP port.
    #[arg(long, global = true)]
    pub port: Option<u16>,
    /// Backplane slot of the controller.
    #[arg(long, global = true)]
    pub slot: Option<u8>,
    /// Connect and I/O timeout (e.g. 5s, 500ms).
    #[arg(long, global = true)]
    pub timeout: Option<String>,
    /// JSON client configuration file; flags override its values.
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,
}

impl ConnectOptions {
    pub fn client_config(&self) -> CliResult<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path).map_err(|err| {
                    CliError::new(USAGE, format!("failed to read {}: {err}", path.display()))
                })?;
                ClientConfig::from_json(&json).map_err(|err| {
                    CliError::new(DATA_INVALID, format!("invalid config {}: {err}", path.display()))
                })?
            }
            None => ClientConfig::default(),
        };

        if let Some(port) = self.port {
            config.tcp_port = port;
        }
        if let Some(slot) = self.slot {
            config.slot = slot;
        }
        if let Some(timeout) = &self.timeout {
            let timeout = parse_timeout(timeout)?;
            config.connect_timeout = timeout;
            config.read_timeout = Some(timeout);
            config.write_timeout = Some(timeout);
        }
        Ok(config)
    }

    pub fn connect(&self, host: &str) -> CliResult<Session> {
        let config = self.client_config()?;
        Session::connect(host, config)
            .map_err(|err| client_error(&format!("connect to {host} failed"), err))
    }
}

/// Close the session, reporting a failure only when the command itself
/// succeeded.
pub fn finish<T>(session: Session, result: CliResult<T>) -> CliResult<T> {
    let closed = session
        .close()
        .map_err(|err| client_error("close failed", err));
    let value = result?;
    closed?;
    Ok(value)
}

#[derive(Args, Debug)]
pub struct HostArgs {
    /// Controller host name or address.
    pub host: String,
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Controller host name or address.
    pub host: String,
    /// Tag name, e.g. `Program:Main.Counter`.
    pub tag: String,
    /// Number of elements to read.
    #[arg(long, default_value = "1")]
    pub count: u32,
}

#[derive(Args, Debug)]
#[command(group(
    clap::ArgGroup::new("value")
        .required(true)
        .args(["int32", "string", "hex"])
))]
pub struct WriteArgs {
    /// Controller host name or address.
    pub host: String,
    /// Tag name.
    pub tag: String,
    /// Write a DINT.
    #[arg(long, allow_negative_numbers = true, conflicts_with_all = ["string", "hex"])]
    pub int32: Option<i32>,
    /// Write a string to a discovered STRING-structured tag.
    #[arg(long, conflicts_with_all = ["int32", "hex"])]
    pub string: Option<String>,
    /// Write raw value bytes given as hex.
    #[arg(long, conflicts_with_all = ["int32", "string"])]
    pub hex: Option<String>,
    /// Type code for --hex writes (e.g. 0xC4).
    #[arg(long = "type", value_name = "CODE", requires = "hex")]
    pub type_code: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_timeout(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "timeout must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid timeout value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "timeout must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
