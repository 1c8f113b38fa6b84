mod cmd;
mod config;
mod exit;
mod logging;
mod output;

use std::path::PathBuf;

use clap::Parser;

use crate::cmd::{Command, Context};
use crate::exit::{CliError, INTERNAL};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "mspbridge", version, about = "MultiWii serial-to-TCP bridge")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// JSON config file with `tcp`, `serial` and `api` sections.
    #[arg(long, value_name = "FILE", global = true, env = "MSPBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = config::load(cli.config.as_deref()).and_then(|file| {
        let ctx = Context { format, file };
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|err| CliError::new(INTERNAL, format!("failed to start runtime: {err}")))?
            .block_on(cmd::run(cli.command, &ctx))
    });

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::ModeArg;

    #[test]
    fn parses_bridge_subcommand() {
        let cli = Cli::try_parse_from([
            "mspbridge",
            "bridge",
            "--host",
            "127.0.0.1",
            "--port",
            "4000",
            "--serial",
            "/dev/ttyUSB0",
            "--mode",
            "passthrough",
            "--strict-code-match",
        ])
        .expect("bridge args should parse");

        let Command::Bridge(args) = cli.command else {
            panic!("expected bridge subcommand");
        };
        assert_eq!(args.tcp.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(args.tcp.port, Some(4000));
        assert_eq!(args.serial.serial, Some(PathBuf::from("/dev/ttyUSB0")));
        assert_eq!(args.mode, ModeArg::Passthrough);
        assert!(args.strict_code_match);
    }

    #[test]
    fn parses_query_subcommand() {
        let cli = Cli::try_parse_from(["mspbridge", "query", "raw-imu", "--timeout", "250ms"])
            .expect("query args should parse");
        assert!(matches!(cli.command, Command::Query(_)));
    }

    #[test]
    fn rejects_unknown_query_name() {
        let err = Cli::try_parse_from(["mspbridge", "query", "warp-drive"])
            .expect_err("unknown query should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn parses_send_with_data() {
        let cli = Cli::try_parse_from(["mspbridge", "send", "205", "--data", "d3ff"])
            .expect("send args should parse");
        let Command::Send(args) = cli.command else {
            panic!("expected send subcommand");
        };
        assert_eq!(args.code, 205);
        assert_eq!(args.data.as_deref(), Some("d3ff"));
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["mspbridge", "version", "--config", "/tmp/mspbridge.json"])
            .expect("global config flag should parse after the subcommand");
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/mspbridge.json")));
    }
}
