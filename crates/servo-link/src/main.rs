//! Servo Link - Main Entry Point

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use servo_control::LinkConfig;
use servo_link::{init_logging, listen, open_port, send, spawn_reader};
use servo_protocol::Command;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "servo-link", version, about = "Two-servo serial command link")]
struct Cli {
    /// Configuration file (TOML/YAML/JSON); SERVO_LINK_* env vars override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, action = ArgAction::SetTrue, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the device control loop on received bytes
    Listen {
        /// Serial port to read; stdin when omitted
        #[arg(long)]
        port: Option<String>,
        /// Delay between poll cycles (milliseconds)
        #[arg(long, default_value_t = 10)]
        poll_ms: u64,
    },
    /// Send one set-servo-positions frame
    Send {
        /// Serial port to write
        #[arg(long)]
        port: String,
        /// Leg 1 target angle, written to the wire as-is
        #[arg(long)]
        leg1: u8,
        /// Leg 2 target angle, written to the wire as-is (no -90 offset
        /// is applied; pass the raw byte the device should receive)
        #[arg(long)]
        leg2: u8,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    info!("=== Servo Link v{} ===", env!("CARGO_PKG_VERSION"));
    let config = LinkConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Listen { port, poll_ms } => {
            let source = match port {
                Some(path) => spawn_reader(open_port(&path, config.baud_rate)?),
                None => {
                    info!("Reading frames from stdin");
                    spawn_reader(tokio::io::stdin())
                }
            };
            listen(&config, source, Duration::from_millis(poll_ms)).await?;
            Ok(())
        }
        Commands::Send { port, leg1, leg2 } => {
            let mut stream = open_port(&port, config.baud_rate)?;
            send(&mut stream, Command::SetServoPositions { leg1, leg2 }).await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_send_angles_pass_through_unchanged() {
        let cli = Cli::try_parse_from([
            "servo-link", "send", "--port", "/dev/ttyUSB0", "--leg1", "80", "--leg2", "45",
        ])
        .unwrap();

        match cli.command {
            Commands::Send { port, leg1, leg2 } => {
                assert_eq!(port, "/dev/ttyUSB0");
                assert_eq!((leg1, leg2), (80, 45));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_leg2_help_mentions_raw_wire_value() {
        let cmd = Cli::command();
        let send = cmd.find_subcommand("send").unwrap();
        let leg2 = send
            .get_arguments()
            .find(|arg| arg.get_id() == "leg2")
            .unwrap();
        let help = leg2.get_help().unwrap().to_string();
        assert!(help.contains("-90 offset"));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
