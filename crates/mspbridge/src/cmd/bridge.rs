use bytes::Bytes;
use mspbridge_bridge::{Bridge, BridgeConfig, BridgeMode, Correlation, ReconnectPolicy};
use tracing::{info, warn};

use crate::cmd::{parse_duration, BridgeArgs, Context, ModeArg};
use crate::exit::{bridge_error, CliError, CliResult, SUCCESS, USAGE};

pub async fn run(args: BridgeArgs, ctx: &Context) -> CliResult<i32> {
    let config = bridge_config(&args, ctx)?;
    let connector = ctx.file.tcp_connector(args.tcp.host, args.tcp.port);
    let serial = ctx.file.serial_config(args.serial.serial, args.serial.baud);

    info!(
        tcp = %format!("{}:{}", connector.host(), connector.port()),
        serial = %serial.path.display(),
        baud = serial.baud_rate,
        "starting bridge"
    );
    let bridge = Bridge::open(config, &serial, connector)
        .map_err(|err| bridge_error("failed to open serial port", err))?;

    tokio::select! {
        result = bridge.run() => result.map_err(|err| bridge_error("bridge stopped", err))?,
        _ = tokio::signal::ctrl_c() => info!("interrupted; shutting down"),
    }

    Ok(SUCCESS)
}

fn bridge_config(args: &BridgeArgs, ctx: &Context) -> CliResult<BridgeConfig> {
    let handshake = args
        .handshake
        .clone()
        .or_else(|| ctx.file.api_handshake().map(str::to_owned));

    let mode = match args.mode {
        ModeArg::Multiplexed => {
            if args.handshake.is_some() {
                warn!("--handshake only applies to passthrough mode; ignoring");
            }
            BridgeMode::Multiplexed
        }
        ModeArg::Passthrough => BridgeMode::Passthrough {
            handshake: handshake.map(Bytes::from),
        },
    };

    let correlation = if args.strict_code_match {
        Correlation::StrictCode
    } else {
        Correlation::Positional
    };

    let reconnect = match &args.reconnect_backoff {
        Some(value) => parse_backoff(value)?,
        None => ReconnectPolicy::Immediate,
    };

    Ok(BridgeConfig {
        mode,
        reply_timeout: parse_duration(&args.reply_timeout)?,
        correlation,
        reconnect,
    })
}

/// `INITIAL,MAX`, e.g. `250ms,30s`.
fn parse_backoff(value: &str) -> CliResult<ReconnectPolicy> {
    let Some((initial, max)) = value.split_once(',') else {
        return Err(CliError::new(
            USAGE,
            format!("--reconnect-backoff expects INITIAL,MAX, got {value}"),
        ));
    };
    let initial = parse_duration(initial)?;
    let max = parse_duration(max)?;
    if max < initial {
        return Err(CliError::new(
            USAGE,
            "--reconnect-backoff maximum must not be below the initial delay",
        ));
    }
    Ok(ReconnectPolicy::Backoff { initial, max })
}
