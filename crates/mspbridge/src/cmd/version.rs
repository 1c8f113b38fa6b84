use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("mspbridge {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: mspbridge");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("MSPBRIDGE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "defaults: tcp={}:{} serial={} baud={}",
        mspbridge_transport::DEFAULT_TCP_HOST,
        mspbridge_transport::DEFAULT_TCP_PORT,
        mspbridge_transport::DEFAULT_SERIAL_PATH,
        mspbridge_transport::DEFAULT_BAUD_RATE
    );

    Ok(SUCCESS)
}
