use mspbridge_client::messages::*;
use mspbridge_client::{MspClient, Query};
use serde::Serialize;

use crate::cmd::{open_client, Context, QueryArgs, QueryName};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_reply, OutputFormat};

pub async fn run(args: QueryArgs, ctx: &Context) -> CliResult<i32> {
    let client = open_client(args.serial, &args.timeout, ctx)?;
    let format = ctx.format;

    match args.name {
        QueryName::Ident => fetch::<Ident>(&client, format).await?,
        QueryName::Status => fetch::<Status>(&client, format).await?,
        QueryName::RawImu => fetch::<RawImu>(&client, format).await?,
        QueryName::Servo => fetch::<Servos>(&client, format).await?,
        QueryName::Motor => fetch::<Motors>(&client, format).await?,
        QueryName::Rc => fetch::<RcChannels>(&client, format).await?,
        QueryName::RawGps => fetch::<RawGps>(&client, format).await?,
        QueryName::CompGps => fetch::<CompGps>(&client, format).await?,
        QueryName::Attitude => fetch::<Attitude>(&client, format).await?,
        QueryName::Altitude => fetch::<Altitude>(&client, format).await?,
        QueryName::Analog => fetch::<Analog>(&client, format).await?,
        QueryName::RcTuning => fetch::<RcTuning>(&client, format).await?,
        QueryName::Pid => fetch::<Pid>(&client, format).await?,
        QueryName::Box => fetch::<BoxItems>(&client, format).await?,
        QueryName::Misc => fetch::<Misc>(&client, format).await?,
        QueryName::MotorPins => fetch::<MotorPins>(&client, format).await?,
        QueryName::BoxNames => fetch::<BoxNames>(&client, format).await?,
        QueryName::PidNames => fetch::<PidNames>(&client, format).await?,
        QueryName::Wp => fetch::<Waypoint>(&client, format).await?,
        QueryName::BoxIds => fetch::<BoxIds>(&client, format).await?,
        QueryName::ServoConf => fetch::<ServoConf>(&client, format).await?,
    }

    client.device().close();
    Ok(SUCCESS)
}

async fn fetch<Q: Query + Serialize>(client: &MspClient, format: OutputFormat) -> CliResult<()> {
    let reply = client
        .query::<Q>()
        .await
        .map_err(|err| client_error(&format!("{} query failed", Q::NAME), err))?;
    print_reply(Q::NAME, Q::CODE, &reply, format);
    Ok(())
}
