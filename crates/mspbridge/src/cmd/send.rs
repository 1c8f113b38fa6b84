use crate::cmd::{open_client, parse_hex, Context, SendArgs};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::print_payload;

pub async fn run(args: SendArgs, ctx: &Context) -> CliResult<i32> {
    let payload = match &args.data {
        Some(hex) => parse_hex(hex)?,
        None => Vec::new(),
    };
    let client = open_client(args.serial, &args.timeout, ctx)?;

    let reply = client
        .raw(args.code, payload)
        .await
        .map_err(|err| client_error(&format!("request {} failed", args.code), err))?;
    print_payload(args.code, &reply, ctx.format);

    client.device().close();
    Ok(SUCCESS)
}
