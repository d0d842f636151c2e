use crate::cmd::{finish, ConnectOptions, HostArgs};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_rows, OutputFormat};

pub fn run(args: HostArgs, connect: &ConnectOptions, format: OutputFormat) -> CliResult<i32> {
    let session = connect.connect(&args.host)?;
    let identities = session
        .list_identity()
        .map_err(|err| client_error("ListIdentity failed", err));
    let identities = finish(session, identities)?;

    print_rows(
        &identities,
        &["Product", "Address", "Vendor", "Device", "Code", "Revision", "Serial", "State"],
        |id| {
            vec![
                id.product_name.clone(),
                id.socket_addr.to_string(),
                id.vendor_id.to_string(),
                id.device_type.to_string(),
                id.product_code.to_string(),
                id.revision(),
                format!("{:#010x}", id.serial_number),
                id.state.to_string(),
            ]
        },
        format,
    );
    Ok(SUCCESS)
}
