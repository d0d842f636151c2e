use eipkit_client::Tag;
use serde::Serialize;

use crate::cmd::{finish, ConnectOptions, ReadArgs};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{hex, print_raw, print_rows, OutputFormat};

#[derive(Debug, Serialize)]
struct ReadRow {
    tag: String,
    bytes: usize,
    hex: String,
    int32: Option<i32>,
}

pub fn run(args: ReadArgs, connect: &ConnectOptions, format: OutputFormat) -> CliResult<i32> {
    let session = connect.connect(&args.host)?;
    let tag = Tag::new(&session, args.tag.clone(), args.count);
    let read = tag
        .read()
        .map_err(|err| client_error(&format!("read {} failed", args.tag), err));
    finish(session, read)?;

    let value = tag.value();
    if let OutputFormat::Raw = format {
        print_raw(&value);
        return Ok(SUCCESS);
    }

    let row = ReadRow {
        tag: args.tag,
        bytes: value.len(),
        hex: hex(&value),
        int32: tag.to_i32().ok(),
    };
    print_rows(
        std::slice::from_ref(&row),
        &["Tag", "Bytes", "Hex", "Int32"],
        |row| {
            vec![
                row.tag.clone(),
                row.bytes.to_string(),
                row.hex.clone(),
                row.int32.map(|v| v.to_string()).unwrap_or_default(),
            ]
        },
        format,
    );
    Ok(SUCCESS)
}
