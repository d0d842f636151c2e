use serde::Serialize;

use crate::cmd::{finish, ConnectOptions, HostArgs};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_rows, OutputFormat};

#[derive(Debug, Serialize)]
struct TagRow {
    name: String,
    instance_id: u32,
    type_code: u16,
    kind: &'static str,
    dims: [u32; 3],
}

pub fn run(args: HostArgs, connect: &ConnectOptions, format: OutputFormat) -> CliResult<i32> {
    let session = connect.connect(&args.host)?;
    let rows = session
        .discover_tags()
        .map(|tags| {
            tags.into_iter()
                .map(|(name, tag)| {
                    let type_code = tag.type_code();
                    TagRow {
                        name,
                        instance_id: tag.instance_id(),
                        type_code: type_code.0,
                        kind: if type_code.is_struct() { "struct" } else { "atomic" },
                        dims: tag.dims(),
                    }
                })
                .collect::<Vec<_>>()
        })
        .map_err(|err| client_error("tag discovery failed", err));
    let rows = finish(session, rows)?;

    print_rows(
        &rows,
        &["Name", "Instance", "Type", "Kind", "Dims"],
        |row| {
            vec![
                row.name.clone(),
                row.instance_id.to_string(),
                format!("{:#06x}", row.type_code),
                row.kind.to_string(),
                format!("{}x{}x{}", row.dims[0], row.dims[1], row.dims[2]),
            ]
        },
        format,
    );
    Ok(SUCCESS)
}
