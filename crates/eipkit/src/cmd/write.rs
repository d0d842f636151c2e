use eipkit_cip::TypeCode;
use eipkit_client::{Session, Tag};
use serde::Serialize;

use crate::cmd::{finish, ConnectOptions, WriteArgs};
use crate::exit::{client_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{hex, parse_hex, print_rows, OutputFormat};

#[derive(Debug, Serialize)]
struct WriteRow {
    tag: String,
    type_code: u16,
    bytes: usize,
    hex: String,
}

pub fn run(args: WriteArgs, connect: &ConnectOptions, format: OutputFormat) -> CliResult<i32> {
    // Validate before opening a session.
    let raw = match &args.hex {
        Some(input) => Some(
            parse_hex(input)
                .ok_or_else(|| CliError::new(DATA_INVALID, format!("invalid hex value: {input}")))?,
        ),
        None => None,
    };
    let type_code = match &args.type_code {
        Some(code) => parse_type_code(code)?,
        None => TypeCode::DINT,
    };

    let session = connect.connect(&args.host)?;
    let written = write_value(&session, &args, raw, type_code);
    let tag = finish(session, written)?;

    let value = tag.value();
    let row = WriteRow {
        tag: args.tag,
        type_code: tag.type_code().0,
        bytes: value.len(),
        hex: hex(&value),
    };
    print_rows(
        std::slice::from_ref(&row),
        &["Tag", "Type", "Bytes", "Hex"],
        |row| {
            vec![
                row.tag.clone(),
                format!("{:#06x}", row.type_code),
                row.bytes.to_string(),
                row.hex.clone(),
            ]
        },
        format,
    );
    Ok(SUCCESS)
}

fn write_value(
    session: &Session,
    args: &WriteArgs,
    raw: Option<Vec<u8>>,
    type_code: TypeCode,
) -> CliResult<Tag> {
    let tag = if needs_discovery(args, type_code) {
        // Structured writes address the symbol instance, so the tag has to
        // come from discovery.
        let tag = session
            .discover_tags()
            .map_err(|err| client_error("tag discovery failed", err))?
            .remove(&args.tag)
            .ok_or_else(|| CliError::new(DATA_INVALID, format!("tag not found: {}", args.tag)))?;
        match &args.string {
            Some(text) => tag.set_string(text),
            None => {
                if !tag.is_struct() {
                    return Err(CliError::new(
                        DATA_INVALID,
                        format!("{} is not a structure ({})", args.tag, tag.type_description()),
                    ));
                }
                tag.set_value(raw.unwrap_or_default());
            }
        }
        tag
    } else if let Some(value) = args.int32 {
        let tag = Tag::new(session, args.tag.clone(), 1);
        tag.set_type(TypeCode::DINT);
        tag.set_i32(value);
        tag
    } else {
        let tag = Tag::new(session, args.tag.clone(), 1);
        tag.set_type(type_code);
        tag.set_value(raw.unwrap_or_default());
        tag
    };

    tag.write()
        .map_err(|err| client_error(&format!("write {} failed", args.tag), err))?;
    Ok(tag)
}

/// String writes and structure-typed hex writes need the symbol instance id.
fn needs_discovery(args: &WriteArgs, type_code: TypeCode) -> bool {
    args.string.is_some() || (args.hex.is_some() && type_code.is_struct())
}

fn parse_type_code(input: &str) -> CliResult<TypeCode> {
    let trimmed = input.trim();
    let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(digits) => u16::from_str_radix(digits, 16),
        None => trimmed.parse(),
    };
    parsed
        .map(TypeCode)
        .map_err(|_| CliError::new(USAGE, format!("invalid type code: {input}")))
}
