use streamprims_channel::MemoryBuffer;
use streamprims_frame::{ElementConfig, ElementWriter};
use tracing::debug;

use crate::cmd::{decode_hex, read_file, EncodeArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = if let Some(text) = &args.hex {
        decode_hex(text)?
    } else if let Some(path) = &args.file {
        read_file(path)?
    } else {
        args.data.clone().unwrap_or_default().into_bytes()
    };

    let encoded = encode(args.tag, &payload, args.max_len)?;
    debug!(
        tag = args.tag,
        contents = payload.len(),
        encoded = encoded.len(),
        "element encoded"
    );
    print_encoded(args.tag, &encoded, format);
    Ok(SUCCESS)
}

fn encode(tag: u8, payload: &[u8], max_len: usize) -> CliResult<Vec<u8>> {
    let config = ElementConfig::with_max_len(max_len);
    let mut writer = ElementWriter::with_config(MemoryBuffer::new(), config);
    writer
        .send(tag, payload)
        .map_err(|err| frame_error("encode", err))?;
    Ok(writer.into_inner().take().to_vec())
}
