use std::path::Path;

use streamprims_channel::{pipe, Channel};
use streamprims_frame::{ElementConfig, ElementReader, FrameError};
use tracing::{debug, info};

use crate::cmd::{decode_hex, read_file, read_stdin, InspectArgs};
use crate::exit::{channel_error, frame_error, CliError, CliResult, SUCCESS};
use crate::output::{print_elements, ElementRecord, OutputFormat};

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let input = match (&args.hex, args.input.as_deref()) {
        (Some(text), _) => decode_hex(text)?,
        (None, Some(path)) if path != Path::new("-") => read_file(path)?,
        (None, _) => read_stdin()?,
    };
    let config = ElementConfig {
        max_len: args.max_len,
        ..ElementConfig::default()
    };

    let (records, failure) = pump(&input, args.pipe_capacity, config, args.count);
    print_elements(&records, format);

    match failure {
        Some(err) => Err(err),
        None => Ok(SUCCESS),
    }
}

/// Push `input` into one end of a bounded pipe and read elements off the
/// other, interleaving writes and reads on one thread. Returns the elements
/// read before the first failure, if any.
fn pump(
    input: &[u8],
    capacity: usize,
    config: ElementConfig,
    count: Option<usize>,
) -> (Vec<ElementRecord>, Option<CliError>) {
    let mut records = Vec::new();
    let (mut tx, rx) = match pipe(capacity) {
        Ok(endpoints) => endpoints,
        Err(err) => return (records, Some(channel_error("create pipe", err))),
    };
    let mut reader = ElementReader::with_config(rx, config);
    let mut sent = 0;

    while count.is_none_or(|limit| records.len() < limit) {
        if sent < input.len() {
            match tx.write(&input[sent..]) {
                Ok(n) => sent += n,
                Err(err) if err.is_would_block() => {}
                Err(err) => return (records, Some(channel_error("write pipe", err))),
            }
        }
        if sent == input.len() && !tx.is_write_shutdown() {
            if let Err(err) = tx.shutdown_write() {
                return (records, Some(channel_error("shut down pipe", err)));
            }
        }

        match reader.read_element() {
            Ok(element) => {
                debug!(
                    index = records.len(),
                    tag = element.tag(),
                    len = element.len(),
                    "element read"
                );
                records.push(ElementRecord::new(records.len(), element));
            }
            Err(FrameError::EndOfStream) => break,
            Err(err) if err.is_would_block() => {}
            Err(err) => {
                let context = format!("element #{}", records.len());
                return (records, Some(frame_error(&context, err)));
            }
        }
    }

    info!(
        elements = records.len(),
        input_bytes = input.len(),
        unread_bytes = input.len() - sent + reader.get_ref().buffered(),
        "inspect finished"
    );
    (records, None)
}
