//! Producer/consumer over a small duplex pipe.
//!
//! One thread writes a stream of elements (including one larger than the
//! pipe and an indefinite-length sequence); the main thread reads them back
//! one element at a time.
//!
//! Run with:
//!   cargo run --example pipe-pump

use std::thread;

use streamprims::channel::pipe;
use streamprims::frame::{tag, ElementReader, ElementWriter, FrameError};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (producer_end, consumer_end) = pipe(64)?;

    let producer = thread::spawn(move || -> Result<(), FrameError> {
        let mut writer = ElementWriter::new(producer_end);
        for i in 0..8 {
            writer.queue(tag::UTF8_STRING, format!("message {i}").as_bytes())?;
            drain(&mut writer)?;
        }

        writer.queue(tag::OCTET_STRING, &[0x5a; 1000])?;
        drain(&mut writer)?;

        writer.queue_indefinite_header(tag::SEQUENCE);
        writer.queue(tag::INTEGER, &[0x01])?;
        writer.queue(tag::BOOLEAN, &[0xff])?;
        writer.queue_end_of_contents();
        drain(&mut writer)?;

        writer.shutdown()
    });

    let mut reader = ElementReader::new(consumer_end);
    loop {
        match reader.read_element() {
            Ok(element) => eprintln!(
                "{:<18} header={} len={} indefinite={}",
                tag::tag_name(element.tag()),
                element.header_len(),
                element.len(),
                element.is_indefinite()
            ),
            Err(FrameError::EndOfStream) => break,
            Err(err) if err.is_would_block() => thread::yield_now(),
            Err(err) => return Err(err.into()),
        }
    }

    producer.join().map_err(|_| "producer thread panicked")??;
    Ok(())
}

fn drain<C: streamprims::channel::Channel>(
    writer: &mut ElementWriter<C>,
) -> Result<(), FrameError> {
    while writer.pending_len() > 0 {
        match writer.flush() {
            Ok(()) => {}
            Err(err) if err.is_would_block() => thread::yield_now(),
            Err(err) => return Err(err),
        }
    }
    Ok(())
}
