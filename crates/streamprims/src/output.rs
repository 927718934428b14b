use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use streamprims_frame::tag::is_constructed;
use streamprims_frame::{tag_name, Element, TagClass};

const ELEMENT_SCHEMA_ID: &str =
    "https://schemas.3leaps.dev/streamprims/cli/v1/element-inspected.schema.json";
const ENCODED_SCHEMA_ID: &str =
    "https://schemas.3leaps.dev/streamprims/cli/v1/element-encoded.schema.json";

/// Longest contents preview printed before eliding.
const PREVIEW_BYTES: usize = 32;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One element as reported by `inspect`.
#[derive(Serialize, Debug)]
pub struct ElementRecord {
    schema_id: &'static str,
    pub index: usize,
    pub tag: u8,
    pub tag_name: &'static str,
    pub class: &'static str,
    pub form: &'static str,
    pub header_len: usize,
    pub len: usize,
    pub contents_len: usize,
    pub preview: String,
    #[serde(skip)]
    raw: Element,
}

impl ElementRecord {
    pub fn new(index: usize, element: Element) -> Self {
        let tag = element.tag();
        Self {
            schema_id: ELEMENT_SCHEMA_ID,
            index,
            tag,
            tag_name: tag_name(tag),
            class: TagClass::of(tag).as_str(),
            form: form_of(&element),
            header_len: element.header_len(),
            len: element.len(),
            contents_len: element.contents().len(),
            preview: contents_preview(element.contents()),
            raw: element,
        }
    }
}

fn form_of(element: &Element) -> &'static str {
    if element.is_indefinite() {
        "indefinite"
    } else if is_constructed(element.tag()) {
        "constructed"
    } else {
        "primitive"
    }
}

pub fn print_elements(records: &[ElementRecord], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for record in records {
                println!(
                    "{}",
                    serde_json::to_string(record).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "TAG", "NAME", "FORM", "HEADER", "LEN", "CONTENTS"]);
            for record in records {
                table.add_row(vec![
                    record.index.to_string(),
                    format!("0x{:02x}", record.tag),
                    record.tag_name.to_string(),
                    record.form.to_string(),
                    record.header_len.to_string(),
                    record.len.to_string(),
                    record.preview.clone(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for record in records {
                println!(
                    "#{} tag=0x{:02x} ({}, {}) form={} header={} len={} contents={}",
                    record.index,
                    record.tag,
                    record.tag_name,
                    record.class,
                    record.form,
                    record.header_len,
                    record.len,
                    record.preview
                );
            }
        }
        OutputFormat::Raw => {
            for record in records {
                print_raw(record.raw.as_ref());
            }
        }
    }
}

#[derive(Serialize)]
struct EncodedOutput<'a> {
    schema_id: &'a str,
    tag: u8,
    tag_name: &'a str,
    len: usize,
    hex: String,
}

pub fn print_encoded(tag: u8, encoded: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = EncodedOutput {
                schema_id: ENCODED_SCHEMA_ID,
                tag,
                tag_name: tag_name(tag),
                len: encoded.len(),
                hex: hex::encode(encoded),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => println!("{}", hex::encode(encoded)),
        OutputFormat::Raw => print_raw(encoded),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn contents_preview(contents: &[u8]) -> String {
    if contents.is_empty() {
        return String::new();
    }
    let shown = &contents[..contents.len().min(PREVIEW_BYTES)];
    match std::str::from_utf8(shown) {
        Ok(text) if text.chars().all(|c| !c.is_control()) => elide(text.to_string(), contents),
        _ => elide(hex::encode(shown), contents),
    }
}

fn elide(mut shown: String, contents: &[u8]) -> String {
    if contents.len() > PREVIEW_BYTES {
        shown.push_str("...");
    }
    shown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_prefers_text() {
        assert_eq!(contents_preview(b"hello"), "hello");
        assert_eq!(contents_preview(&[0x01, 0xff]), "01ff");
        assert_eq!(contents_preview(b""), "");
    }

    #[test]
    fn preview_elides_long_contents() {
        let long = vec![b'a'; PREVIEW_BYTES + 1];
        let preview = contents_preview(&long);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.len(), PREVIEW_BYTES + 3);
    }
}
