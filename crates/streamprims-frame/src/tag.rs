//! Tag byte helpers.
//!
//! Element reading treats the tag as opaque. These constants and names only
//! label tags for diagnostics and for building test input.

/// End-of-contents marker tag (paired with a zero length byte).
pub const END_OF_CONTENTS: u8 = 0x00;

pub const BOOLEAN: u8 = 0x01;
pub const INTEGER: u8 = 0x02;
pub const BIT_STRING: u8 = 0x03;
pub const OCTET_STRING: u8 = 0x04;
pub const NULL: u8 = 0x05;
pub const OBJECT_IDENTIFIER: u8 = 0x06;
pub const UTF8_STRING: u8 = 0x0c;
pub const SEQUENCE: u8 = 0x30;
pub const SET: u8 = 0x31;

/// Constructed-encoding bit.
pub const CONSTRUCTED: u8 = 0x20;

/// Class bits of a tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    Universal,
    Application,
    ContextSpecific,
    Private,
}

impl TagClass {
    pub fn of(tag: u8) -> Self {
        match tag >> 6 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TagClass::Universal => "UNIVERSAL",
            TagClass::Application => "APPLICATION",
            TagClass::ContextSpecific => "CONTEXT",
            TagClass::Private => "PRIVATE",
        }
    }
}

/// Returns a human-readable name for a tag byte.
pub fn tag_name(tag: u8) -> &'static str {
    match tag {
        END_OF_CONTENTS => "END-OF-CONTENTS",
        BOOLEAN => "BOOLEAN",
        INTEGER => "INTEGER",
        BIT_STRING => "BIT STRING",
        OCTET_STRING => "OCTET STRING",
        NULL => "NULL",
        OBJECT_IDENTIFIER => "OBJECT IDENTIFIER",
        UTF8_STRING => "UTF8String",
        SEQUENCE => "SEQUENCE",
        SET => "SET",
        _ => TagClass::of(tag).as_str(),
    }
}

/// Returns true if the tag has the constructed bit set.
pub fn is_constructed(tag: u8) -> bool {
    tag & CONSTRUCTED != 0
}
