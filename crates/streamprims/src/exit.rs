use std::fmt;
use std::io;

use streamprims_channel::ChannelError;
use streamprims_frame::FrameError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => FAILURE,
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn channel_error(context: &str, err: ChannelError) -> CliError {
    match err {
        ChannelError::Io(source) => io_error(context, source),
        ChannelError::BrokenPipe => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Channel(source) => channel_error(context, source),
        FrameError::Truncated { .. } | FrameError::Malformed(_) | FrameError::TooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::EndOfStream => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use streamprims_frame::MalformedReason;

    use super::*;

    #[test]
    fn rejected_elements_are_data_invalid() {
        let cases = [
            FrameError::Truncated {
                consumed: 4,
                missing: 1,
            },
            FrameError::Malformed(MalformedReason::NonCanonicalLength),
            FrameError::TooLarge { size: 8004, max: 8003 },
        ];
        for err in cases {
            assert_eq!(frame_error("inspect", err).code, DATA_INVALID);
        }
    }

    #[test]
    fn channel_failures_map_through_frame_errors() {
        let err = frame_error("inspect", FrameError::Channel(ChannelError::BrokenPipe));
        assert_eq!(err.code, FAILURE);

        let err = frame_error(
            "inspect",
            FrameError::Channel(ChannelError::Alloc { requested: 1 << 40 }),
        );
        assert_eq!(err.code, INTERNAL);
        assert!(err.message.starts_with("inspect: "));
    }

    #[test]
    fn missing_file_is_failure() {
        let err = io_error("read input", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.code, FAILURE);
    }
}
