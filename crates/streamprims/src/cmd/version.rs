use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("streamprims {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: streamprims");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("STREAMPRIMS_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "default_pipe_capacity: {}",
        streamprims_channel::DEFAULT_PIPE_CAPACITY
    );
    println!(
        "default_max_element_len: {}",
        streamprims_frame::DEFAULT_MAX_ELEMENT_LEN
    );

    Ok(SUCCESS)
}
