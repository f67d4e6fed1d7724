use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("vcio {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: vcio");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("VCIO_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("pointer_width: {}", usize::BITS);
    println!(
        "mailbox_ioctl: {}",
        mailbox_ioctl().unwrap_or_else(|| "unsupported".to_string())
    );

    Ok(SUCCESS)
}

fn mailbox_ioctl() -> Option<String> {
    #[cfg(unix)]
    {
        Some(format!("{:#010x}", vcio_transport::MBOX_PROPERTY))
    }

    #[cfg(not(unix))]
    {
        None
    }
}
