use std::fs;
use std::path::Path;

use env_logger::Env;
use structopt::StructOpt;

use dpsync::context::Context;
use dpsync::error::Error;
use dpsync::prompt;
use dpsync::prompt::ConsoleSelector;
use dpsync::run;
use dpsync::util;
use dpsync_core::config::ConnectionDetails;

#[derive(StructOpt, Debug)]
#[structopt(name = "dpsync")]
struct Opt {
    /// Local folder to watch and synchronize
    #[structopt(parse(from_os_str))]
    path: std::path::PathBuf,

    /// Accept invalid TLS certificates (appliance management interfaces
    /// commonly use self-signed ones)
    #[structopt(long)]
    unsecure: bool,

    /// Debounce window applied to file change notifications, in milliseconds
    #[structopt(long, default_value = "500")]
    debounce_ms: u64,

    /// Ignore any saved connection document and prompt again
    #[structopt(long)]
    reconfigure: bool,
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let opt = Opt::from_args();

    fs::create_dir_all(&opt.path)?;
    let folder_path = util::canonicalize_to_string(&opt.path)?;

    let connection = if opt.reconfigure {
        None
    } else {
        ConnectionDetails::load(Path::new(&folder_path))
            .map_err(|error| Error::StartupError(format!("{:#}", error)))?
    };
    let connection = match connection {
        Some(connection) => {
            log::info!("Use saved connection details for {}", &connection.socket);
            connection
        }
        None => prompt::prompt_for_credentials()?,
    };

    let context = Context::new(connection, folder_path, opt.unsecure, opt.debounce_ms);
    run::run(context, &ConsoleSelector)?;
    log::info!("Exit application");
    Ok(())
}
