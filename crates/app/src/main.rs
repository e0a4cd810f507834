mod args;
mod logging;
mod op;
mod ops;
mod state;

use args::Args;
use clap::{Parser, Subcommand};
use op::Op;
use ops::{Init, Key, Ls, Revoke, Rm, Share, Upload, Version, View};
use state::AppState;

command_enum! {
    (Init, Init),
    (Key, Key),
    (Upload, Upload),
    (Ls, Ls),
    (View, View),
    (Share, Share),
    (Revoke, Revoke),
    (Rm, Rm),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // before init there is no config to read a level from
    let log_level = AppState::load(args.config_path.clone())
        .map(|state| state.config.log_level)
        .unwrap_or_else(|_| state::default_log_level());
    let guard = logging::init_logging(&log_level);

    let ctx = op::OpContext::new(args.config_path, args.account);

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    // flush buffered logs before exiting
    drop(guard);
    std::process::exit(code);
}
