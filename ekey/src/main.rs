use anyhow::Context;
use ekey::cli::{Args, Command};

fn main() -> anyhow::Result<()> {
    ekey_logger::init();

    let args: Args = argh::from_env();
    match args.cmd {
        Command::Serve(cmd) => {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to build tokio runtime")?;
            rt.block_on(ekey::server::serve(cmd))
        }
        Command::Issue(cmd) => {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to build tokio runtime")?;
            rt.block_on(async { ekey::cli::issue_one_shot(cmd) })
        }
    }
}
