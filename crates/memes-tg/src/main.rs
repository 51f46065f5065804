use clap::Parser;
use futures::prelude::*;
use memes_tg::tracing_err;
use std::panic::AssertUnwindSafe;
use std::process::ExitCode;
use tracing::{error, info, warn};

/// Telegram bot backend of the memes community
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(clap::Subcommand)]
enum Cmd {
    /// Run the bot updates processing loop (default)
    Bot,

    /// Pay the authors of the weekly top uploaded memes and announce them
    RewardWeeklyUploadedMemes {
        /// Language of the memes and of the announcement channel.
        /// Overrides `REWARDS_LANG`.
        #[arg(long)]
        lang: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    if dotenvy::dotenv().is_err() {
        eprintln!("Dotenv config was not found, ignoring this...")
    }

    let args = Args::parse();

    let logging_task = memes_tg::init_logging();

    memes_tg::init_metrics();

    let main_fut = AssertUnwindSafe(async {
        let result = try_main(args).await;

        result.map(|()| ExitCode::SUCCESS).unwrap_or_else(|err| {
            error!(err = tracing_err(&err), "Exitting with an error...");
            ExitCode::FAILURE
        })
    })
    .catch_unwind()
    .unwrap_or_else(|_| {
        error!("Exitting due to a panic...");
        ExitCode::FAILURE
    });

    let exit_code = if !cfg!(debug_assertions) {
        main_fut.await
    } else {
        // Don't wait for teloxide's shutdown logic when cancelling in debug mode.
        // That takes a lot of time for some reason:
        // https://github.com/teloxide/teloxide/issues/711
        tokio::select! {
            exit_code = main_fut => {
                info!("Main task has finished, exiting...");
                exit_code
            }
            () = abort_signal() => ExitCode::SUCCESS,
        }
    };

    logging_task.shutdown().await;

    exit_code
}

async fn try_main(args: Args) -> memes_tg::Result {
    let config = memes_tg::Config::load_or_panic();

    match args.cmd.unwrap_or(Cmd::Bot) {
        Cmd::Bot => memes_tg::run_bot(config).await,
        Cmd::RewardWeeklyUploadedMemes { lang } => {
            memes_tg::reward_weekly_uploaded_memes(config, lang).await
        }
    }
}

async fn abort_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(
            err = tracing_err(&err),
            "Failed to wait for Ctrl+C, exiting..."
        );
    } else {
        info!("Ctrl+C received, exiting forcefully...");
    }
}
