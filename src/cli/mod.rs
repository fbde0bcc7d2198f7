pub mod render;
pub mod show;
pub mod shutdown;
pub mod view;

use std::{
    io::{self, IsTerminal},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use show::{process_show_command, ShowCommand};
use tokio::{io::BufReader, sync::mpsc};
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use view::{open_settings, UsageView};

use crate::{
    bridge::Platform,
    refresh::Refresher,
    usage::aggregator::UsageAggregator,
    utils::{
        clock::DefaultClock,
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX, WATCH_PREFIX},
        runtime::single_thread_runtime,
    },
};

#[derive(Parser, Debug)]
#[command(name = "dayusage", version, long_about = None)]
#[command(about = "Daily per-application foreground usage", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Option<Commands>,
    #[arg(
        long,
        global = true,
        help = "Helper program that exposes the platform usage statistics service. Without it usage is only available where the platform has a default helper"
    )]
    bridge: Option<PathBuf>,
    #[arg(
        long = "bridge-arg",
        global = true,
        help = "Argument passed to the bridge before its command. Can be repeated"
    )]
    bridge_args: Vec<String>,
    #[arg(
        long,
        global = true,
        help = "Application directory for logs. By default $XDG_STATE_HOME/dayusage or $HOME/.local/state/dayusage"
    )]
    dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Enable logging to the console")]
    log: bool,
    #[arg(long = "log-filter", global = true)]
    log_filter: Option<LevelFilter>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Interactive list of daily usage, refreshed every 5 minutes. Default command")]
    Watch,
    #[command(about = "Print usage of a single day")]
    Show {
        #[command(flatten)]
        command: ShowCommand,
    },
    #[command(about = "Open the platform screen for granting usage access")]
    Settings,
}

pub fn run_cli() -> Result<()> {
    let args = Args::parse();
    let commands = args.commands.unwrap_or(Commands::Watch);
    let interactive = matches!(commands, Commands::Watch);

    let logging_level = args
        .log_filter
        .or_else(|| args.log.then_some(LevelFilter::TRACE));
    let app_dir = args.dir.map_or_else(create_application_default_path, Ok)?;
    enable_logging(
        if interactive { WATCH_PREFIX } else { CLI_PREFIX },
        &app_dir,
        logging_level,
        // The interactive view owns stdout.
        args.log && !interactive,
    )?;

    let platform = Platform::detect(args.bridge, args.bridge_args);

    let runtime = single_thread_runtime()?;
    let result = runtime.block_on(async move {
        match commands {
            Commands::Watch => process_watch_command(platform).await,
            Commands::Show { command } => {
                process_show_command(command, &platform, &mut io::stdout()).await
            }
            Commands::Settings => {
                if let Some(alert) = open_settings(&platform).await {
                    println!("{}", alert.message);
                }
                Ok(())
            }
        }
    });
    // Stdin is read on a blocking thread which may still wait for a line.
    runtime.shutdown_timeout(Duration::from_millis(100));
    result
}

async fn process_watch_command(platform: Platform) -> Result<()> {
    let (sender, receiver) = mpsc::unbounded_channel();
    let refresher = Arc::new(Refresher::new(
        UsageAggregator::new(&platform),
        sender,
        Box::new(DefaultClock),
    ));
    let stdout = io::stdout();
    let clear_screen = stdout.is_terminal();
    let view = UsageView::new(refresher, platform, receiver, stdout).with_clear_screen(clear_screen);

    let shutdown_token = CancellationToken::new();
    let (_, result) = tokio::join!(shutdown::detect_shutdown(shutdown_token.clone()), async {
        let result = view
            .run(BufReader::new(tokio::io::stdin()), shutdown_token.clone())
            .await;
        shutdown_token.cancel();
        result
    });
    result
}
