use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::debug;
use toggl_entries::config::Config;
use toggl_entries::{EntryGateway, HttpTransport};

mod console;
mod daily_command;
mod entry_command;
mod logging;
#[cfg(test)]
mod mock_api;

use console::{ConsoleMarkdownList, ConsolePresenter};
use daily_command::{DailyArgs, DailyCommand};
use entry_command::{ContinueArgs, EntryCommand, IdArgs, StartArgs, TagArgs};

/// Togglのtime entryを操作するためのCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- daily
/// $ cargo run -- start "write report" -p 123
/// $ cargo run -- continue 456 --duration-only
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(long = "config", help = "Path to the config file")]
    config: Option<PathBuf>,

    #[clap(short = 'v', long = "verbose", help = "Prints debug logs")]
    verbose: bool,

    #[clap(
        short = 'q',
        long = "quiet",
        conflicts_with = "verbose",
        help = "Disables logs"
    )]
    quiet: bool,

    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    #[clap(about = "Lists the time entries of a day")]
    Daily(DailyArgs),
    #[clap(about = "Shows the running time entry")]
    Current,
    #[clap(about = "Starts a new time entry")]
    Start(StartArgs),
    #[clap(about = "Stops a running time entry")]
    Stop(IdArgs),
    #[clap(about = "Continues a time entry")]
    Continue(ContinueArgs),
    #[clap(about = "Makes a stopped time entry running again")]
    Unstop(IdArgs),
    #[clap(about = "Adds or removes a tag of a time entry")]
    Tag(TagArgs),
    #[clap(about = "Deletes a time entry")]
    Delete(IdArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_logger(logging::level_filter(args.verbose, args.quiet))?;

    let config = Config::load(args.config.as_deref())?;
    debug!("Loaded config: {:?}", config);
    let transport = HttpTransport::new(&config.api_url, &config.api_token);
    let gateway = EntryGateway::new(&transport, config.app_name.clone());

    let entries = match args.subcommand {
        SubCommands::Daily(daily) => DailyCommand::new(&gateway).run(daily).await?,
        SubCommands::Current => EntryCommand::new(&gateway).current().await?,
        SubCommands::Start(start) => EntryCommand::new(&gateway).start(start).await?,
        SubCommands::Stop(stop) => EntryCommand::new(&gateway).stop(stop).await?,
        SubCommands::Continue(cont) => EntryCommand::new(&gateway).continue_entry(cont).await?,
        SubCommands::Unstop(unstop) => EntryCommand::new(&gateway).unstop(unstop).await?,
        SubCommands::Tag(tag) => EntryCommand::new(&gateway).tag(tag).await?,
        SubCommands::Delete(delete) => EntryCommand::new(&gateway).delete(delete).await?,
    };

    let mut stdout = io::stdout();
    let mut presenter = ConsoleMarkdownList::new(&mut stdout);
    presenter.show_time_entries(&entries)?;

    Ok(())
}
