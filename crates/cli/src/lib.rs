pub mod args;
pub mod commands;
pub mod context;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use crate::args::{Cli, Commands, SendSubcommand, TasksSubcommand};
use crate::context::CommandContext;

pub fn run() -> Result<()> {
  let cli = match Cli::try_parse() {
    Ok(cli) => cli,
    Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
      err.print()?;
      return Ok(());
    }
    Err(err) => {
      // clap exits 2 on usage errors by default; the command surface
      // promises 1, so print the rendered message and exit ourselves.
      err.print()?;
      std::process::exit(1);
    }
  };

  let Some(command) = cli.command else {
    // No subcommand provided; show help and exit 0
    Cli::command().print_help()?;
    println!();
    return Ok(());
  };

  let ctx = CommandContext::resolve()?;
  match command {
    Commands::Init => commands::init::run(&ctx),
    Commands::Task(task) => commands::task::run(&ctx, task),
    Commands::Pump => commands::pump::run(&ctx),
    Commands::Watch => commands::watch::run(&ctx),
    Commands::Tasks(tasks) => match tasks.command {
      TasksSubcommand::List { json } => commands::tasks::list(&ctx, json),
      TasksSubcommand::Show { id } => commands::tasks::show(&ctx, &id),
      TasksSubcommand::Close { id, status } => commands::tasks::close(&ctx, &id, status),
      TasksSubcommand::Report { id } => commands::report::run(&ctx, &id),
      TasksSubcommand::Plan { id } => commands::plan::run(&ctx, &id),
    },
    Commands::Send(send) => match send.command {
      SendSubcommand::Change(change) => commands::send::change(&ctx, change),
    },
    Commands::Timeline(timeline) => commands::timeline::run(&ctx, timeline),
  }
}
