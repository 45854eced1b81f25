use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(version, about = "Relay CLI", long_about = None, bin_name = "relay")]
pub struct Cli {
  #[command(subcommand)]
  pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
  /// Create the .relay layout and a default project config
  Init,
  /// Create and dispatch a new task
  Task(TaskArgs),
  /// Drain agent outboxes once
  Pump,
  /// Drain agent outboxes on an interval until interrupted
  Watch,
  /// Inspect and manage stored tasks
  Tasks(TasksArgs),
  /// Dispatch ad-hoc envelopes
  Send(SendArgs),
  /// Show the recorded event journal
  Timeline(TimelineArgs),
}

#[derive(Debug, ClapArgs)]
pub struct TaskArgs {
  /// Task title
  pub title: String,
  /// Repo the task belongs to
  #[arg(long)]
  pub repo: String,
  /// Deliver only to agents with one of these roles (comma separated)
  #[arg(long)]
  pub roles: Option<String>,
  /// Deliver only to these agents (comma separated)
  #[arg(long)]
  pub agents: Option<String>,
}

#[derive(Debug, ClapArgs)]
pub struct TasksArgs {
  #[command(subcommand)]
  pub command: TasksSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum TasksSubcommand {
  /// List stored tasks
  List {
    /// Print the raw task array as JSON
    #[arg(long)]
    json: bool,
  },
  /// Print one task as pretty JSON
  Show {
    /// Task id
    id: String,
  },
  /// Close a task with a terminal status
  Close {
    /// Task id
    id: String,
    /// Terminal status to record
    #[arg(long, value_enum, default_value = "done")]
    status: CloseStatus,
  },
  /// Summarize a task through the configured provider
  Report {
    /// Task id
    id: String,
  },
  /// Derive an apply plan from the task's last changeset
  Plan {
    /// Task id
    id: String,
  },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CloseStatus {
  Done,
  Cancelled,
}

#[derive(Debug, ClapArgs)]
pub struct SendArgs {
  #[command(subcommand)]
  pub command: SendSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum SendSubcommand {
  /// Dispatch a change request to matching agents
  Change(ChangeArgs),
}

#[derive(Debug, ClapArgs)]
pub struct ChangeArgs {
  /// Change request title
  pub title: Option<String>,
  /// Repo the change applies to
  #[arg(long)]
  pub repo: String,
  /// Deliver only to agents with one of these roles (comma separated)
  #[arg(long)]
  pub roles: Option<String>,
  /// Deliver only to these agents (comma separated)
  #[arg(long)]
  pub agents: Option<String>,
  /// Attach the change to an existing task instead of synthesizing one
  #[arg(long)]
  pub task: Option<String>,
  /// Envelope payload as JSON; non-JSON text becomes {"note": "<text>"}
  #[arg(long)]
  pub payload: Option<String>,
}

#[derive(Debug, ClapArgs)]
pub struct TimelineArgs {
  /// Only records strictly newer than this RFC 3339 timestamp
  #[arg(long)]
  pub since: Option<String>,
  /// Number of journal lines to scan
  #[arg(long, default_value_t = relay_core::timeline::DEFAULT_TAIL_LIMIT)]
  pub limit: usize,
  /// Print records as a JSON array
  #[arg(long)]
  pub json: bool,
}
