use yansi::Paint;

fn main() {
  // Initialize structured logging early; a failed init runs the CLI unlogged
  let root = std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
  let cfg = relay_core::config::load(Some(&root))
    .unwrap_or_else(|_| relay_core::config::Config::default());
  let log_path = relay_core::adapters::fs::logs_path(&root);
  let _ = relay_core::logging::init(&log_path, cfg.log_level);

  if let Err(err) = cli::run() {
    eprintln!("{}", format!("{err:#}").red());
    std::process::exit(1);
  }
}
