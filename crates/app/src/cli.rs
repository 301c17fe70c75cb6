use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about = "Portfolio visitor log and analytics service")]
pub struct Cli {
    /// Which parts of the service to run.
    #[arg(long, default_value = "all")]
    pub mode: Mode,
    /// Apply database migrations on startup.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub migrate: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Mode {
    All,
    Api,
    Worker,
}

impl Mode {
    pub fn run_api(self) -> bool {
        matches!(self, Mode::All | Mode::Api)
    }

    pub fn run_worker(self) -> bool {
        matches!(self, Mode::All | Mode::Worker)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Mode};

    #[test]
    fn defaults_to_all_with_migrations() {
        let cli = Cli::parse_from(["folio"]);
        assert!(cli.mode.run_api());
        assert!(cli.mode.run_worker());
        assert!(cli.migrate);
    }

    #[test]
    fn worker_mode_skips_api() {
        let cli = Cli::parse_from(["folio", "--mode", "worker", "--migrate", "false"]);
        assert!(matches!(cli.mode, Mode::Worker));
        assert!(!cli.mode.run_api());
        assert!(!cli.migrate);
    }
}
