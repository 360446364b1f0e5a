use clap::{Parser, Subcommand, ValueEnum};

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "daybook",
    about = "Daily task list with a once-a-day completion reset",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Optional subcommand; defaults to launching the TUI when absent.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Launch the interactive TUI (Ctrl-C or q to exit).
    Tui,
    /// Print version and exit.
    Version,
    /// Run a health check against the storage directory.
    Health,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Manage tasks without the TUI.
    #[command(subcommand)]
    Task(TaskCommand),
    /// Show the theme, or set it to light, dark, or the opposite of the current one.
    Theme { choice: Option<ThemeChoice> },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TaskCommand {
    /// List tasks, newest first.
    List {
        /// Only show tasks in this category ("All" shows everything).
        #[arg(long, short)]
        category: Option<String>,
    },
    /// Add a task.
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        #[arg(long, short, default_value = "None")]
        category: String,
    },
    /// Flip a task between done and not done.
    Toggle { id: String },
    /// Replace a task's text.
    Edit {
        id: String,
        #[arg(num_args = 0..)]
        text: Vec<String>,
    },
    /// Delete a task.
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
    /// Delete every completed task.
    ClearCompleted {
        #[arg(long, short)]
        yes: bool,
    },
    /// Delete every task.
    ClearAll {
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeChoice {
    Light,
    Dark,
    Toggle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tui_subcommand() {
        let cli = Cli::try_parse_from(["daybook", "tui"]).expect("parse should succeed");
        assert_eq!(cli.command, Some(Command::Tui));
    }

    #[test]
    fn defaults_to_tui_when_missing_subcommand() {
        let cli = Cli::try_parse_from(["daybook"]).expect("parse should succeed");
        assert_eq!(cli.command, None);
    }

    #[test]
    fn parses_health_subcommand() {
        let cli = Cli::try_parse_from(["daybook", "health"]).expect("parse should succeed");
        assert_eq!(cli.command, Some(Command::Health));
    }

    #[test]
    fn parses_config_init_subcommand() {
        let cli =
            Cli::try_parse_from(["daybook", "config", "init"]).expect("parse should succeed");
        assert_eq!(cli.command, Some(Command::Config(ConfigCommand::Init)));
    }

    #[test]
    fn parses_task_add_with_words_and_category() {
        let cli = Cli::try_parse_from(["daybook", "task", "add", "buy", "milk", "-c", "Shopping"])
            .expect("parse should succeed");
        assert_eq!(
            cli.command,
            Some(Command::Task(TaskCommand::Add {
                text: vec!["buy".into(), "milk".into()],
                category: "Shopping".into(),
            }))
        );
    }

    #[test]
    fn task_add_defaults_category() {
        let cli = Cli::try_parse_from(["daybook", "task", "add", "stretch"])
            .expect("parse should succeed");
        let Some(Command::Task(TaskCommand::Add { category, .. })) = cli.command else {
            panic!("expected task add");
        };
        assert_eq!(category, "None");
    }

    #[test]
    fn parses_clear_all_with_yes() {
        let cli = Cli::try_parse_from(["daybook", "task", "clear-all", "--yes"])
            .expect("parse should succeed");
        assert_eq!(
            cli.command,
            Some(Command::Task(TaskCommand::ClearAll { yes: true }))
        );
    }

    #[test]
    fn parses_theme_toggle() {
        let cli =
            Cli::try_parse_from(["daybook", "theme", "toggle"]).expect("parse should succeed");
        assert_eq!(
            cli.command,
            Some(Command::Theme {
                choice: Some(ThemeChoice::Toggle)
            })
        );
    }
}
