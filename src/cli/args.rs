use crate::config::{DEFAULT_CONFIG_FILE, SettingsUpdate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for tracksync
#[derive(Parser, Debug, Clone)]
#[command(name = "tracksync")]
#[command(about = "A one-button pull/push tool for a fixed set of tracked paths in a Git repository")]
#[command(long_about = None)]
#[command(version)]
pub struct Args {
    /// Settings file path
    #[arg(
        long,
        value_name = "PATH",
        env = "TRACKSYNC_CONFIG",
        default_value = DEFAULT_CONFIG_FILE,
        global = true
    )]
    pub config: PathBuf,

    /// Git executable to run
    #[arg(
        long,
        value_name = "PROGRAM",
        env = "TRACKSYNC_GIT",
        default_value = "git",
        global = true
    )]
    pub git: String,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// What to do; the interactive session when omitted
    #[command(subcommand)]
    pub command: Option<CommandKind>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    /// Show whether the repository is configured, cloned and sparse
    State,

    /// Test the connection to the remote
    Probe {
        /// Remote to test instead of the configured one
        #[arg(long, value_name = "URL")]
        remote_url: Option<String>,
    },

    /// Clone the repository with sparse checkout, or repair sparse checkout
    Bootstrap,

    /// Show the status of every tracked path
    Status {
        /// Print the status list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Pull from origin
    Pull,

    /// Commit and push the tracked paths
    Push {
        /// Commit message; defaults to "<prefix> — <date time>"
        #[arg(short, long, value_name = "MESSAGE")]
        message: Option<String>,
    },

    /// Show or change the settings file
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Run the interactive session
    Interactive,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SettingsCommand {
    /// Print the settings with defaults filled in
    Show,
    /// Change settings and save them
    Set(SettingsArgs),
}

/// Settings editor fields; only the ones given are changed
#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsArgs {
    #[arg(long, value_name = "URL")]
    pub remote_url: Option<String>,

    /// Local clone directory (`~` is expanded)
    #[arg(long, value_name = "DIR")]
    pub repo_path: Option<String>,

    #[arg(long, value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Commit message prefix
    #[arg(long, value_name = "TEXT")]
    pub commit_message: Option<String>,

    /// Track a file explicitly (repeatable); replaces the file list
    #[arg(long = "file", value_name = "PATH")]
    pub files: Vec<String>,

    /// Track a folder explicitly (repeatable); replaces the folder list
    #[arg(long = "folder", value_name = "PATH")]
    pub folders: Vec<String>,

    /// Drop the explicit lists and go back to the sparse portfolio folder
    #[arg(long, conflicts_with_all = ["files", "folders"])]
    pub sparse: bool,
}

impl SettingsArgs {
    /// Editor changes as a settings update
    #[must_use]
    pub fn to_update(&self) -> SettingsUpdate {
        let non_empty = |values: &Vec<String>| (!values.is_empty()).then(|| values.clone());
        SettingsUpdate {
            remote_url: self.remote_url.clone(),
            repo_path: self.repo_path.clone(),
            branch: self.branch.clone(),
            commit_message: self.commit_message.clone(),
            files: non_empty(&self.files),
            folders: non_empty(&self.folders),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_interactive() {
        let args = Args::try_parse_from(["tracksync"]).unwrap();
        assert_eq!(args.command, None);
        assert_eq!(args.git, "git");
        assert!(!args.verbose);
    }

    #[test]
    fn test_push_message() {
        let args = Args::try_parse_from(["tracksync", "push", "-m", "New photos"]).unwrap();
        assert_eq!(
            args.command,
            Some(CommandKind::Push {
                message: Some("New photos".to_owned())
            })
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args =
            Args::try_parse_from(["tracksync", "status", "--config", "/tmp/c.json", "-v"]).unwrap();
        assert_eq!(args.config, PathBuf::from("/tmp/c.json"));
        assert!(args.verbose);
    }

    #[test]
    fn test_settings_set_lists() {
        let args = Args::try_parse_from([
            "tracksync", "settings", "set", "--file", "a.txt", "--file", "b.txt", "--branch",
            "live",
        ])
        .unwrap();
        let Some(CommandKind::Settings(SettingsCommand::Set(set))) = args.command else {
            panic!("expected settings set");
        };
        let update = set.to_update();
        assert_eq!(update.files, Some(vec!["a.txt".to_owned(), "b.txt".to_owned()]));
        assert_eq!(update.folders, None);
        assert_eq!(update.branch.as_deref(), Some("live"));
    }

    #[test]
    fn test_sparse_conflicts_with_lists() {
        assert!(
            Args::try_parse_from(["tracksync", "settings", "set", "--sparse", "--file", "a"])
                .is_err()
        );
    }
}
