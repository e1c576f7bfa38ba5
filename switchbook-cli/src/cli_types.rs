//! CLI type definitions: command enums and argument structs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "switchbook")]
#[command(about = "Run and administer a Switchbook server", long_about = None)]
pub(crate) struct Cli {
    /// SQLite database path (overrides config file and SWITCHBOOK_DATABASE)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Only show warnings and errors (suppress normal output)
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable verbose/debug logging (timestamps + debug-level messages)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to listen on (e.g., 0.0.0.0:3000)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Create or inspect the database
    Db {
        #[command(subcommand)]
        action: DbAction,
    },

    /// Load curated data into the database
    Seed {
        #[command(subcommand)]
        action: SeedAction,
    },

    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// One-off data migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },

    /// Show server configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum DbAction {
    /// Create the database, or migrate it to the current schema
    Init,

    /// Print record counts
    Stats,
}

#[derive(Subcommand)]
pub(crate) enum SeedAction {
    /// Load canonical manufacturers and aliases from YAML files
    Manufacturers {
        /// Directory of YAML files (default: ./catalog/manufacturers)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub(crate) enum UserAction {
    /// Create an account
    Create {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        /// Give the account administrator privileges
        #[arg(long)]
        admin: bool,
    },

    /// Grant administrator privileges
    Promote {
        /// Username or email
        user: String,
    },

    /// Revoke administrator privileges
    Demote {
        /// Username or email
        user: String,
    },
}

#[derive(Subcommand)]
pub(crate) enum MigrateAction {
    /// Give every user without a shareable ID a new one
    BackfillShareIds,

    /// Rewrite manufacturer names on every record to their canonical spelling
    NormalizeManufacturers {
        /// Show what would change without writing
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Link unlinked collection entries to the approved master switch with the same name
    LinkMasterSwitches {
        /// Show what would change without writing
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Show each setting and where its value came from
    Show,

    /// Print the config file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from([
            "switchbook",
            "migrate",
            "normalize-manufacturers",
            "--dry-run",
            "--db",
            "/tmp/s.db",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/s.db")));
        assert!(matches!(
            cli.command,
            Commands::Migrate {
                action: MigrateAction::NormalizeManufacturers { dry_run: true }
            }
        ));
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        assert!(Cli::try_parse_from(["switchbook", "--quiet", "--verbose", "db", "stats"]).is_err());
    }

    #[test]
    fn user_create_requires_credentials() {
        assert!(Cli::try_parse_from(["switchbook", "user", "create", "--username", "x"]).is_err());
        let cli = Cli::try_parse_from([
            "switchbook",
            "user",
            "create",
            "--username",
            "root",
            "--email",
            "root@example.com",
            "--password",
            "hunter22",
            "--admin",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::User {
                action: UserAction::Create { admin: true, .. }
            }
        ));
    }
}
