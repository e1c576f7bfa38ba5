//! switchbook CLI
//!
//! Runs the Switchbook HTTP server and the operator tasks around it:
//! database setup, seed data, account administration, and data migrations.

mod cli_types;
mod commands;
mod error;
mod progress;

use std::io::Write;

use clap::Parser;
use switchbook_catalog::types::Role;

use cli_types::{
    Cli, Commands, ConfigAction, DbAction, MigrateAction, SeedAction, UserAction,
};
pub(crate) use error::CliError;

/// Print an empty line through the logger so `--quiet` suppresses it too.
pub(crate) fn log_blank() {
    log::info!("");
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else if quiet {
        log::LevelFilter::Warn
    } else {
        log::LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if verbose {
        builder.format_timestamp_millis();
    } else {
        builder.format(|buf, record| writeln!(buf, "{}", record.args()));
    }
    builder.parse_default_env();
    builder.init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let Cli {
        db, quiet, command, ..
    } = cli;

    match command {
        Commands::Serve { bind } => commands::serve::run_serve(db, bind),
        Commands::Db { action } => match action {
            DbAction::Init => commands::db::run_db_init(db),
            DbAction::Stats => commands::db::run_db_stats(db),
        },
        Commands::Seed { action } => match action {
            SeedAction::Manufacturers { dir } => commands::seed::run_seed_manufacturers(db, dir),
        },
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                email,
                password,
                admin,
            } => commands::user::run_user_create(db, &username, &email, &password, admin),
            UserAction::Promote { user } => commands::user::run_user_set_role(db, &user, Role::Admin),
            UserAction::Demote { user } => commands::user::run_user_set_role(db, &user, Role::User),
        },
        Commands::Migrate { action } => match action {
            MigrateAction::BackfillShareIds => commands::migrate::run_backfill_share_ids(db, quiet),
            MigrateAction::NormalizeManufacturers { dry_run } => {
                commands::migrate::run_normalize_manufacturers(db, dry_run, quiet)
            }
            MigrateAction::LinkMasterSwitches { dry_run } => {
                commands::migrate::run_link_master_switches(db, dry_run, quiet)
            }
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::run_config_show(),
            ConfigAction::Path => commands::config::run_config_path(),
        },
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
