// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Project automation for the route binding workspace.
//!
//! `cargo test` only ever touches `SQLite`. Everything that needs `MariaDB`
//! is opt-in and lives here:
//!
//! - `cargo xtask test-mariadb` runs the ignored backend validation tests
//!   in `routebind-persistence` against a throwaway container.
//! - `cargo xtask verify-migrations` applies both migration sets and fails
//!   if the resulting schemas differ.

#![deny(
    clippy::pedantic,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

mod mariadb;
mod schema;

use std::{io, process::Output};

use cargo_metadata::MetadataCommand;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::{eyre::Context, Result};
use duct::cmd;
use tracing::level_filters::LevelFilter;
use tracing_log::AsTrace;

use crate::mariadb::MariaDbContainer;

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .without_time()
        .init();

    if let Err(err) = args.command.run() {
        tracing::error!("{err}");
        std::process::exit(1);
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(bin_name = "cargo xtask", styles = clap_cargo::style::CLAP_STYLING)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

impl Args {
    fn log_level(&self) -> LevelFilter {
        self.verbosity.log_level_filter().as_trace()
    }
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Run CI checks (lint, build, test)
    CI,

    /// Build the workspace
    #[command(visible_alias = "b")]
    Build,

    /// Run cargo check
    #[command(visible_alias = "c")]
    Check,

    /// Lint formatting, typos, clippy, and docs
    #[command(visible_alias = "l")]
    Lint,

    /// Run clippy on the workspace
    #[command(visible_alias = "cl")]
    LintClippy,

    /// Check documentation for errors and warnings
    #[command(visible_alias = "d")]
    LintDocs,

    /// Check for formatting issues
    #[command(visible_alias = "lf")]
    LintFormatting,

    /// Check for typos
    #[command(visible_alias = "lt")]
    LintTypos,

    /// Fix clippy warnings
    #[command(visible_alias = "fc")]
    FixClippy,

    /// Fix formatting issues
    #[command(visible_alias = "fmt")]
    FixFormatting,

    /// Run all tests
    #[command(visible_alias = "t")]
    Test,

    /// Run `MariaDB` backend validation tests
    #[command(visible_alias = "tm")]
    TestMariadb,

    /// Verify schema parity between `SQLite` and `MySQL` migrations
    #[command(visible_alias = "vm")]
    VerifyMigrations,
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Self::CI => ci(),
            Self::Build => run_cargo(&["build", "--all-targets", "--all-features"]),
            Self::Check => run_cargo(&["check", "--all-targets", "--all-features"]),
            Self::Lint => lint(),
            Self::LintClippy => run_cargo(&[
                "clippy",
                "--all-targets",
                "--all-features",
                "--",
                "-D",
                "warnings",
            ]),
            Self::LintDocs => lint_docs(),
            Self::LintFormatting => run_cargo_nightly(&["fmt", "--all", "--check"]),
            Self::LintTypos => {
                cmd!("typos").run_with_trace()?;
                Ok(())
            }
            Self::FixClippy => run_cargo(&[
                "clippy",
                "--all-targets",
                "--all-features",
                "--fix",
                "--allow-dirty",
                "--allow-staged",
                "--",
                "-D",
                "warnings",
            ]),
            Self::FixFormatting => run_cargo_nightly(&["fmt", "--all"]),
            Self::Test => test(),
            Self::TestMariadb => test_mariadb(),
            Self::VerifyMigrations => verify_migrations(),
        }
    }
}

fn ci() -> Result<()> {
    lint()?;
    Command::Build.run()?;
    test()?;
    verify_migrations()?;
    Ok(())
}

fn lint() -> Result<()> {
    Command::LintClippy.run()?;
    lint_docs()?;
    Command::LintFormatting.run()?;
    Command::LintTypos.run()
}

/// Check that docs build without warnings for every workspace package
fn lint_docs() -> Result<()> {
    let meta = MetadataCommand::new()
        .exec()
        .wrap_err("failed to get cargo metadata")?;

    for package in meta.workspace_default_packages() {
        cmd(
            "cargo",
            [
                "doc",
                "--no-deps",
                "--all-features",
                "--package",
                &package.name,
            ],
        )
        .env_remove("CARGO")
        .env("RUSTUP_TOOLCHAIN", "nightly")
        .env("RUSTDOCFLAGS", "--cfg docsrs -D warnings")
        .run_with_trace()?;
    }

    Ok(())
}

fn test() -> Result<()> {
    run_cargo(&["test", "--all-targets", "--all-features"])?;
    run_cargo(&["test", "--doc", "--all-features"])
}

fn run_cargo(args: &[&str]) -> Result<()> {
    cmd("cargo", args).run_with_trace()?;
    Ok(())
}

fn run_cargo_nightly(args: &[&str]) -> Result<()> {
    cmd("cargo", args)
        // CARGO is set because we run as a cargo subcommand
        .env_remove("CARGO")
        .env("RUSTUP_TOOLCHAIN", "nightly")
        .run_with_trace()?;
    Ok(())
}

/// Runs the ignored `MariaDB` tests in `routebind-persistence`.
///
/// Requires Docker and a free port 3307. The container is removed when
/// this returns, whether the tests passed or not.
fn test_mariadb() -> Result<()> {
    let container = MariaDbContainer::start(
        "routebind-test-mariadb",
        "routebind_test",
        "test_password",
        3307,
    )?;

    tracing::info!("Running MariaDB backend validation tests");
    cmd!(
        "cargo",
        "test",
        "--package",
        "routebind-persistence",
        "backend_validation_tests",
        "--",
        "--ignored",
        "--test-threads=1"
    )
    .env("DATABASE_URL", container.database_url())
    .env("ROUTEBIND_TEST_BACKEND", "mariadb")
    .run_with_trace()
    .wrap_err("MariaDB backend validation tests failed")?;

    tracing::info!("MariaDB backend validation tests passed");
    Ok(())
}

/// Applies both migration sets to fresh databases and compares the
/// resulting schemas. Uses port 3308 so it can run beside `test-mariadb`.
fn verify_migrations() -> Result<()> {
    use diesel::{Connection, MysqlConnection, SqliteConnection};
    use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

    const SQLITE_MIGRATIONS: EmbeddedMigrations =
        embed_migrations!("../crates/persistence/migrations");
    const MYSQL_MIGRATIONS: EmbeddedMigrations =
        embed_migrations!("../crates/persistence/migrations_mysql");

    tracing::info!("Applying SQLite migrations");
    let mut sqlite_conn = SqliteConnection::establish(":memory:")
        .wrap_err("Failed to open in-memory SQLite database")?;
    sqlite_conn
        .run_pending_migrations(SQLITE_MIGRATIONS)
        .map_err(|e| color_eyre::eyre::eyre!("SQLite migrations failed: {e}"))?;
    let sqlite_schema = schema::introspect_sqlite(&mut sqlite_conn)?;

    let container = MariaDbContainer::start(
        "routebind-verify-migrations",
        "routebind_verify",
        "verify_password",
        3308,
    )?;

    tracing::info!("Applying MySQL migrations");
    let mut mysql_conn = MysqlConnection::establish(&container.database_url())
        .wrap_err("Failed to connect to MariaDB")?;
    mysql_conn
        .run_pending_migrations(MYSQL_MIGRATIONS)
        .map_err(|e| color_eyre::eyre::eyre!("MySQL migrations failed: {e}"))?;
    let mysql_schema = schema::introspect_mysql(&mut mysql_conn, container.database())?;

    schema::compare(&sqlite_schema, &mysql_schema)?;
    tracing::info!("Schema parity check passed");
    Ok(())
}

/// An extension trait for `duct::Expression` that logs the command being run
/// before running it.
trait ExpressionExt {
    /// Run the command and log the command being run
    fn run_with_trace(&self) -> io::Result<Output>;
}

impl ExpressionExt for duct::Expression {
    fn run_with_trace(&self) -> io::Result<Output> {
        tracing::info!("running command: {:?}", self);
        self.run().inspect_err(|_| {
            // The command that was run may have scrolled off the screen, so repeat it here
            tracing::error!("failed command: {:?}", self);
        })
    }
}
