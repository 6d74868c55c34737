// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Disposable `MariaDB` containers for backend validation.

use std::thread::sleep;
use std::time::Duration;

use color_eyre::{eyre::Context, Result};
use duct::cmd;

use crate::ExpressionExt;

const READY_ATTEMPTS: u32 = 30;

/// A running `MariaDB` 11 container, stopped and removed on drop.
pub struct MariaDbContainer {
    name: &'static str,
    database: &'static str,
    user: &'static str,
    password: &'static str,
    port: u16,
}

impl MariaDbContainer {
    /// Starts a fresh container and waits until it accepts queries.
    ///
    /// Any leftover container with the same name is removed first.
    pub fn start(
        name: &'static str,
        database: &'static str,
        password: &'static str,
        port: u16,
    ) -> Result<Self> {
        cmd!("docker", "--version")
            .run_with_trace()
            .wrap_err("Docker is not available. Please install Docker.")?;

        let container = Self {
            name,
            database,
            user: "routebind",
            password,
            port,
        };
        container.remove();

        tracing::info!("Starting MariaDB container: {}", name);
        cmd!(
            "docker",
            "run",
            "--name",
            name,
            "-e",
            format!("MARIADB_DATABASE={database}"),
            "-e",
            format!("MARIADB_USER={}", container.user),
            "-e",
            format!("MARIADB_PASSWORD={password}"),
            "-e",
            "MARIADB_ROOT_PASSWORD=root_password",
            "-p",
            format!("{port}:3306"),
            "-d",
            "mariadb:11"
        )
        .run_with_trace()
        .wrap_err("Failed to start MariaDB container")?;

        container.wait_until_ready()?;
        Ok(container)
    }

    fn wait_until_ready(&self) -> Result<()> {
        tracing::info!("Waiting for MariaDB to be ready...");
        for attempt in 1..=READY_ATTEMPTS {
            sleep(Duration::from_secs(1));
            tracing::debug!("Connection attempt {}/{}", attempt, READY_ATTEMPTS);

            let ready = cmd!(
                "docker",
                "exec",
                self.name,
                "mariadb",
                "-u",
                self.user,
                format!("-p{}", self.password),
                "-e",
                "SELECT 1"
            )
            .stdout_null()
            .stderr_null()
            .run();

            if ready.is_ok() {
                tracing::info!("MariaDB is ready");
                return Ok(());
            }
        }

        Err(color_eyre::eyre::eyre!(
            "MariaDB did not become ready within {READY_ATTEMPTS} seconds"
        ))
    }

    /// Connection URL for diesel and the test suite.
    pub fn database_url(&self) -> String {
        format!(
            "mysql://{}:{}@127.0.0.1:{}/{}",
            self.user, self.password, self.port, self.database
        )
    }

    pub const fn database(&self) -> &'static str {
        self.database
    }

    fn remove(&self) {
        let _ = cmd!("docker", "stop", self.name)
            .stdout_null()
            .stderr_null()
            .run();
        let _ = cmd!("docker", "rm", self.name)
            .stdout_null()
            .stderr_null()
            .run();
    }
}

impl Drop for MariaDbContainer {
    fn drop(&mut self) {
        tracing::info!("Stopping MariaDB container {}", self.name);
        self.remove();
    }
}
