//! Docker container management for MySQL testing

use crate::client::{new_mysql_pool, ConnectionOpts};
use anyhow::{Context, Result};
use mysql_async::prelude::*;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const ROOT_PASSWORD: &str = "testpass";
const DATABASE: &str = "foodDelivery";

/// A throwaway MySQL 8 server running in Docker.
///
/// The container is stopped and removed when the value is dropped.
pub struct MySQLContainer {
    pub container_name: String,
    pub host_port: u16,
    pub image_name: String,
}

impl MySQLContainer {
    pub fn new(container_name: &str, host_port: u16) -> Self {
        Self {
            container_name: container_name.to_string(),
            host_port,
            image_name: "mysql:8.0".to_string(),
        }
    }

    /// Connection parameters for the container's database.
    pub fn connection_opts(&self) -> ConnectionOpts {
        ConnectionOpts {
            host: "127.0.0.1".to_string(),
            port: self.host_port,
            database: DATABASE.to_string(),
            username: "root".to_string(),
            password: ROOT_PASSWORD.to_string(),
        }
    }

    /// Start the container, replacing any leftover one with the same name.
    pub fn start(&self) -> Result<()> {
        info!("Starting MySQL container: {}", self.container_name);
        self.remove_quietly();

        let output = Command::new("docker")
            .args([
                "run",
                "--name",
                &self.container_name,
                "-e",
                &format!("MYSQL_ROOT_PASSWORD={ROOT_PASSWORD}"),
                "-e",
                &format!("MYSQL_DATABASE={DATABASE}"),
                "-p",
                &format!("{}:3306", self.host_port),
                "-d",
                &self.image_name,
            ])
            .output()
            .context("Failed to start Docker container")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Failed to start container: {stderr}");
        }

        let container_id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!("Started container: {}", container_id);
        Ok(())
    }

    /// Poll until the server accepts connections or `timeout` elapses.
    pub async fn wait_until_ready(&self, timeout: Duration) -> Result<()> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            match self.ping().await {
                Ok(()) => {
                    info!("MySQL is ready after {:?}", start.elapsed());
                    return Ok(());
                }
                Err(e) => {
                    debug!("MySQL not ready yet: {e:#}");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
        anyhow::bail!("MySQL did not become ready within {timeout:?}")
    }

    /// Run setup statements (DDL and seed rows) against the database.
    pub async fn execute(&self, statements: &[&str]) -> Result<()> {
        let pool = new_mysql_pool(&self.connection_opts());
        let mut conn = pool.get_conn().await.context("Failed to get connection")?;
        for statement in statements {
            conn.query_drop(*statement)
                .await
                .with_context(|| format!("Failed to execute: {statement}"))?;
        }
        drop(conn);
        pool.disconnect().await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let pool = new_mysql_pool(&self.connection_opts());
        let mut conn = pool.get_conn().await?;
        let _: Option<i32> = conn.query_first("SELECT 1").await?;
        drop(conn);
        pool.disconnect().await?;
        Ok(())
    }

    pub fn stop(&self) {
        info!("Stopping container: {}", self.container_name);
        self.remove_quietly();
    }

    fn remove_quietly(&self) {
        for action in ["stop", "rm"] {
            let status = Command::new("docker")
                .args([action, &self.container_name])
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
            if let Err(e) = status {
                debug!("docker {action} {} failed: {e}", self.container_name);
            }
        }
    }
}

impl Drop for MySQLContainer {
    fn drop(&mut self) {
        self.stop();
    }
}
