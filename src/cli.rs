//! Command-line arguments for the identicon binaries.

use crate::config::{ClientConfig, ServerConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// identicon-server: serve per-user identicon lists over HTTP
#[derive(Parser, Debug)]
#[command(name = "identicon-server", version)]
pub struct ServerArgs {
    /// JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,

    /// Path to the redb database file
    #[arg(long)]
    pub database: Option<PathBuf>,
}

impl ServerArgs {
    pub fn apply(&self, config: &mut ServerConfig) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(ref database) = self.database {
            config.database = database.clone();
        }
    }
}

/// identicon: manage your saved identicons, online or offline
#[derive(Parser, Debug)]
#[command(name = "identicon", version)]
pub struct ClientArgs {
    /// JSON config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Server base URL
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Path to the local redb database file
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Bearer token for the API
    #[arg(long, global = true, env = "IDENTICON_TOKEN")]
    pub token: Option<String>,

    /// Treat the network as unavailable
    #[arg(long, global = true)]
    pub offline: bool,

    /// Print the list as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: ClientCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// Sync and show the list
    List,
    /// Save a value
    Add { value: String },
    /// Remove a saved value
    Remove { value: String },
    /// Push pending local changes or refresh from the server
    Sync,
    /// Show sync state without touching the network
    Status,
    /// Push pending changes if possible, then clear the cached list
    Logout,
}

impl ClientArgs {
    pub fn apply(&self, config: &mut ClientConfig) {
        if let Some(ref server) = self.server {
            config.server_url = server.clone();
        }
        if let Some(ref database) = self.database {
            config.database = database.clone();
        }
        if let Some(ref token) = self.token {
            config.token = Some(token.clone());
        }
        if self.offline {
            config.offline = Some(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = ClientArgs::parse_from([
            "identicon",
            "--server",
            "http://example.test:8080",
            "--offline",
            "add",
            "alice",
        ]);
        assert_eq!(
            args.command,
            ClientCommand::Add {
                value: "alice".to_string()
            }
        );

        let mut config = ClientConfig::default();
        args.apply(&mut config);
        assert_eq!(config.server_url, "http://example.test:8080");
        assert_eq!(config.offline, Some(true));
    }

    #[test]
    fn test_server_port_override() {
        let args = ServerArgs::parse_from(["identicon-server", "--port", "4000"]);
        let mut config = ServerConfig::default();
        args.apply(&mut config);
        assert_eq!(config.port, 4000);
        assert_eq!(config.database, PathBuf::from("identicon-server.redb"));
    }
}
