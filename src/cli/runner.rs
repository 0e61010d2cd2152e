//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::TapConfig;
use crate::connector::{Connector, HubspotConnector};
use crate::error::{Error, Result};
use crate::output::SingerWriter;
use crate::state::StateManager;
use crate::streams::{builtin_catalog, load_catalog, StreamCatalog};
use serde_json::{json, Value};
use std::io::{self, BufWriter};
use std::path::Path;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Check => self.check().await,
            Commands::Discover => self.discover().await,
            Commands::Read {
                streams,
                state_out,
                no_state_per_page,
            } => {
                let streams = Commands::selected_streams(streams.as_deref());
                self.read(&streams, state_out.as_deref(), !*no_state_per_page)
                    .await
            }
            Commands::Streams => self.streams(),
        }
    }

    /// Load and validate the config file
    fn load_config(&self) -> Result<TapConfig> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Config file not specified (use -c flag)"))?;
        TapConfig::from_file(path)
    }

    /// Load the stream catalog, the built-in one unless a file is given
    fn load_catalog(&self) -> Result<StreamCatalog> {
        match &self.cli.catalog_file {
            Some(path) => load_catalog(path),
            None => builtin_catalog(),
        }
    }

    /// Load state from file or start empty
    fn load_state(&self) -> Result<StateManager> {
        match &self.cli.state {
            Some(path) => StateManager::from_file(path),
            None => Ok(StateManager::in_memory()),
        }
    }

    fn connector(&self) -> Result<HubspotConnector> {
        HubspotConnector::new(self.load_config()?, self.load_catalog()?)
    }

    // ========================================================================
    // Commands
    // ========================================================================

    async fn check(&self) -> Result<()> {
        let connector = self.connector()?;
        let result = connector.check().await?;

        let status = if result.success { "SUCCEEDED" } else { "FAILED" };
        output_message(&json!({
            "type": "CONNECTION_STATUS",
            "connectionStatus": {
                "status": status,
                "message": result.message.unwrap_or_else(|| "Connection successful".to_string())
            }
        }));

        if result.success {
            Ok(())
        } else {
            Err(Error::ConnectionCheck {
                message: "see connection status".to_string(),
            })
        }
    }

    async fn discover(&self) -> Result<()> {
        let connector = self.connector()?;
        let catalog = connector.discover().await?;
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        Ok(())
    }

    async fn read(
        &self,
        streams: &[String],
        state_out: Option<&Path>,
        state_per_page: bool,
    ) -> Result<()> {
        let connector = self.connector()?.with_state_per_page(state_per_page);
        let state = self.load_state()?;

        let mut writer = SingerWriter::new(BufWriter::new(io::stdout()));
        let stats = connector.read(streams, state.clone(), &mut writer).await?;
        writer.flush()?;

        if let Some(path) = state_out {
            state.save_to_file(path).await?;
            info!(path = %path.display(), "Wrote state");
        }

        info!(
            records = writer.records_written(),
            states = writer.states_written(),
            streams = stats.streams_synced,
            "Read finished"
        );
        Ok(())
    }

    fn streams(&self) -> Result<()> {
        let catalog = self.load_catalog()?;
        for def in &catalog.streams {
            output_message(&json!({
                "stream": def.name,
                "replication_method": def.replication_method(),
                "replication_key": def.replication_key,
                "parent": def.parent_stream(),
            }));
        }
        Ok(())
    }
}

fn output_message(msg: &Value) {
    println!("{}", serde_json::to_string(msg).unwrap_or_default());
}
