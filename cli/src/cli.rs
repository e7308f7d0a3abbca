//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::app::{AppContext, AppFlags};
use crate::commands;
use crate::domain::{Action, Variant};

/// Deploy, restart or stop a tiered application across a fixed host fleet
#[derive(Parser, Debug)]
#[command(name = "fleet", version)]
pub struct Cli {
    /// Fleet file (default: $FLEET_CONFIG, then ./fleet.yaml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Login used on every host
    #[arg(short, long, env = "FLEET_USER")]
    pub user: Option<String>,

    /// Stop everything and exit
    #[arg(short = 'k', long = "kill", conflicts_with = "restart")]
    pub kill: bool,

    /// Restart without updating or rebuilding
    #[arg(short, long)]
    pub restart: bool,

    /// Deploy the hierarchical variant (root, relays and leaves)
    #[arg(short = 'v', long = "vmb")]
    pub hierarchical: bool,

    /// Print tiers and ports without connecting to any host
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the interactive monitor and wait for workers
    #[arg(long)]
    pub headless: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,
}

impl Cli {
    /// What every host will do this run.
    #[must_use]
    pub fn action(&self) -> Action {
        if self.kill {
            Action::Stop
        } else if self.restart {
            Action::Restart
        } else {
            Action::Deploy
        }
    }

    #[must_use]
    pub fn variant(&self) -> Variant {
        if self.hierarchical {
            Variant::Hierarchical
        } else {
            Variant::Flat
        }
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the fleet file is invalid or the run cannot start.
    pub async fn run(self) -> Result<()> {
        let app = AppContext::new(&AppFlags {
            no_color: self.no_color,
        });
        let opts = commands::deploy::DeployOptions {
            config: self.config.clone(),
            user: self.user.clone(),
            action: self.action(),
            variant: self.variant(),
            monitor: !self.headless && app.output.can_monitor(),
        };
        if self.dry_run {
            return commands::plan::run(&app, opts.config, opts.variant);
        }
        commands::deploy::run(&app, opts).await
    }
}
