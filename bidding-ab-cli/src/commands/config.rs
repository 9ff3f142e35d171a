//! Configuration commands

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use comfy_table::Cell;

use crate::config::{to_toml, ConfigLayer, ENV_PREFIX};
use crate::context::Context;
use crate::output::{print_field, OutputFormat, TableDisplay};

/// Configuration management commands
#[derive(Debug, Args)]
pub struct ConfigCommands {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective configuration after files and environment
    Show,

    /// List the configuration files consulted, lowest priority first
    Path,
}

/// Execute config command
pub fn execute(ctx: &Context, cmd: ConfigCommands) -> Result<()> {
    match cmd.command {
        ConfigSubcommand::Show => show(ctx),
        ConfigSubcommand::Path => path(ctx),
    }
}

fn show(ctx: &Context) -> Result<()> {
    match ctx.output.format() {
        OutputFormat::Table | OutputFormat::Compact => {
            print!("{}", to_toml(&ctx.config)?);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&ctx.config)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(&ctx.config)?);
        }
    }
    Ok(())
}

fn path(ctx: &Context) -> Result<()> {
    let layers = ctx.paths.layers();
    ctx.output.write_list(&layers, &["Layer", "Path", "Found"])?;
    ctx.output.info(&format!(
        "Environment overrides: {}__<SECTION>__<KEY>, e.g. {}__ANALYSIS__ALPHA=0.01",
        ENV_PREFIX, ENV_PREFIX
    ));
    Ok(())
}

impl TableDisplay for ConfigLayer {
    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::new(self.name),
            Cell::new(self.path.display()),
            Cell::new(if self.exists { "yes" } else { "no" }),
        ]
    }

    fn display_single(&self) {
        let found = if self.exists {
            "found".green()
        } else {
            "missing".dimmed()
        };
        print_field(self.name, &format!("{} ({})", self.path.display(), found));
    }

    fn display_compact(&self) {
        println!("{}\t{}\t{}", self.name, self.path.display(), self.exists);
    }
}
