// SPDX-License-Identifier: AGPL-3.0-or-later
//! frpc-gen: generates frpc configs, docker-compose.yml and .env.example
//! from frp-servers.json.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use frpc_gen::{
    config::DEFAULT_CONFIG_FILE,
    pipeline::{self, RunOptions},
    template::DEFAULT_TEMPLATE_FILE,
};

/// frpc-gen: FRP multi-location configuration generator
///
/// Generates frpc configuration files and docker-compose services from
/// frp-servers.json.
#[derive(Parser, Debug)]
#[command(name = "frpc-gen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Server configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// frpc template file ({LOCATION} is replaced with the server name)
    #[arg(short, long, default_value = DEFAULT_TEMPLATE_FILE)]
    template: PathBuf,

    /// Directory to write generated files into
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Fail if the template has no {LOCATION} placeholder
    #[arg(long)]
    strict_template: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.debug)
        .with_writer(std::io::stderr)
        .init();

    let options = RunOptions {
        config_path: cli.config,
        template_path: cli.template,
        output_dir: cli.output_dir,
        strict_template: cli.strict_template,
    };

    let mut stdout = std::io::stdout().lock();
    pipeline::run(&options, &mut stdout).with_context(|| {
        format!(
            "Failed to generate configuration from {}",
            options.config_path.display()
        )
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["frpc-gen"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("frp-servers.json"));
        assert_eq!(cli.template, PathBuf::from("frpc_template.toml"));
        assert_eq!(cli.output_dir, PathBuf::from("."));
        assert!(!cli.strict_template);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_paths() {
        let cli = Cli::try_parse_from([
            "frpc-gen",
            "-c",
            "servers.json",
            "--template",
            "tpl.toml",
            "-o",
            "out",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("servers.json"));
        assert_eq!(cli.template, PathBuf::from("tpl.toml"));
        assert_eq!(cli.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from(["frpc-gen", "-v", "--strict-template"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.strict_template);
    }
}
