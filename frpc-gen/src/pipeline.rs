// SPDX-License-Identifier: AGPL-3.0-or-later
//! Generation pipeline
//!
//! Loads the configuration and template, renders every artifact in memory,
//! then writes them in a fixed order while reporting progress. Loading and
//! validation failures abort the run before any file is touched.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::{Config, Server, DEFAULT_CONFIG_FILE};
use crate::error::{GenError, Result};
use crate::generate::{ComposeFile, EnvTemplate, ServerNames, PREAMBLE_SERVICE};
use crate::template::{Template, DEFAULT_TEMPLATE_FILE, LOCATION_PLACEHOLDER};

/// Composed deployment descriptor file name
pub const COMPOSE_FILE: &str = "docker-compose.yml";

/// Environment template file name
pub const ENV_TEMPLATE_FILE: &str = ".env.example";

/// Inputs and switches for a single run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Path to `frp-servers.json`
    pub config_path: PathBuf,
    /// Path to the frpc template
    pub template_path: PathBuf,
    /// Directory the generated files are written to
    pub output_dir: PathBuf,
    /// Fail when the template has no location placeholder
    pub strict_template: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            template_path: PathBuf::from(DEFAULT_TEMPLATE_FILE),
            output_dir: PathBuf::from("."),
            strict_template: false,
        }
    }
}

/// Stages of a run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Loading,
    TemplateLoaded,
    Rendering,
    Writing,
    Done,
}

impl fmt::Display for RunStage {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStage::Loading => write!(formatter, "loading"),
            RunStage::TemplateLoaded => write!(formatter, "template-loaded"),
            RunStage::Rendering => write!(formatter, "rendering"),
            RunStage::Writing => write!(formatter, "writing"),
            RunStage::Done => write!(formatter, "done"),
        }
    }
}

/// What kind of file an artifact is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Rendered frpc template for one server
    ClientConfig,
    /// `docker-compose.yml`
    Compose,
    /// `.env.example`
    EnvTemplate,
}

/// A generated file, not yet written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub filename: String,
    pub content: String,
}

impl Artifact {
    /// Overwrite `dir/filename` with the artifact content
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.content).map_err(|source| GenError::WriteFailed {
            path: path.display().to_string(),
            source,
        })?;
        Ok(path)
    }
}

/// Renders every artifact for the enabled servers of a configuration
pub struct Generator<'a> {
    config: &'a Config,
    template: &'a Template,
    servers: Vec<&'a Server>,
}

impl<'a> Generator<'a> {
    /// Create a generator over the enabled servers of `config`
    pub fn new(config: &'a Config, template: &'a Template) -> Self {
        Self {
            config,
            template,
            servers: config.enabled_servers().collect(),
        }
    }

    /// Enabled servers, in document order
    pub fn servers(&self) -> &[&'a Server] {
        &self.servers
    }

    /// Render all artifacts: one config file per server, then the compose
    /// file, then the environment template
    pub fn render(&self) -> Vec<Artifact> {
        if !self.servers.is_empty() && !self.template.has_placeholder() {
            warn!(
                template = %self.template.path().display(),
                "Template has no {} placeholder, config files will be identical",
                LOCATION_PLACEHOLDER
            );
        }

        let mut artifacts: Vec<Artifact> = self
            .servers
            .iter()
            .map(|server| Artifact {
                kind: ArtifactKind::ClientConfig,
                filename: ServerNames::for_server(server).config_file,
                content: self.template.render(server),
            })
            .collect();

        artifacts.push(Artifact {
            kind: ArtifactKind::Compose,
            filename: COMPOSE_FILE.to_string(),
            content: self.compose().to_string(),
        });

        artifacts.push(Artifact {
            kind: ArtifactKind::EnvTemplate,
            filename: ENV_TEMPLATE_FILE.to_string(),
            content: EnvTemplate::build(self.servers.iter().copied(), &self.config.proxy)
                .to_string(),
        });

        artifacts
    }

    /// The composed deployment descriptor
    pub fn compose(&self) -> ComposeFile {
        ComposeFile::build(
            self.servers.iter().copied(),
            &self.config.proxy,
            &self.config.deployment,
        )
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Generated frpc service keys with their display labels
    pub services: Vec<(String, String)>,
    /// Every file written, in write order
    pub written: Vec<PathBuf>,
}

/// Tracks the stage a run has reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    stage: RunStage,
}

impl Progress {
    pub fn new() -> Self {
        Self {
            stage: RunStage::Loading,
        }
    }

    /// Stage most recently entered
    pub fn stage(&self) -> RunStage {
        self.stage
    }

    fn enter(&mut self, stage: RunStage) {
        debug!(stage = %stage, "Pipeline stage");
        self.stage = stage;
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the full pipeline, printing progress lines to `out`
pub fn run<W: Write>(options: &RunOptions, out: &mut W) -> Result<RunSummary> {
    let mut progress = Progress::new();
    run_with_progress(options, out, &mut progress).map_err(|e| {
        warn!(stage = %progress.stage(), error = %e, "Generation aborted");
        e
    })
}

/// Run the full pipeline, recording each stage in `progress`
pub fn run_with_progress<W: Write>(
    options: &RunOptions,
    out: &mut W,
    progress: &mut Progress,
) -> Result<RunSummary> {
    writeln!(out, "🚀 Generating FRP configuration files...")?;

    progress.enter(RunStage::Loading);
    let config = Config::from_file(&options.config_path)?;
    let template = Template::from_file(&options.template_path)?;
    progress.enter(RunStage::TemplateLoaded);
    if options.strict_template {
        template.require_placeholder()?;
    }

    let generator = Generator::new(&config, &template);
    writeln!(out, "📋 Found {} enabled servers", generator.servers().len())?;
    info!(
        total = config.servers.len(),
        enabled = generator.servers().len(),
        "Configuration loaded"
    );

    progress.enter(RunStage::Rendering);
    let artifacts = generator.render();

    progress.enter(RunStage::Writing);
    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in &artifacts {
        if artifact.kind == ArtifactKind::Compose {
            writeln!(out, "🔄 Generating {}...", COMPOSE_FILE)?;
        }
        let path = artifact.write_to(&options.output_dir)?;
        debug!(path = %path.display(), bytes = artifact.content.len(), "Wrote file");
        writeln!(out, "✅ Generated {}", artifact.filename)?;
        written.push(path);
    }

    let services: Vec<(String, String)> = generator
        .servers()
        .iter()
        .map(|server| {
            let label = server.description.as_deref().unwrap_or(server.name.as_str());
            (ServerNames::for_server(server).service, label.to_string())
        })
        .collect();

    print_summary(out, &services)?;
    progress.enter(RunStage::Done);

    Ok(RunSummary { services, written })
}

fn print_summary<W: Write>(out: &mut W, services: &[(String, String)]) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "🎉 Configuration generation complete!")?;
    writeln!(out)?;
    writeln!(
        out,
        "📋 Generated services: {} + {} FRP clients",
        PREAMBLE_SERVICE,
        services.len()
    )?;
    for (service, label) in services {
        writeln!(out, "   - {} ({})", service, label)?;
    }
    writeln!(out)?;
    writeln!(out, "📝 Next steps:")?;
    writeln!(out, "1. Review and customize the generated files")?;
    writeln!(out, "2. Copy {} to .env and set your values", ENV_TEMPLATE_FILE)?;
    writeln!(out, "3. Run: docker compose up -d")?;
    Ok(())
}
