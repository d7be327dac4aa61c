//! Command handlers, one module per subcommand.

pub mod completions;
pub mod config;
pub mod init;
pub mod list;
pub mod resolve;

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use tplres_adapters::FileSystemSource;
use tplres_core::{
    application::{MultiSource, ports::Source},
    domain::SourceId,
};

use crate::{
    cli::SourceArgs,
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
};

/// A composite over the configured template directories, remembering which
/// directory each member serves.
pub struct Resolver {
    pub multi: MultiSource,
    roots: Vec<(SourceId, PathBuf)>,
}

impl Resolver {
    /// Build from `--source` flags, falling back to `sources.paths`.
    #[instrument(skip_all)]
    pub fn from_args(args: &SourceArgs, config: &AppConfig) -> CliResult<Self> {
        let dirs = if args.sources.is_empty() {
            &config.sources.paths
        } else {
            &args.sources
        };
        if dirs.is_empty() {
            return Err(CliError::NoSources);
        }

        let mut builder = MultiSource::builder().sticky(config.sources.sticky && !args.no_sticky);
        let mut roots = Vec::with_capacity(dirs.len());
        for dir in dirs {
            let source = FileSystemSource::new(dir)
                .with_cli_context(|| format!("opening '{}'", dir.display()))?;
            roots.push((source.id().clone(), dir.clone()));
            builder = builder.source(source);
        }

        let multi = builder.build();
        debug!(resolver = %multi, sticky = multi.is_sticky(), "resolver ready");
        Ok(Self { multi, roots })
    }

    /// Directory served by the member `id`.
    pub fn root_of(&self, id: &SourceId) -> Option<&Path> {
        self.roots
            .iter()
            .find(|(member, _)| member == id)
            .map(|(_, root)| root.as_path())
    }

    /// Configured directories, in lookup order.
    pub fn roots(&self) -> impl Iterator<Item = (&SourceId, &Path)> {
        self.roots.iter().map(|(id, root)| (id, root.as_path()))
    }
}
