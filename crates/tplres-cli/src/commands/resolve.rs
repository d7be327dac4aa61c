//! `tplres resolve` - look one template name up.

use serde::Serialize;
use std::path::Path;
use tracing::{info, instrument};

use tplres_core::{
    application::{ports::Source, session::with_session},
    domain::{LoadingResult, LoadingStatus, SourceId, TemplateName, Version},
    error::{SourceError, SourceResult},
};

use crate::{
    cli::{OutputFormat, ResolveArgs},
    commands::Resolver,
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// What one resolution produced, with the content already read.
#[derive(Debug)]
enum Resolved {
    Missing,
    Unchanged(SourceId),
    Found {
        source: SourceId,
        version: Option<Version>,
        content: Option<Vec<u8>>,
    },
}

/// JSON shape of a resolution.
#[derive(Serialize)]
struct Report<'a> {
    name: &'a str,
    status: String,
    source: Option<&'a SourceId>,
    root: Option<&'a Path>,
    version: Option<&'a Version>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[instrument(skip_all, fields(name = %args.name))]
pub fn execute(args: ResolveArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let name = TemplateName::new(&args.name)?;
    let resolver = Resolver::from_args(&args.sources, &config)?;

    let previous_source = args.if_source.map(SourceId::from_raw);
    let previous_version = args.if_version.map(Version::new);
    if let Some(id) = &previous_source {
        if resolver.root_of(id).is_none() {
            output.warning(&format!(
                "'{id}' is not one of the configured directories, resolving from scratch"
            ))?;
        }
    }

    let multi = &resolver.multi;
    let resolved = with_session(multi, |session| {
        let result = multi.load(
            &name,
            previous_source.as_ref(),
            previous_version.as_ref(),
            session,
        )?;
        // Content is read while the session is still open.
        read(result, &name, !args.meta_only)
    })
    .into_result()
    .with_cli_context(|| format!("resolving '{name}'"))?;

    report(&name, resolved, &resolver, &output)
}

fn read(result: LoadingResult, name: &TemplateName, want_content: bool) -> SourceResult<Resolved> {
    Ok(match result {
        LoadingResult::NotFound => Resolved::Missing,
        LoadingResult::NotModified(source) => Resolved::Unchanged(source),
        LoadingResult::Opened(loaded) => {
            let content = if want_content {
                let bytes = loaded
                    .content
                    .into_bytes()
                    .map_err(|e| SourceError::io(&loaded.source, name.as_str(), e))?;
                Some(bytes)
            } else {
                None
            };
            Resolved::Found {
                source: loaded.source,
                version: loaded.version,
                content,
            }
        }
    })
}

fn report(
    name: &TemplateName,
    resolved: Resolved,
    resolver: &Resolver,
    output: &OutputManager,
) -> CliResult<()> {
    let (status, source, version, content) = match &resolved {
        Resolved::Missing => {
            return Err(CliError::TemplateNotFound {
                name: name.to_string(),
                searched: resolver.roots().map(|(_, root)| root.to_path_buf()).collect(),
            });
        }
        Resolved::Unchanged(source) => (LoadingStatus::NotModified, source, None, None),
        Resolved::Found {
            source,
            version,
            content,
        } => (LoadingStatus::Opened, source, version.as_ref(), content.as_deref()),
    };
    let root = resolver.root_of(source);
    info!(%status, %source, "resolved");

    if output.format() == OutputFormat::Json {
        return Ok(output.json(&Report {
            name: name.as_str(),
            status: status.to_string(),
            source: Some(source),
            root,
            version,
            content: content.map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
        })?);
    }

    match content {
        // Piped or plain output carries only the template itself.
        Some(bytes) if output.format() == OutputFormat::Plain => output.data(bytes)?,
        _ => {
            match status {
                LoadingStatus::NotModified => output.success(&format!("{name} is not modified"))?,
                _ => output.header(name.as_str())?,
            }
            output.field("source", source.as_str())?;
            if let Some(root) = root {
                output.field("root", &root.display().to_string())?;
            }
            if let Some(version) = version {
                output.field("version", version.as_str())?;
            }
            if let Some(bytes) = content {
                output.print("")?;
                output.data(bytes)?;
            }
        }
    }
    Ok(())
}
