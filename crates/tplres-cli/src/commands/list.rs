//! Implementation of the `tplres list` command.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;
use tracing::instrument;

use tplres_core::{
    application::ports::Source,
    domain::{SourceId, TemplateName},
    error::SourceResult,
};

use crate::{
    cli::{ListArgs, ListFormat},
    commands::Resolver,
    config::AppConfig,
    error::{CliResult, IntoCli},
    output::OutputManager,
};

/// One resolvable name and the directory that answers it.
#[derive(Debug, Serialize)]
struct Listed<'a> {
    name: TemplateName,
    source: &'a SourceId,
    root: &'a Path,
    /// Later directories that also hold the name.
    shadowed: Vec<&'a Path>,
}

#[instrument(skip_all)]
pub fn execute(args: ListArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let resolver = Resolver::from_args(&args.sources, &config)?;
    let listed = winners(&resolver).with_cli_context(|| "listing templates")?;

    match args.format {
        ListFormat::Table => {
            output.header(&format!("Templates ({}):", listed.len()))?;
            for entry in &listed {
                let mut line = format!("  {:<32} {}", entry.name, entry.root.display());
                if !entry.shadowed.is_empty() {
                    line.push_str(&format!(" (shadows {})", entry.shadowed.len()));
                }
                output.print(&line)?;
            }
        }

        ListFormat::Json => {
            // JSON must stay parseable even in quiet mode.
            output.json(&listed)?;
        }

        ListFormat::List => {
            let names: String = listed.iter().map(|e| format!("{}\n", e.name)).collect();
            output.data(names.as_bytes())?;
        }
    }

    Ok(())
}

/// Every name the composite can enumerate, paired with the first directory
/// (in lookup order) that holds it.
fn winners(resolver: &Resolver) -> SourceResult<Vec<Listed<'_>>> {
    let names = resolver.multi.list()?.unwrap_or_default();

    // `sources()` and `roots()` are both in lookup order.
    let mut members = Vec::new();
    for (source, (id, root)) in resolver.multi.sources().iter().zip(resolver.roots()) {
        let held: BTreeSet<TemplateName> =
            source.list()?.unwrap_or_default().into_iter().collect();
        members.push((id, root, held));
    }

    Ok(names
        .into_iter()
        .filter_map(|name| {
            let mut holders = members.iter().filter(|(_, _, held)| held.contains(&name));
            let &(source, root, _) = holders.next()?;
            Some(Listed {
                shadowed: holders.map(|(_, root, _)| *root).collect(),
                name,
                source,
                root,
            })
        })
        .collect())
}
