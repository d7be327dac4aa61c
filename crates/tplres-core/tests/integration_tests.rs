//! Integration tests for tplres-core, driven only through the public API.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use tplres_core::prelude::*;

/// Fixed catalogue; every entry carries the same version.
struct Catalog {
    id: SourceId,
    version: Version,
    entries: HashMap<&'static str, &'static str>,
}

impl Catalog {
    fn new(version: &str, entries: &[(&'static str, &'static str)]) -> Self {
        Self {
            id: SourceId::allocate("catalog"),
            version: Version::new(version),
            entries: entries.iter().copied().collect(),
        }
    }
}

impl Source for Catalog {
    fn id(&self) -> &SourceId {
        &self.id
    }

    fn open_session(&self) -> SourceResult<SessionHandle> {
        Ok(SessionHandle::empty())
    }

    fn load(
        &self,
        name: &TemplateName,
        previous_source: Option<&SourceId>,
        previous_version: Option<&Version>,
        session: &mut SessionHandle,
    ) -> SourceResult<LoadingResult> {
        session.ensure_open(&self.id)?;
        let Some(body) = self.entries.get(name.as_str()) else {
            return Ok(LoadingResult::NotFound);
        };
        if previous_source == Some(&self.id) && previous_version == Some(&self.version) {
            return Ok(LoadingResult::NotModified(self.id.clone()));
        }
        Ok(LoadingResult::opened(
            self.id.clone(),
            Some(self.version.clone()),
            Content::from(*body),
        ))
    }

    fn list(&self) -> SourceResult<Option<Vec<TemplateName>>> {
        let mut names: Vec<_> = self
            .entries
            .keys()
            .map(TemplateName::new)
            .collect::<Result<_, _>>()?;
        names.sort();
        Ok(Some(names))
    }
}

fn name(raw: &str) -> TemplateName {
    TemplateName::new(raw).unwrap()
}

fn resolve(source: &dyn Source, raw: &str) -> LoadingResult {
    let name = name(raw);
    with_session(source, |session| source.load(&name, None, None, session))
        .into_result()
        .unwrap()
}

fn body(result: LoadingResult) -> String {
    result.into_loaded().unwrap().content.into_string().unwrap()
}

#[test]
fn composite_answers_like_a_single_store() {
    let site = Catalog::new("1", &[("footer.ftl", "site footer")]);
    let defaults = Catalog::new("1", &[("footer.ftl", "default"), ("header.ftl", "default")]);
    let (site_id, defaults_id) = (site.id().clone(), defaults.id().clone());

    let multi = MultiSource::builder().source(site).source(defaults).build();

    let footer = resolve(&multi, "footer.ftl");
    assert_eq!(footer.source(), Some(&site_id));
    assert_eq!(body(footer), "site footer");

    let header = resolve(&multi, "header.ftl");
    assert_eq!(header.source(), Some(&defaults_id));
    assert_eq!(resolve(&multi, "nope.ftl").status(), LoadingStatus::NotFound);
}

#[test]
fn hints_from_a_member_yield_not_modified() {
    let site = Catalog::new("7", &[("a.ftl", "a")]);
    let site_id = site.id().clone();
    let multi = MultiSource::builder().source(site).build();

    let a = name("a.ftl");
    let result = with_session(&multi, |session| {
        multi.load(&a, Some(&site_id), Some(&Version::new("7")), session)
    })
    .into_result()
    .unwrap();
    assert!(matches!(result, LoadingResult::NotModified(ref id) if *id == site_id));

    let stale = with_session(&multi, |session| {
        multi.load(&a, Some(&site_id), Some(&Version::new("6")), session)
    })
    .into_result()
    .unwrap();
    assert_eq!(stale.status(), LoadingStatus::Opened);
}

#[test]
fn composites_nest() {
    let inner = MultiSource::builder()
        .source(Catalog::new("1", &[("a.ftl", "inner")]))
        .build();
    let outer = MultiSource::builder()
        .source(Catalog::new("1", &[("b.ftl", "first")]))
        .source(inner)
        .build();

    assert_eq!(body(resolve(&outer, "a.ftl")), "inner");
    assert_eq!(body(resolve(&outer, "b.ftl")), "first");

    let listed = outer.list().unwrap().unwrap();
    assert_eq!(listed, vec![name("a.ftl"), name("b.ftl")]);
}

#[test]
fn shared_composite_serves_many_threads() {
    let multi = Arc::new(
        MultiSource::builder()
            .source(Catalog::new("1", &[("a.ftl", "a")]))
            .source(Catalog::new("1", &[("a.ftl", "shadowed"), ("b.ftl", "b")]))
            .build(),
    );

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let multi = Arc::clone(&multi);
            thread::spawn(move || {
                for _ in 0..200 {
                    let raw = if i % 2 == 0 { "a.ftl" } else { "b.ftl" };
                    let expected = if i % 2 == 0 { "a" } else { "b" };
                    assert_eq!(body(resolve(&*multi, raw)), expected);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(multi.pinned(&name("a.ftl")).is_some());
    assert!(multi.pinned(&name("b.ftl")).is_some());
}
