//! Composite resolution over the real stores.

use std::{fs, sync::Arc, thread};

use tempfile::TempDir;
use tplres_adapters::{ByteSource, FileSystemSource, StringSource};
use tplres_core::prelude::*;

fn name(raw: &str) -> TemplateName {
    TemplateName::new(raw).unwrap()
}

fn load(source: &dyn Source, raw: &str) -> LoadingResult {
    with_session(source, |session| source.load(&name(raw), None, None, session))
        .into_result()
        .unwrap()
}

/// Content of a found template, `None` for `NotFound`.
fn text(source: &dyn Source, raw: &str) -> Option<String> {
    load(source, raw)
        .into_loaded()
        .map(|loaded| loaded.content.into_string().unwrap())
}

fn composite(s1: &StringSource, s2: &ByteSource, sticky: bool) -> MultiSource {
    MultiSource::builder()
        .source(s1.clone())
        .source(s2.clone())
        .sticky(sticky)
        .build()
}

fn stores() -> (StringSource, ByteSource) {
    let s1 = StringSource::new();
    s1.put("1.ftl", "1").unwrap();
    s1.put("both.ftl", "both 1").unwrap();

    let s2 = ByteSource::new();
    s2.put("2.ftl", b"2".to_vec()).unwrap();
    s2.put("both.ftl", b"both 2".to_vec()).unwrap();
    (s1, s2)
}

#[test]
fn basic_composition() {
    let (s1, s2) = stores();
    let multi = composite(&s1, &s2, true);

    assert_eq!(text(&multi, "1.ftl").as_deref(), Some("1"));
    assert_eq!(text(&multi, "2.ftl").as_deref(), Some("2"));
    assert_eq!(text(&multi, "both.ftl").as_deref(), Some("both 1"));
    assert_eq!(text(&multi, "neither.ftl"), None);
}

#[test]
fn results_carry_the_winning_source() {
    let (s1, s2) = stores();
    let multi = composite(&s1, &s2, false);

    assert_eq!(load(&multi, "1.ftl").source(), Some(s1.id()));
    assert_eq!(load(&multi, "2.ftl").source(), Some(s2.id()));
    assert_eq!(load(&multi, "both.ftl").source(), Some(s1.id()));
}

#[test]
fn sticky_pin_survives_until_its_source_stops_answering() {
    let (s1, s2) = stores();
    let multi = composite(&s1, &s2, true);

    assert_eq!(text(&multi, "both.ftl").as_deref(), Some("both 1"));
    assert_eq!(multi.pinned(&name("both.ftl")), Some(s1.id()));

    assert!(s1.remove("both.ftl"));
    assert_eq!(text(&multi, "both.ftl").as_deref(), Some("both 2"));
    assert_eq!(multi.pinned(&name("both.ftl")), Some(s2.id()));

    s1.put("both.ftl", "both 1").unwrap();
    assert_eq!(text(&multi, "both.ftl").as_deref(), Some("both 2"));

    assert!(s2.remove("both.ftl"));
    assert_eq!(text(&multi, "both.ftl").as_deref(), Some("both 1"));
    assert_eq!(multi.pinned(&name("both.ftl")), Some(s1.id()));
}

#[test]
fn non_sticky_always_prefers_configured_order() {
    let (s1, s2) = stores();
    let multi = composite(&s1, &s2, false);

    assert_eq!(text(&multi, "both.ftl").as_deref(), Some("both 1"));

    assert!(s1.remove("both.ftl"));
    assert_eq!(text(&multi, "both.ftl").as_deref(), Some("both 2"));

    s1.put("both.ftl", "both 1").unwrap();
    assert_eq!(text(&multi, "both.ftl").as_deref(), Some("both 1"));

    assert!(s2.remove("both.ftl"));
    assert_eq!(text(&multi, "both.ftl").as_deref(), Some("both 1"));
    assert_eq!(multi.pinned(&name("both.ftl")), None);
}

#[test]
fn disabling_sticky_restores_first_match() {
    let (s1, s2) = stores();
    let multi = composite(&s1, &s2, true);

    s1.remove("both.ftl");
    assert_eq!(text(&multi, "both.ftl").as_deref(), Some("both 2"));
    s1.put("both.ftl", "both 1").unwrap();
    assert_eq!(text(&multi, "both.ftl").as_deref(), Some("both 2"));

    multi.set_sticky(false);
    assert_eq!(text(&multi, "both.ftl").as_deref(), Some("both 1"));
}

#[test]
fn from_scratch_resolution_picks_the_earliest_holder() {
    let stores: Vec<StringSource> = (0..4).map(|_| StringSource::new()).collect();
    for (i, store) in stores.iter().enumerate().skip(1) {
        store.put("shared.ftl", format!("from {i}")).unwrap();
    }
    let mut builder = MultiSource::builder();
    for store in &stores {
        builder = builder.source(store.clone());
    }
    let multi = builder.build();

    assert_eq!(text(&multi, "shared.ftl").as_deref(), Some("from 1"));
    multi.clear_sticky();
    stores[0].put("shared.ftl", "from 0").unwrap();
    assert_eq!(text(&multi, "shared.ftl").as_deref(), Some("from 0"));
}

#[test]
fn not_modified_flows_through_the_composite() {
    for sticky in [true, false] {
        let (s1, s2) = stores();
        let multi = composite(&s1, &s2, sticky);

        let first = load(&multi, "2.ftl");
        let source = first.source().cloned().unwrap();
        let version = first.version().cloned().unwrap();

        let again = with_session(&multi, |session| {
            multi.load(&name("2.ftl"), Some(&source), Some(&version), session)
        })
        .into_result()
        .unwrap();
        assert!(
            matches!(again, LoadingResult::NotModified(ref id) if *id == source),
            "sticky = {sticky}"
        );

        s2.put("2.ftl", b"2 again".to_vec()).unwrap();
        let changed = with_session(&multi, |session| {
            multi.load(&name("2.ftl"), Some(&source), Some(&version), session)
        })
        .into_result()
        .unwrap();
        assert_eq!(changed.into_loaded().unwrap().content.into_string().unwrap(), "2 again");
    }
}

#[test]
fn many_loads_share_one_session() {
    let (s1, s2) = stores();
    let multi = composite(&s1, &s2, true);

    let outcome = with_session(&multi, |session| {
        let mut found = 0;
        for raw in ["1.ftl", "2.ftl", "both.ftl", "neither.ftl", "1.ftl"] {
            if multi.load(&name(raw), None, None, session)?.is_found() {
                found += 1;
            }
        }
        Ok(found)
    });
    assert!(outcome.release_error().is_none());
    assert_eq!(outcome.into_result().unwrap(), 4);
}

#[test]
fn released_session_cannot_be_reused() {
    let (s1, s2) = stores();
    let multi = composite(&s1, &s2, true);

    let mut session = multi.open_session().unwrap();
    assert!(multi.load(&name("1.ftl"), None, None, &mut session).unwrap().is_found());
    session.release().unwrap();
    session.release().unwrap();
    assert!(matches!(
        multi.load(&name("1.ftl"), None, None, &mut session),
        Err(SourceError::SessionReleased { .. })
    ));
}

#[test]
fn filesystem_and_memory_stores_compose() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("mail")).unwrap();
    fs::write(dir.path().join("mail/welcome.ftl"), "from disk").unwrap();
    fs::write(dir.path().join("footer.ftl"), "disk footer").unwrap();

    let overrides = StringSource::new();
    overrides.put("footer.ftl", "override footer").unwrap();

    let multi = MultiSource::builder()
        .source(overrides)
        .source(FileSystemSource::new(dir.path()).unwrap())
        .build();

    assert_eq!(text(&multi, "footer.ftl").as_deref(), Some("override footer"));
    assert_eq!(text(&multi, "mail/welcome.ftl").as_deref(), Some("from disk"));
    assert_eq!(text(&multi, "mail"), None);

    let listed: Vec<String> = multi
        .list()
        .unwrap()
        .unwrap()
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(listed, ["footer.ftl", "mail/welcome.ftl"]);
}

#[test]
fn nested_composites_resolve_in_order() {
    let (s1, s2) = stores();
    let inner = composite(&s1, &s2, true);
    let fallback = StringSource::new();
    fallback.put("fallback.ftl", "last").unwrap();
    fallback.put("both.ftl", "never").unwrap();

    let outer = MultiSource::builder()
        .source(inner)
        .source(fallback.clone())
        .build();

    assert_eq!(text(&outer, "both.ftl").as_deref(), Some("both 1"));
    assert_eq!(text(&outer, "fallback.ftl").as_deref(), Some("last"));
    assert_eq!(load(&outer, "2.ftl").source(), Some(s2.id()));
    assert!(outer.owns(s2.id()));
    assert!(!outer.owns(&SourceId::allocate("elsewhere")));
}

#[test]
fn concurrent_loads_with_mutation() {
    let (s1, s2) = stores();
    let multi = Arc::new(composite(&s1, &s2, true));

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let multi = Arc::clone(&multi);
            thread::spawn(move || {
                for _ in 0..500 {
                    let got = text(&*multi, "both.ftl").unwrap();
                    assert!(got == "both 1" || got == "both 2", "unexpected {got}");
                    assert_eq!(text(&*multi, "1.ftl").as_deref(), Some("1"));
                }
            })
        })
        .collect();

    let writer = {
        let s1 = s1.clone();
        thread::spawn(move || {
            for _ in 0..200 {
                s1.remove("both.ftl");
                s1.put("both.ftl", "both 1").unwrap();
            }
        })
    };

    for handle in readers {
        handle.join().unwrap();
    }
    writer.join().unwrap();

    // Quiescent state: both stores answer, so whichever is pinned is valid.
    let settled = text(&*multi, "both.ftl").unwrap();
    assert!(settled == "both 1" || settled == "both 2");
    multi.set_sticky(false);
    assert_eq!(text(&*multi, "both.ftl").as_deref(), Some("both 1"));
}
