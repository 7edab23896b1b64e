//! End-to-end resolution and retrieval against file-backed and HTTP repositories.

mod test_utils;

use o3de_fetch::{
    refresh_repos, Error, GitCheckout, ManifestRegistrar, ObjectKind, Resolver, ResolverConfig,
    RetrieveOptions, Retriever,
};
use serde_json::json;
use std::fs;
use test_utils::{assertions, object_with_bundle, TestHome, TestRepository};

fn retrieve_into(
    home: &TestHome,
    kind: ObjectKind,
    name: &str,
    dest: Option<&std::path::Path>,
) -> o3de_fetch::Result<std::path::PathBuf> {
    let manifest = home.manifest();
    let fetcher = home.fetcher();
    let config = ResolverConfig::default();

    let descriptor = Resolver::new(&manifest, &fetcher, &config).resolve(kind, name)?;
    let checkout = GitCheckout::default();
    let registrar = ManifestRegistrar::new(&home.home);
    Retriever::new(&manifest, &fetcher, &checkout, &registrar).retrieve(
        &descriptor,
        dest,
        RetrieveOptions::default(),
    )
}

#[test]
fn test_download_gem_into_default_folder() {
    let home = TestHome::new();
    let mut repo = TestRepository::new(&home.path().join("remote/r"), "R");
    repo.add_object(
        ObjectKind::Gem,
        "Foo",
        &[("Code/Source/Foo.cpp", "// foo"), ("README.md", "# Foo")],
    );
    home.register_repos(&[repo.uri()]);

    let dest = retrieve_into(&home, ObjectKind::Gem, "Foo", None).unwrap();

    assert_eq!(dest, home.home.join("O3DE/Gems/R/Foo"));
    assertions::file_exists(&dest.join("gem.json"));
    assertions::file_contains(&dest.join("Code/Source/Foo.cpp"), "// foo");

    let manifest = home.manifest();
    assert_eq!(
        manifest.registered(ObjectKind::Gem),
        &[dest.to_string_lossy().replace('\\', "/")]
    );
}

#[test]
fn test_download_from_nested_repository() {
    let home = TestHome::new();
    let mut inner = TestRepository::new(&home.path().join("remote/inner"), "Inner");
    inner.add_object(ObjectKind::Project, "Bar", &[("Bar.txt", "bar")]);
    let mut outer = TestRepository::new(&home.path().join("remote/outer"), "Outer");
    outer.add_nested(&inner.uri());
    home.register_repos(&[outer.uri()]);

    let dest = retrieve_into(&home, ObjectKind::Project, "Bar", None).unwrap();
    assert_eq!(dest, home.home.join("O3DE/Projects/Inner/Bar"));
    assertions::file_contains(&dest.join("Bar.txt"), "bar");
}

#[test]
fn test_checksum_mismatch_removes_cached_bundle() {
    let home = TestHome::new();
    let mut repo = TestRepository::new(&home.path().join("remote/r"), "R");
    repo.add_object(ObjectKind::Gem, "Foo", &[("a.txt", "a")]);
    repo.tamper_bundle(ObjectKind::Gem, "Foo");
    home.register_repos(&[repo.uri()]);

    let err = retrieve_into(&home, ObjectKind::Gem, "Foo", None).unwrap_err();
    assert!(matches!(err, Error::Integrity(_)));

    let zips: Vec<_> = fs::read_dir(home.cache_dir())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "zip"))
        .collect();
    assert!(zips.is_empty(), "cached bundle should be deleted");
    assertions::dir_not_exists(&home.home.join("O3DE/Gems/R/Foo"));
    assert!(home.manifest().registered(ObjectKind::Gem).is_empty());
}

#[test]
fn test_destination_conflict_leaves_contents_unchanged() {
    let home = TestHome::new();
    let mut repo = TestRepository::new(&home.path().join("remote/r"), "R");
    repo.add_object(ObjectKind::Gem, "Foo", &[("a.txt", "a")]);
    home.register_repos(&[repo.uri()]);

    let dest = home.path().join("existing");
    fs::create_dir_all(&dest).unwrap();
    fs::write(dest.join("mine.txt"), "untouched").unwrap();

    let err = retrieve_into(&home, ObjectKind::Gem, "Foo", Some(&dest)).unwrap_err();
    assert!(matches!(err, Error::DestinationConflict(_)));
    assert_eq!(fs::read_dir(&dest).unwrap().count(), 1);
    assertions::file_contains(&dest.join("mine.txt"), "untouched");
}

#[test]
fn test_not_found_only_caches_indexes() {
    let home = TestHome::new();
    let mut repo = TestRepository::new(&home.path().join("remote/r"), "R");
    repo.add_object(ObjectKind::Gem, "Foo", &[("a.txt", "a")]);
    home.register_repos(&[repo.uri()]);
    let before = home.files();

    let err = retrieve_into(&home, ObjectKind::Gem, "Missing", None).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
    assert!(err.to_string().contains("Missing"));

    let added: Vec<_> = home
        .files()
        .into_iter()
        .filter(|f| !before.contains(f))
        .collect();
    assert!(!added.is_empty());
    for file in added {
        assert!(file.starts_with(".o3de/Cache"), "unexpected file {:?}", file);
        assert_eq!(file.extension().unwrap(), "json");
    }
    assertions::dir_not_exists(&home.home.join("O3DE"));
}

#[test]
fn test_cyclic_repositories_terminate() {
    let home = TestHome::new();
    let mut a = TestRepository::new(&home.path().join("remote/a"), "A");
    let mut b = TestRepository::new(&home.path().join("remote/b"), "B");
    a.add_nested(&b.uri());
    b.add_nested(&a.uri());
    b.add_object(ObjectKind::Template, "Tpl", &[("template.txt", "t")]);
    home.register_repos(&[a.uri()]);

    let manifest = home.manifest();
    let fetcher = home.fetcher();
    let config = ResolverConfig::default();
    let resolver = Resolver::new(&manifest, &fetcher, &config);

    let mut visited = o3de_fetch::VisitedSet::new();
    let err = resolver
        .resolve_in(ObjectKind::Gem, "Nothing", &mut visited)
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
    assert_eq!(visited.len(), 2);

    let found = resolver.resolve(ObjectKind::Template, "Tpl").unwrap();
    assert_eq!(found.repo_name.as_deref(), Some("B"));
}

#[test]
fn test_bundle_served_once_over_http() {
    let mut server = mockito::Server::new();
    let base = server.url();
    let origin = format!("{}/Foo", base);
    let (descriptor, bundle) =
        object_with_bundle(ObjectKind::Gem, "Foo", &origin, &[("a.txt", "from http")]);

    let _index = server
        .mock("GET", "/repo.json")
        .with_status(200)
        .with_body(
            json!({
                "repo_name": "Remote",
                "origin": base,
                "gems": [origin],
            })
            .to_string(),
        )
        .create();
    let _descriptor = server
        .mock("GET", "/Foo/gem.json")
        .with_status(200)
        .with_body(descriptor.to_string())
        .create();
    let bundle_mock = server
        .mock("GET", "/Foo/gem.zip")
        .with_status(200)
        .with_body(bundle)
        .expect(1)
        .create();

    let home = TestHome::new();
    home.register_repos(&[base.clone()]);

    let first = retrieve_into(&home, ObjectKind::Gem, "Foo", Some(&home.path().join("one")))
        .unwrap();
    let second = retrieve_into(&home, ObjectKind::Gem, "Foo", Some(&home.path().join("two")))
        .unwrap();

    bundle_mock.assert();
    assertions::file_contains(&first.join("a.txt"), "from http");
    assertions::file_contains(&second.join("a.txt"), "from http");
    assert_eq!(home.manifest().registered(ObjectKind::Gem).len(), 2);
}

#[test]
fn test_refresh_with_invalid_first_repository_fails() {
    let home = TestHome::new();
    let mut bad = TestRepository::new(&home.path().join("remote/bad"), "Bad");
    bad.set_index(json!({"repo_name": "Bad", "gems": "not-a-list", "origin": "x"}));
    let mut good = TestRepository::new(&home.path().join("remote/good"), "Good");
    good.add_object(ObjectKind::Gem, "Foo", &[("a.txt", "a")]);
    home.register_repos(&[bad.uri(), good.uri()]);

    let manifest = home.manifest();
    let fetcher = home.fetcher();
    let err = refresh_repos(&manifest, &fetcher, &ResolverConfig::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidRepository { .. }));
}

#[test]
fn test_refresh_then_resolve_uses_cache() {
    let home = TestHome::new();
    let mut repo = TestRepository::new(&home.path().join("remote/r"), "R");
    repo.add_object(ObjectKind::Gem, "Foo", &[("a.txt", "a")]);
    home.register_repos(&[repo.uri()]);

    let manifest = home.manifest();
    let fetcher = home.fetcher();
    let summary = refresh_repos(&manifest, &fetcher, &ResolverConfig::default()).unwrap();
    assert_eq!(summary.repositories, 1);
    assert_eq!(summary.descriptors, 1);

    // The remote vanishes; resolution is served from the refreshed cache
    fs::remove_dir_all(home.path().join("remote")).unwrap();
    let config = ResolverConfig::default();
    let found = Resolver::new(&manifest, &fetcher, &config)
        .resolve(ObjectKind::Gem, "Foo")
        .unwrap();
    assert_eq!(found.name, "Foo");
}
