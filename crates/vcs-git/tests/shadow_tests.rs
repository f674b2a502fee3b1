//! Shadow cache lifecycle

use git2::Repository;
use pretty_assertions::assert_eq;
use vcs_git::{AuthenticationContext, ErrorKind, ShadowRepositoryCache};
use vcs_test_utils::RemoteFixture;

#[test]
fn ensure_mirrors_all_branches_and_tags() {
    let remote = RemoteFixture::new();
    let feature = remote.commit_file_on("feature", "f.txt", "f", "Feature");
    remote.tag("v1", remote.head());
    let auth = AuthenticationContext::None;
    let wc = remote.working_copy("wc");

    let path = ShadowRepositoryCache::new(&auth)
        .ensure(&remote.url(), &wc)
        .unwrap();

    let cache = Repository::open_bare(&path).unwrap();
    assert_eq!(cache.refname_to_id("refs/heads/main").unwrap(), remote.head());
    assert_eq!(cache.refname_to_id("refs/heads/feature").unwrap(), feature);
    assert_eq!(cache.refname_to_id("refs/tags/v1").unwrap(), remote.head());
    assert_eq!(
        cache.find_reference("HEAD").unwrap().symbolic_target(),
        Some("refs/heads/main")
    );
    assert!(ShadowRepositoryCache::is_present(&wc).unwrap());
}

#[test]
fn refresh_is_idempotent_and_picks_up_new_commits() {
    let remote = RemoteFixture::new();
    let auth = AuthenticationContext::None;
    let cache = ShadowRepositoryCache::new(&auth);
    let wc = remote.working_copy("wc");
    let path = cache.ensure(&remote.url(), &wc).unwrap();

    cache.refresh(&wc).unwrap();
    cache.refresh(&wc).unwrap();
    let newer = remote.commit_file("later.txt", "later", "Later");
    cache.refresh(&wc).unwrap();

    assert_eq!(
        ShadowRepositoryCache::branch_tip(&path, "refs/heads/main"),
        Some(newer)
    );
}

#[test]
fn refresh_mirrors_force_pushed_branches() {
    let remote = RemoteFixture::new();
    let auth = AuthenticationContext::None;
    let cache = ShadowRepositoryCache::new(&auth);
    let wc = remote.working_copy("wc");
    let initial = remote.head();
    remote.commit_file("later.txt", "later", "Later");
    let path = cache.ensure(&remote.url(), &wc).unwrap();

    remote
        .repo()
        .reference("refs/heads/main", initial, true, "rewind")
        .unwrap();
    cache.refresh(&wc).unwrap();

    assert_eq!(
        ShadowRepositoryCache::branch_tip(&path, "refs/heads/main"),
        Some(initial)
    );
}

#[test]
fn refresh_without_cache_fails() {
    let remote = RemoteFixture::new();
    let auth = AuthenticationContext::None;
    let err = ShadowRepositoryCache::new(&auth)
        .refresh(&remote.working_copy("wc"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn unreachable_remote_keeps_last_known_good_cache() {
    let remote = RemoteFixture::new();
    let auth = AuthenticationContext::None;
    let cache = ShadowRepositoryCache::new(&auth);
    let wc = remote.working_copy("wc");
    let path = cache.ensure(&remote.url(), &wc).unwrap();
    let head = remote.head();

    std::fs::rename(remote.path(), remote.root().join("moved.git")).unwrap();
    let err = cache.refresh(&wc).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RemoteUnavailable);
    assert_eq!(
        ShadowRepositoryCache::branch_tip(&path, "refs/heads/main"),
        Some(head)
    );
}
