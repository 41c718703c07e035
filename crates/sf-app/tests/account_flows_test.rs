//! Profile edits and account updates observed through a running guard.

mod common;

use std::sync::Arc;
use std::time::Duration;

use sf_app::usecases::{EditProfile, UpdateAccount};
use sf_app::{GuardConfig, GuardDeps, GuardHandle, RetryPolicy, SessionGuard};
use sf_core::route::RouteDomain;
use sf_infra::credentials::MemoryCredentialStore;

use common::{profile, session, FakeAuth, FakeProfiles, RecordingNavigator};

fn start(
    auth: &Arc<FakeAuth>,
    profiles: &Arc<FakeProfiles>,
    navigator: &Arc<RecordingNavigator>,
) -> GuardHandle {
    let deps = GuardDeps {
        auth: auth.clone(),
        profiles: profiles.clone(),
        navigation: navigator.clone(),
        credentials: Arc::new(MemoryCredentialStore::with_session(session("user-1"))),
    };
    SessionGuard::new(deps, GuardConfig::default()).spawn().0
}

#[tokio::test]
async fn test_edited_profile_reaches_the_snapshot_without_redirecting() {
    let auth = FakeAuth::with_session(session("user-1"));
    let profiles = FakeProfiles::new();
    profiles.respond("user-1", Ok(Some(profile("user-1"))));
    let navigator = RecordingNavigator::at("/(tabs)");
    let guard = start(&auth, &profiles, &navigator);
    guard.settled().await.unwrap();

    let retry = RetryPolicy::new(2, Duration::from_millis(1)).with_jitter(Duration::ZERO);
    EditProfile::new(profiles.clone(), guard.clone(), retry)
        .execute("Grace Hopper", Some("Admiral"), None)
        .await
        .unwrap();
    let snapshot = guard
        .wait_for(|s| s.profile.as_ref().is_some_and(|p| p.name == "Grace Hopper"))
        .await
        .unwrap();

    assert_eq!(snapshot.route, Some(RouteDomain::Main));
    assert_eq!(snapshot.profile.unwrap().bio.as_deref(), Some("Admiral"));
    assert!(navigator.replaces().is_empty());
}

#[tokio::test]
async fn test_phone_change_updates_the_signed_in_identity() {
    let auth = FakeAuth::with_session(session("user-1"));
    let profiles = FakeProfiles::new();
    profiles.respond("user-1", Ok(Some(profile("user-1"))));
    let navigator = RecordingNavigator::at("/(tabs)");
    let guard = start(&auth, &profiles, &navigator);
    guard.settled().await.unwrap();

    UpdateAccount::new(auth.clone())
        .change_phone(" +15550100 ")
        .await
        .unwrap();
    guard
        .wait_for(|s| {
            s.user
                .as_ref()
                .is_some_and(|u| u.phone.as_deref() == Some("+15550100"))
        })
        .await
        .unwrap();
    let snapshot = guard.settled().await.unwrap();

    assert_eq!(
        snapshot.user.and_then(|u| u.phone),
        Some("+15550100".to_string())
    );
    assert_eq!(snapshot.route, Some(RouteDomain::Main));
    assert!(snapshot.profile.is_some());
    assert!(navigator.replaces().is_empty());
}
