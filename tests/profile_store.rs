//! Integration tests for the on-device profile record.

use pretty_assertions::assert_eq;

use little_lemon::profile::{Profile, ProfileError, ProfileField, ProfileStore};
use little_lemon::storage::Database;

fn tilly() -> Profile {
    Profile {
        first_name: "Tilly".to_string(),
        last_name: "Adams".to_string(),
        email: "tilly@littlelemon.com".to_string(),
        phone_number: "3125550199".to_string(),
        newsletter: true,
        ..Profile::default()
    }
}

#[tokio::test]
async fn test_profile_survives_reopen() {
    let dir = std::env::temp_dir().join(format!("little_lemon_profile_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("profile.db");
    let path_str = path.to_str().unwrap();

    {
        let store = ProfileStore::new(Database::open(path_str).await.unwrap());
        store.save(&tilly()).await.unwrap();
    }

    let store = ProfileStore::new(Database::open(path_str).await.unwrap());
    assert_eq!(store.load().await.unwrap(), tilly());

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_stored_blob_is_camel_case_json() {
    let db = Database::open(":memory:").await.unwrap();
    ProfileStore::new(db.clone()).save(&tilly()).await.unwrap();

    let raw = db.get_value(ProfileStore::KEY).await.unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["firstName"], "Tilly");
    assert_eq!(json["newsletter"], true);
    assert_eq!(json["image"], "");
}

#[tokio::test]
async fn test_edit_avatar_and_logout() {
    let store = ProfileStore::new(Database::open(":memory:").await.unwrap());

    let mut profile = tilly();
    profile.set_avatar("file:///photos/tilly.jpg");
    store.save(&profile).await.unwrap();
    assert!(store.load().await.unwrap().has_avatar());

    profile.remove_avatar();
    store.save(&profile).await.unwrap();
    let loaded = store.load().await.unwrap();
    assert!(!loaded.has_avatar());
    assert_eq!(loaded.initials(), "TA");

    store.clear().await.unwrap();
    assert_eq!(store.load().await.unwrap(), Profile::default());
}

#[tokio::test]
async fn test_invalid_profile_rejected() {
    let store = ProfileStore::new(Database::open(":memory:").await.unwrap());
    let result = store.save(&Profile::default()).await;

    match result {
        Err(ProfileError::Invalid(fields)) => assert_eq!(
            fields,
            vec![
                ProfileField::FirstName,
                ProfileField::LastName,
                ProfileField::Email,
                ProfileField::PhoneNumber,
            ]
        ),
        other => panic!("Expected Invalid, got {:?}", other),
    }
}

#[tokio::test]
async fn test_onboarding_then_complete_profile() {
    let store = ProfileStore::new(Database::open(":memory:").await.unwrap());
    assert!(!store.is_onboarded().await.unwrap());

    store
        .onboard("Tilly", "Adams", "tilly@littlelemon.com")
        .await
        .unwrap();
    assert!(store.is_onboarded().await.unwrap());

    let mut profile = store.load().await.unwrap();
    assert_eq!(profile.initials(), "TA");
    assert!(matches!(
        store.save(&profile).await,
        Err(ProfileError::Invalid(ref f)) if f == &[ProfileField::PhoneNumber]
    ));

    profile.phone_number = "3125550199".to_string();
    profile.newsletter = true;
    store.save(&profile).await.unwrap();
    assert_eq!(store.load().await.unwrap(), tilly());
}
