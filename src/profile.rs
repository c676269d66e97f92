//! User profile: the single on-device record of who is ordering.
//!
//! The profile is stored verbatim as one JSON blob under a fixed key. It is
//! loaded on start, fully overwritten on save and removed on log out; there is
//! no partial merge.
//!
//! First-run registration (onboarding) asks only for names and email. The
//! phone number becomes mandatory once the full profile is saved.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

use crate::storage::{Database, DatabaseError};

/// Conventional `local@domain.tld` syntax, or a quoted local part, or an
/// IPv4 literal domain.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#,
    )
    .expect("Invalid regex")
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub order_statuses: bool,
    pub password_changes: bool,
    pub special_offers: bool,
    pub newsletter: bool,
    /// Avatar URI; empty string means no avatar
    pub image: String,
}

/// Profile fields that carry a format check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    FirstName,
    LastName,
    Email,
    PhoneNumber,
}

impl std::fmt::Display for ProfileField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ProfileField::FirstName => "first name",
            ProfileField::LastName => "last name",
            ProfileField::Email => "email",
            ProfileField::PhoneNumber => "phone number",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Invalid {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    Invalid(Vec<ProfileField>),

    #[error(transparent)]
    Storage(#[from] DatabaseError),
}

/// One or more ASCII letters.
pub fn validate_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphabetic())
}

pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Exactly ten ASCII digits.
pub fn validate_phone_number(phone_number: &str) -> bool {
    phone_number.len() == 10 && phone_number.chars().all(|c| c.is_ascii_digit())
}

impl Profile {
    /// Fields that fail their format check, in form order.
    pub fn invalid_fields(&self) -> Vec<ProfileField> {
        let mut invalid = Vec::new();
        if !validate_name(&self.first_name) {
            invalid.push(ProfileField::FirstName);
        }
        if !validate_name(&self.last_name) {
            invalid.push(ProfileField::LastName);
        }
        if !validate_email(&self.email) {
            invalid.push(ProfileField::Email);
        }
        if !validate_phone_number(&self.phone_number) {
            invalid.push(ProfileField::PhoneNumber);
        }
        invalid
    }

    pub fn can_save(&self) -> bool {
        self.invalid_fields().is_empty()
    }

    /// Like [`Profile::invalid_fields`], without the phone number check.
    pub fn invalid_onboarding_fields(&self) -> Vec<ProfileField> {
        self.invalid_fields()
            .into_iter()
            .filter(|field| *field != ProfileField::PhoneNumber)
            .collect()
    }

    pub fn can_onboard(&self) -> bool {
        self.invalid_onboarding_fields().is_empty()
    }

    /// First character of the first and last name, for the empty-avatar badge.
    pub fn initials(&self) -> String {
        self.first_name
            .chars()
            .next()
            .into_iter()
            .chain(self.last_name.chars().next())
            .collect()
    }

    pub fn has_avatar(&self) -> bool {
        !self.image.is_empty()
    }

    pub fn set_avatar(&mut self, uri: impl Into<String>) {
        self.image = uri.into();
    }

    pub fn remove_avatar(&mut self) {
        self.image.clear();
    }
}

// ============================================================================
// Profile Store
// ============================================================================

/// Persistent single-record profile store backed by the key/value table.
#[derive(Clone)]
pub struct ProfileStore {
    db: Database,
}

impl ProfileStore {
    /// Fixed key the JSON blob lives under.
    pub const KEY: &'static str = "profile";

    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Load the stored profile, or the all-empty default when none is stored.
    ///
    /// Also serves "discard changes": reloading replaces any in-memory edits.
    pub async fn load(&self) -> Result<Profile, ProfileError> {
        match self.db.get_value(Self::KEY).await? {
            Some(json) => {
                let profile = serde_json::from_str(&json).map_err(DatabaseError::from)?;
                Ok(profile)
            }
            None => {
                tracing::debug!("No stored profile, using defaults");
                Ok(Profile::default())
            }
        }
    }

    /// Validate and fully overwrite the stored profile.
    ///
    /// An invalid profile is refused and storage is left untouched.
    pub async fn save(&self, profile: &Profile) -> Result<(), ProfileError> {
        let invalid = profile.invalid_fields();
        if !invalid.is_empty() {
            tracing::debug!(fields = ?invalid, "Refusing to save invalid profile");
            return Err(ProfileError::Invalid(invalid));
        }

        self.write(profile).await?;
        tracing::info!("Profile saved");
        Ok(())
    }

    /// First-run registration: store a fresh profile holding only the names
    /// and email, replacing whatever was stored before.
    ///
    /// The phone number is not required here. It is checked by the next
    /// [`ProfileStore::save`].
    pub async fn onboard(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
    ) -> Result<Profile, ProfileError> {
        let profile = Profile {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            ..Profile::default()
        };

        let invalid = profile.invalid_onboarding_fields();
        if !invalid.is_empty() {
            tracing::debug!(fields = ?invalid, "Refusing to onboard with invalid fields");
            return Err(ProfileError::Invalid(invalid));
        }

        self.write(&profile).await?;
        tracing::info!("Onboarding completed");
        Ok(profile)
    }

    /// True once a profile record exists. Only onboarding and a valid save
    /// write one, and log out removes it.
    pub async fn is_onboarded(&self) -> Result<bool, ProfileError> {
        Ok(self.db.get_value(Self::KEY).await?.is_some())
    }

    async fn write(&self, profile: &Profile) -> Result<(), ProfileError> {
        let json = serde_json::to_string(profile).map_err(DatabaseError::from)?;
        self.db.set_value(Self::KEY, &json).await?;
        Ok(())
    }

    /// Log out: drop the stored profile.
    pub async fn clear(&self) -> Result<(), ProfileError> {
        self.db.remove_value(Self::KEY).await?;
        tracing::info!("Profile cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn valid_profile() -> Profile {
        Profile {
            first_name: "Tilly".to_string(),
            last_name: "Adams".to_string(),
            email: "tilly@littlelemon.com".to_string(),
            phone_number: "3125550199".to_string(),
            order_statuses: true,
            password_changes: false,
            special_offers: true,
            newsletter: false,
            image: String::new(),
        }
    }

    async fn test_store() -> ProfileStore {
        ProfileStore::new(Database::open(":memory:").await.unwrap())
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Tilly"));
        assert!(!validate_name(""));
        assert!(!validate_name("Tilly2"));
        assert!(!validate_name("Mary Ann"));
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("tilly@littlelemon.com"));
        assert!(validate_email("first.last@mail.example.org"));
        assert!(validate_email("user@[192.168.0.1]"));
        assert!(!validate_email("tilly@"));
        assert!(!validate_email("tilly.littlelemon.com"));
        assert!(!validate_email("tilly@lemon.c"));
        assert!(!validate_email(""));
    }

    #[test]
    fn test_validate_phone_number() {
        assert!(validate_phone_number("3125550199"));
        assert!(!validate_phone_number("312555019"));
        assert!(!validate_phone_number("31255501999"));
        assert!(!validate_phone_number("312-555-01"));
        assert!(!validate_phone_number(""));
    }

    #[test]
    fn test_invalid_fields_in_form_order() {
        let profile = Profile {
            first_name: "T1lly".to_string(),
            phone_number: "123".to_string(),
            ..valid_profile()
        };
        assert_eq!(
            profile.invalid_fields(),
            vec![ProfileField::FirstName, ProfileField::PhoneNumber]
        );
        assert!(!profile.can_save());
        assert!(valid_profile().can_save());
    }

    #[test]
    fn test_initials() {
        assert_eq!(valid_profile().initials(), "TA");
        let only_first = Profile {
            first_name: "Tilly".to_string(),
            ..Profile::default()
        };
        assert_eq!(only_first.initials(), "T");
        assert_eq!(Profile::default().initials(), "");
    }

    #[test]
    fn test_avatar_set_and_remove() {
        let mut profile = valid_profile();
        assert!(!profile.has_avatar());
        profile.set_avatar("file:///photos/me.jpg");
        assert!(profile.has_avatar());
        profile.remove_avatar();
        assert_eq!(profile.image, "");
    }

    #[test]
    fn test_json_uses_camel_case_keys() {
        let json = serde_json::to_value(valid_profile()).unwrap();
        assert_eq!(json["firstName"], "Tilly");
        assert_eq!(json["phoneNumber"], "3125550199");
        assert_eq!(json["orderStatuses"], true);
    }

    #[test]
    fn test_json_missing_keys_default() {
        let profile: Profile = serde_json::from_str(r#"{"firstName":"Tilly"}"#).unwrap();
        assert_eq!(profile.first_name, "Tilly");
        assert!(!profile.newsletter);
        assert_eq!(profile.image, "");
    }

    #[test]
    fn test_invalid_error_message_lists_fields() {
        let err = ProfileError::Invalid(vec![ProfileField::Email, ProfileField::PhoneNumber]);
        assert_eq!(err.to_string(), "Invalid email, phone number");
    }

    #[tokio::test]
    async fn test_load_without_record_returns_default() {
        let store = test_store().await;
        assert_eq!(store.load().await.unwrap(), Profile::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = test_store().await;
        store.save(&valid_profile()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), valid_profile());
    }

    #[tokio::test]
    async fn test_save_overwrites_whole_record() {
        let store = test_store().await;
        let mut profile = valid_profile();
        profile.set_avatar("file:///me.jpg");
        store.save(&profile).await.unwrap();

        let replacement = valid_profile();
        store.save(&replacement).await.unwrap();
        assert_eq!(store.load().await.unwrap().image, "");
    }

    #[tokio::test]
    async fn test_invalid_save_leaves_storage_untouched() {
        let store = test_store().await;
        store.save(&valid_profile()).await.unwrap();

        let bad = Profile {
            email: "nope".to_string(),
            ..valid_profile()
        };
        let result = store.save(&bad).await;
        assert!(matches!(result, Err(ProfileError::Invalid(ref f)) if f == &[ProfileField::Email]));
        assert_eq!(store.load().await.unwrap(), valid_profile());
    }

    #[tokio::test]
    async fn test_discard_reloads_stored_profile() {
        let store = test_store().await;
        store.save(&valid_profile()).await.unwrap();

        let mut editing = store.load().await.unwrap();
        editing.first_name = "Changed".to_string();
        let reloaded = store.load().await.unwrap();
        assert_eq!(reloaded.first_name, "Tilly");
    }

    #[tokio::test]
    async fn test_clear_restores_default() {
        let store = test_store().await;
        store.save(&valid_profile()).await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), Profile::default());
    }

    #[test]
    fn test_onboarding_ignores_phone_number() {
        let profile = Profile {
            phone_number: String::new(),
            ..valid_profile()
        };
        assert!(profile.can_onboard());
        assert!(!profile.can_save());

        let bad_email = Profile {
            email: "tilly@".to_string(),
            phone_number: "1".to_string(),
            ..valid_profile()
        };
        assert_eq!(bad_email.invalid_onboarding_fields(), vec![ProfileField::Email]);
    }

    #[tokio::test]
    async fn test_onboard_without_phone_is_stored() {
        let store = test_store().await;
        assert!(!store.is_onboarded().await.unwrap());

        let profile = store
            .onboard("Tilly", "Adams", "tilly@littlelemon.com")
            .await
            .unwrap();
        assert_eq!(profile.phone_number, "");
        assert!(store.is_onboarded().await.unwrap());
        assert_eq!(store.load().await.unwrap(), profile);
    }

    #[tokio::test]
    async fn test_save_after_onboarding_still_requires_phone() {
        let store = test_store().await;
        let mut profile = store
            .onboard("Tilly", "Adams", "tilly@littlelemon.com")
            .await
            .unwrap();

        profile.newsletter = true;
        let result = store.save(&profile).await;
        assert!(
            matches!(result, Err(ProfileError::Invalid(ref f)) if f == &[ProfileField::PhoneNumber])
        );
        assert!(!store.load().await.unwrap().newsletter);

        profile.phone_number = "3125550199".to_string();
        store.save(&profile).await.unwrap();
        assert!(store.load().await.unwrap().newsletter);
    }

    #[tokio::test]
    async fn test_invalid_onboarding_stores_nothing() {
        let store = test_store().await;
        let result = store.onboard("Tilly", "", "not-an-email").await;
        assert!(matches!(
            result,
            Err(ProfileError::Invalid(ref f)) if f == &[ProfileField::LastName, ProfileField::Email]
        ));
        assert!(!store.is_onboarded().await.unwrap());
    }

    #[tokio::test]
    async fn test_logout_resets_onboarding() {
        let store = test_store().await;
        store
            .onboard("Tilly", "Adams", "tilly@littlelemon.com")
            .await
            .unwrap();
        store.clear().await.unwrap();
        assert!(!store.is_onboarded().await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_record_is_reported() {
        let db = Database::open(":memory:").await.unwrap();
        db.set_value(ProfileStore::KEY, "not json").await.unwrap();
        let store = ProfileStore::new(db);
        assert!(matches!(
            store.load().await,
            Err(ProfileError::Storage(DatabaseError::Serialization(_)))
        ));
    }
}
