// src/pipeline.rs
//! The save flow: validate (and repair) the schema, upload the thumbnail,
//! create the page.
//!
//! Validation and upload are best-effort steps. They run concurrently,
//! and a failure in either one is recorded in the report as a
//! [`StepStatus::Degraded`] step instead of aborting the save. Only page
//! creation can fail a save.

use crate::api::{CreatedPage, NotionRepository};
use crate::error::{classify_database_access_failure, AppError, ErrorKind};
use crate::metadata;
use crate::model::{CapturePayload, CaptureSource, DatabaseMetadata, ImageData, Profile};
use crate::page::{self, NewPage};
use crate::schema::{inspector, repair, CacheKey, ValidationCache};
use crate::thumbnail;
use crate::types::{DatabaseId, FileUploadId, PropertyName};
use parking_lot::Mutex;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Where a save currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStage {
    Validating,
    Repairing,
    Uploading,
    Creating,
    Done,
    Failed,
}

impl fmt::Display for SaveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validating => "validating schema",
            Self::Repairing => "repairing schema",
            Self::Uploading => "uploading thumbnail",
            Self::Creating => "creating page",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// How a best-effort step ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Skipped,
    Degraded { reason: String },
}

impl StepStatus {
    fn degraded(error: &AppError) -> Self {
        Self::Degraded {
            reason: error.user_message(),
        }
    }
}

/// A successful save.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReport {
    pub page: CreatedPage,
    /// The title property name the page was written under. Hosts persist it
    /// back into the profile when it changed.
    pub title_property_name: PropertyName,
    pub schema: StepStatus,
    pub thumbnail: StepStatus,
    pub stages: Vec<SaveStage>,
}

impl SaveReport {
    /// The profile with its cached title name brought in line with the
    /// database, or `None` if it was already current.
    pub fn updated_profile(&self, profile: &Profile) -> Option<Profile> {
        (profile.title_property_name != self.title_property_name)
            .then(|| profile.clone().with_title_property(self.title_property_name.clone()))
    }
}

/// What the UI layer gets back from a save.
///
/// Serialized as `{success: true, pageResult}` or
/// `{success: false, errorKind, message}`.
#[derive(Debug, Clone)]
pub enum SaveOutcome {
    Saved(SaveReport),
    Failed {
        error_kind: ErrorKind,
        message: String,
    },
}

impl Serialize for SaveOutcome {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Saved(report) => {
                let mut state = serializer.serialize_struct("SaveOutcome", 2)?;
                state.serialize_field("success", &true)?;
                state.serialize_field("pageResult", report)?;
                state.end()
            }
            Self::Failed {
                error_kind,
                message,
            } => {
                let mut state = serializer.serialize_struct("SaveOutcome", 3)?;
                state.serialize_field("success", &false)?;
                state.serialize_field("errorKind", error_kind)?;
                state.serialize_field("message", message)?;
                state.end()
            }
        }
    }
}

impl SaveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Saved(_))
    }
}

impl From<Result<SaveReport, AppError>> for SaveOutcome {
    fn from(result: Result<SaveReport, AppError>) -> Self {
        match result {
            Ok(report) => Self::Saved(report),
            Err(error) => Self::Failed {
                error_kind: error.kind(),
                message: error.user_message(),
            },
        }
    }
}

/// What onboarding learned about a database.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationCheck {
    pub title_property_name: PropertyName,
    pub metadata: DatabaseMetadata,
    pub label_options: Vec<String>,
}

impl ConfigurationCheck {
    /// Applies the check to `profile`.
    pub fn apply_to(&self, profile: Profile) -> Profile {
        let mut profile = profile
            .with_metadata(self.metadata.clone())
            .with_title_property(self.title_property_name.clone());
        profile.label_options = self.label_options.clone();
        profile
    }
}

/// Stage log for one save. Shared between the concurrent steps.
struct StageTrace<'a> {
    url: &'a str,
    stages: Mutex<Vec<SaveStage>>,
}

impl<'a> StageTrace<'a> {
    fn new(url: &'a str) -> Self {
        Self {
            url,
            stages: Mutex::new(Vec::new()),
        }
    }

    fn enter(&self, stage: SaveStage) {
        log::info!("Saving {}: {}", self.url, stage);
        self.stages.lock().push(stage);
    }

    fn into_stages(self) -> Vec<SaveStage> {
        self.stages.into_inner()
    }
}

struct SchemaResolution {
    title_property_name: PropertyName,
    status: StepStatus,
}

/// Runs saves and onboarding against one shared validation cache.
#[derive(Clone, Default)]
pub struct Clipper {
    cache: Arc<ValidationCache>,
}

impl Clipper {
    pub fn new(cache: Arc<ValidationCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &ValidationCache {
        &self.cache
    }

    /// Saves `capture` into the profile's database.
    pub async fn save<R>(&self, repo: &R, profile: &Profile, capture: &CapturePayload) -> SaveOutcome
    where
        R: NotionRepository + ?Sized,
    {
        let result = self.try_save(repo, profile, capture).await;
        if let Err(error) = &result {
            log::error!("Saving {} failed: {}", capture.url, error);
        }
        result.into()
    }

    /// Like [`save`](Self::save) but keeps the typed error.
    pub async fn try_save<R>(
        &self,
        repo: &R,
        profile: &Profile,
        capture: &CapturePayload,
    ) -> Result<SaveReport, AppError>
    where
        R: NotionRepository + ?Sized,
    {
        let trace = StageTrace::new(&capture.url);
        log::debug!("Saving {} capture with profile {}", capture.source, profile.id);

        let (schema, (upload, thumbnail_status)) = tokio::join!(
            self.ensure_schema(repo, profile, &trace),
            Self::attach_thumbnail(repo, capture, &trace),
        );

        trace.enter(SaveStage::Creating);
        let new_page = NewPage {
            title: capture.title.as_deref(),
            label: capture.label.as_deref(),
            thumbnail: upload.as_ref(),
            ..NewPage::new(&profile.database_id, &capture.url, &schema.title_property_name)
        };
        let page = match page::create_page(repo, &new_page).await {
            Ok(page) => page,
            Err(error) => {
                trace.enter(SaveStage::Failed);
                return Err(error);
            }
        };
        trace.enter(SaveStage::Done);

        Ok(SaveReport {
            page,
            title_property_name: schema.title_property_name,
            schema: schema.status,
            thumbnail: thumbnail_status,
            stages: trace.into_stages(),
        })
    }

    /// Validates and, if needed, repairs the schema. Never fails: problems
    /// fall back to the profile's cached title name.
    async fn ensure_schema<R>(
        &self,
        repo: &R,
        profile: &Profile,
        trace: &StageTrace<'_>,
    ) -> SchemaResolution
    where
        R: NotionRepository + ?Sized,
    {
        trace.enter(SaveStage::Validating);
        let check = match self.cache.inspect_cached(repo, &profile.database_id).await {
            Ok(check) => check,
            Err(error) => {
                log::warn!("Schema validation failed, continuing: {}", error);
                return SchemaResolution {
                    title_property_name: profile.title_property_name.clone(),
                    status: StepStatus::degraded(&error),
                };
            }
        };
        if check.has_all {
            return SchemaResolution {
                title_property_name: check.title_property_name,
                status: StepStatus::Completed,
            };
        }

        trace.enter(SaveStage::Repairing);
        match repair::repair_from_check(repo, &profile.database_id, &check).await {
            Ok(outcome) => {
                self.cache
                    .invalidate(Some(&CacheKey::new(repo.api_key(), &profile.database_id)));
                let title_property_name = if check.needs_rename && outcome.renamed_title() {
                    PropertyName::canonical_title()
                } else {
                    check.title_property_name
                };
                let status = match outcome.skipped {
                    Some(skipped) => StepStatus::Degraded {
                        reason: skipped.to_string(),
                    },
                    None => StepStatus::Completed,
                };
                SchemaResolution {
                    title_property_name,
                    status,
                }
            }
            Err(error) => {
                log::warn!("Schema repair failed, continuing: {}", error);
                SchemaResolution {
                    title_property_name: check.title_property_name,
                    status: StepStatus::degraded(&error),
                }
            }
        }
    }

    async fn attach_thumbnail<R>(
        repo: &R,
        capture: &CapturePayload,
        trace: &StageTrace<'_>,
    ) -> (Option<FileUploadId>, StepStatus)
    where
        R: NotionRepository + ?Sized,
    {
        let image: &ImageData = match (&capture.source, &capture.thumbnail) {
            (CaptureSource::Link, _) | (_, None) => return (None, StepStatus::Skipped),
            (_, Some(image)) => image,
        };

        trace.enter(SaveStage::Uploading);
        match thumbnail::upload_thumbnail(repo, image).await {
            Ok(id) => (Some(id), StepStatus::Completed),
            Err(error) => {
                log::warn!("Thumbnail upload failed, saving without it: {}", error);
                (None, StepStatus::degraded(&error))
            }
        }
    }

    /// Onboarding check for a new or edited profile.
    ///
    /// Inspects the database fresh, repairs it, and reads its metadata.
    /// Unlike a save, every failure is returned, translated into a
    /// remediation message where one exists.
    pub async fn validate_configuration<R>(
        &self,
        repo: &R,
        database_id: &DatabaseId,
    ) -> Result<ConfigurationCheck, AppError>
    where
        R: NotionRepository + ?Sized,
    {
        self.check_configuration(repo, database_id)
            .await
            .map_err(|error| match classify_database_access_failure(&error) {
                Some(failure) => {
                    log::warn!("Database {} is not usable: {}", database_id, error);
                    AppError::DatabaseAccess(failure)
                }
                None => error,
            })
    }

    async fn check_configuration<R>(
        &self,
        repo: &R,
        database_id: &DatabaseId,
    ) -> Result<ConfigurationCheck, AppError>
    where
        R: NotionRepository + ?Sized,
    {
        let key = CacheKey::new(repo.api_key(), database_id);
        let check = inspector::inspect(repo, database_id).await?;
        let metadata = metadata::metadata_from_database(&check.database);
        let label_options = metadata::label_options_from_database(&check.database);

        let title_property_name = if check.has_all {
            let name = check.title_property_name.clone();
            self.cache.store(key, check);
            name
        } else {
            let outcome = repair::repair_from_check(repo, database_id, &check).await?;
            self.cache.invalidate(Some(&key));
            if check.needs_rename && outcome.renamed_title() {
                PropertyName::canonical_title()
            } else {
                check.title_property_name
            }
        };

        log::info!(
            "Database {} ({}) ready, title property {:?}",
            database_id,
            metadata.name,
            title_property_name.as_str()
        );
        Ok(ConfigurationCheck {
            title_property_name,
            metadata,
            label_options,
        })
    }

    /// Builds a ready-to-store profile from a key and database, running the
    /// onboarding check.
    pub async fn onboard<R>(&self, repo: &R, database_id: DatabaseId) -> Result<Profile, AppError>
    where
        R: NotionRepository + ?Sized,
    {
        let check = self.validate_configuration(repo, &database_id).await?;
        Ok(check.apply_to(Profile::new(repo.api_key().clone(), database_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{
        service_error, test_api_key, test_database_id, Call, FakeNotion, FAKE_PAGE_ID,
    };
    use crate::clock::ManualClock;
    use crate::error::{DatabaseAccessFailure, UploadStage};
    use crate::schema::SkippedRepair;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn complete_schema() -> Value {
        json!({
            "name": { "type": "title" },
            "url": { "type": "url" },
            "label": { "type": "select", "select": { "options": [{ "name": "article" }] } },
            "saved_from": { "type": "rich_text" },
            "thumbnail": { "type": "files" },
        })
    }

    fn clipper() -> Clipper {
        Clipper::new(Arc::new(ValidationCache::with_clock(Arc::new(
            ManualClock::default(),
        ))))
    }

    fn profile() -> Profile {
        Profile::new(test_api_key(), test_database_id())
    }

    fn screenshot() -> ImageData {
        ImageData::from_bytes(vec![0x89, b'P', b'N', b'G'], "image/png")
    }

    fn created_page_body(fake: &FakeNotion) -> Value {
        fake.calls()
            .into_iter()
            .find_map(|c| match c {
                Call::CreatePage(body) => Some(body),
                _ => None,
            })
            .expect("a page was created")
    }

    #[tokio::test]
    async fn test_save_with_complete_schema_and_thumbnail() {
        let fake = FakeNotion::with_properties(complete_schema());
        let capture = CapturePayload::page("https://example.com/a", Some("A".to_string()))
            .with_thumbnail(screenshot());

        let report = clipper().try_save(&fake, &profile(), &capture).await.unwrap();

        assert_eq!(report.page.id.as_str(), FAKE_PAGE_ID);
        assert_eq!(report.schema, StepStatus::Completed);
        assert_eq!(report.thumbnail, StepStatus::Completed);
        assert_eq!(report.stages.len(), 4);
        assert!(report.stages.contains(&SaveStage::Validating));
        assert!(report.stages.contains(&SaveStage::Uploading));
        assert_eq!(&report.stages[2..], &[SaveStage::Creating, SaveStage::Done]);
        let body = created_page_body(&fake);
        assert_eq!(body["properties"]["thumbnail"]["files"][0]["type"], "file_upload");
        assert_eq!(fake.count(|c| matches!(c, Call::UpdateDatabase(_))), 0);
    }

    #[tokio::test]
    async fn test_upload_failure_still_saves_without_thumbnail() {
        let fake = FakeNotion::with_properties(complete_schema()).fail_upload_send(|| {
            AppError::UploadFailed {
                stage: UploadStage::Transfer,
                message: "connection reset".to_string(),
            }
        });
        let capture = CapturePayload::page("https://example.com/a", None).with_thumbnail(screenshot());

        let outcome = clipper().save(&fake, &profile(), &capture).await;

        let SaveOutcome::Saved(report) = outcome else {
            panic!("save should succeed: {outcome:?}");
        };
        assert!(matches!(report.thumbnail, StepStatus::Degraded { .. }));
        let body = created_page_body(&fake);
        assert!(body["properties"].get("thumbnail").is_none());
        assert_eq!(body["properties"]["name"]["title"][0]["text"]["content"], "https://example.com/a");
    }

    #[tokio::test]
    async fn test_link_capture_skips_thumbnail() {
        let fake = FakeNotion::with_properties(complete_schema());
        let capture = CapturePayload::link("https://example.com/b", Some("B".to_string()))
            .with_thumbnail(screenshot());

        let report = clipper().try_save(&fake, &profile(), &capture).await.unwrap();

        assert_eq!(report.thumbnail, StepStatus::Skipped);
        assert_eq!(fake.count(|c| matches!(c, Call::CreateFileUpload)), 0);
    }

    #[tokio::test]
    async fn test_social_post_uploads_its_screenshot() {
        let fake = FakeNotion::with_properties(complete_schema());
        let capture = CapturePayload::social_post("https://example.com/post/1", None)
            .with_thumbnail(screenshot());

        let report = clipper().try_save(&fake, &profile(), &capture).await.unwrap();

        assert_eq!(report.thumbnail, StepStatus::Completed);
        assert_eq!(fake.count(|c| matches!(c, Call::CreateFileUpload)), 1);
        let body = created_page_body(&fake);
        assert_eq!(body["properties"]["thumbnail"]["files"][0]["type"], "file_upload");
    }

    #[tokio::test]
    async fn test_skipped_rename_degrades_the_schema_step() {
        let fake = FakeNotion::with_properties(json!({
            "Title": { "type": "title" },
            "url": { "type": "url" },
            "label": { "type": "select" },
            "saved_from": { "type": "rich_text" },
            "thumbnail": { "type": "files" },
        }))
        .fail_patch(|| service_error(400, "validation_error", "Invalid property name."));
        let capture = CapturePayload::page("https://example.com/e", Some("E".to_string()));

        let report = clipper().try_save(&fake, &profile(), &capture).await.unwrap();

        assert_eq!(
            report.schema,
            StepStatus::Degraded {
                reason: SkippedRepair::Rename.to_string(),
            }
        );
        assert_eq!(report.title_property_name.as_str(), "Title");
        assert!(created_page_body(&fake)["properties"].get("Title").is_some());
    }

    #[tokio::test]
    async fn test_save_repairs_and_renames_title() {
        let fake = FakeNotion::with_properties(json!({
            "Name": { "type": "title" },
            "url": { "type": "url" },
            "label": { "type": "select" },
        }));
        let profile = profile().with_title_property(PropertyName::new("Name"));
        let capture = CapturePayload::page("https://example.com/c", Some("C".to_string()))
            .with_label("video");

        let report = clipper().try_save(&fake, &profile, &capture).await.unwrap();

        assert_eq!(report.title_property_name.as_str(), "name");
        assert!(report.stages.contains(&SaveStage::Repairing));
        let body = created_page_body(&fake);
        assert!(body["properties"].get("name").is_some());
        assert_eq!(body["properties"]["label"]["select"]["name"], "video");
        let updated = report.updated_profile(&profile).unwrap();
        assert_eq!(updated.title_property_name.as_str(), "name");
    }

    #[tokio::test]
    async fn test_repair_invalidates_cache() {
        let fake = FakeNotion::with_properties(json!({ "name": { "type": "title" } }));
        let clipper = clipper();
        let capture = CapturePayload::page("https://example.com", None);

        clipper.try_save(&fake, &profile(), &capture).await.unwrap();
        clipper.try_save(&fake, &profile(), &capture).await.unwrap();

        // First save inspects and repairs; the second re-inspects the repaired schema.
        assert_eq!(fake.count(|c| matches!(c, Call::RetrieveDatabase)), 2);
        assert_eq!(fake.count(|c| matches!(c, Call::UpdateDatabase(_))), 1);
        assert_eq!(clipper.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_validation_failure_falls_back_to_profile_title() {
        let fake = FakeNotion::with_properties(complete_schema())
            .fail_retrieve(|| service_error(503, "service_unavailable", "Unavailable"));
        let profile = profile().with_title_property(PropertyName::new("nombre"));
        let capture = CapturePayload::page("https://example.com", Some("D".to_string()));

        let report = clipper().try_save(&fake, &profile, &capture).await.unwrap();

        assert!(matches!(report.schema, StepStatus::Degraded { .. }));
        assert_eq!(report.title_property_name.as_str(), "nombre");
        assert!(report.updated_profile(&profile).is_none());
        assert!(created_page_body(&fake)["properties"].get("nombre").is_some());
    }

    #[tokio::test]
    async fn test_save_permission_error_is_only_logged() {
        let fake = FakeNotion::with_properties(json!({ "name": { "type": "title" } }))
            .fail_patch(|| service_error(403, "restricted_resource", "Forbidden"));
        let capture = CapturePayload::page("https://example.com", None);

        let report = clipper().try_save(&fake, &profile(), &capture).await.unwrap();

        assert!(matches!(report.schema, StepStatus::Degraded { .. }));
    }

    #[tokio::test]
    async fn test_page_creation_failure_fails_the_save() {
        let fake = FakeNotion::with_properties(complete_schema())
            .fail_page(|| service_error(401, "unauthorized", "API token is invalid."));
        let capture = CapturePayload::page("https://example.com", None);

        let outcome = clipper().save(&fake, &profile(), &capture).await;

        match outcome {
            SaveOutcome::Failed {
                error_kind,
                message,
            } => {
                assert_eq!(error_kind, ErrorKind::PageCreation);
                assert_eq!(message, "Could not save to Notion: Invalid or expired API key");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_outcome_serializes_for_the_ui() {
        let fake = FakeNotion::with_properties(complete_schema());
        let capture = CapturePayload::page("https://example.com", None);
        let outcome = clipper().save(&fake, &profile(), &capture).await;

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["pageResult"]["titlePropertyName"], "name");
        assert_eq!(json["pageResult"]["thumbnail"], json!({ "status": "skipped" }));
        assert!(json.get("errorKind").is_none());

        let failed = SaveOutcome::from(Err::<SaveReport, _>(AppError::Schema("x".into())));
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({
                "success": false,
                "errorKind": "schema",
                "message": "Unexpected database schema: x",
            })
        );
    }

    #[tokio::test]
    async fn test_onboarding_repairs_and_returns_metadata() {
        let fake = FakeNotion::with_properties(json!({
            "Title": { "type": "title" },
            "label": { "type": "select", "select": { "options": [{ "name": "tool" }] } },
        }));

        let profile = clipper().onboard(&fake, test_database_id()).await.unwrap();

        assert_eq!(profile.title_property_name.as_str(), "name");
        assert_eq!(profile.name, "Reading list");
        assert_eq!(profile.emoji.as_deref(), Some("📚"));
        assert_eq!(profile.label_options, vec!["tool"]);
    }

    #[tokio::test]
    async fn test_onboarding_caches_a_complete_schema() {
        let fake = FakeNotion::with_properties(complete_schema());
        let clipper = clipper();

        clipper.validate_configuration(&fake, &test_database_id()).await.unwrap();
        let capture = CapturePayload::page("https://example.com", None);
        clipper.try_save(&fake, &profile(), &capture).await.unwrap();

        assert_eq!(fake.count(|c| matches!(c, Call::RetrieveDatabase)), 1);
    }

    #[tokio::test]
    async fn test_onboarding_escalates_with_remediation() {
        let cases: [(fn() -> AppError, DatabaseAccessFailure); 3] = [
            (
                || service_error(404, "object_not_found", "Could not find database"),
                DatabaseAccessFailure::NotFound,
            ),
            (
                || service_error(401, "unauthorized", "API token is invalid."),
                DatabaseAccessFailure::InvalidApiKey,
            ),
            (
                || service_error(403, "restricted_resource", "Forbidden"),
                DatabaseAccessFailure::NoAccess,
            ),
        ];
        for (failure, expected) in cases {
            let fake = FakeNotion::with_properties(complete_schema()).fail_retrieve(failure);
            let err = clipper()
                .validate_configuration(&fake, &test_database_id())
                .await
                .unwrap_err();
            assert!(
                matches!(&err, AppError::DatabaseAccess(found) if *found == expected),
                "unexpected error {err:?}"
            );
        }

        let fake = FakeNotion::with_properties(json!({ "name": { "type": "title" } }))
            .fail_patch(|| service_error(403, "restricted_resource", "Forbidden"));
        let err = clipper()
            .validate_configuration(&fake, &test_database_id())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::DatabaseAccess(DatabaseAccessFailure::NoEditPermission)
        ));
    }
}
