//! End-to-end content service tests with real rules and cache locks.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use chrono::Utc;

use catalog_cache::memory::MemoryCacheProvider;
use catalog_cache::{CacheLockService, LanguageCache};
use catalog_core::config::cache::MemoryCacheConfig;
use catalog_core::error::ErrorKind;
use catalog_core::traits::cache::CacheProvider;
use catalog_core::traits::lock::EntityLockService;
use catalog_core::types::{EntityVersionId, LanguageId, LockToken, OrganizationId};
use catalog_database::{MemoryUnitOfWork, MemoryUnitOfWorkProvider};
use catalog_entity::content::{EntityKind, LocalizedContent};
use catalog_entity::lifecycle::{
    EntityAction, EntityHeader, GetEntityModel, PublishAction, SaveContentModel, ScheduleLanguage,
    ScheduleModel, ValidationMessages, ValidationRuleKey,
};
use catalog_entity::status::{LanguageStatus, PublishingStatus};
use catalog_entity::versioning::VersioningMode;
use catalog_service::{
    ContentService, ContentValidationManager, EntityLifecycleManager, LifecycleError,
    ValidationChecker, VersioningManager,
};

use common::{CountingValidator, violation};

struct Fixture<C = ContentValidationManager> {
    provider: Arc<MemoryUnitOfWorkProvider>,
    cache: Arc<dyn CacheProvider>,
    locks: Arc<CacheLockService>,
    validator: Arc<C>,
    service: ContentService<MemoryUnitOfWorkProvider, C>,
    fi: LanguageId,
    sv: LanguageId,
}

fn fixture() -> Fixture {
    fixture_with(|_| ContentValidationManager::default())
}

/// Fixture whose lifecycle validator is built from the id of its first language.
fn fixture_with<C>(validator: impl FnOnce(LanguageId) -> C) -> Fixture<C>
where
    C: ValidationChecker<MemoryUnitOfWork>,
{
    let fi = LanguageId::new();
    let sv = LanguageId::new();
    let provider = Arc::new(MemoryUnitOfWorkProvider::new());
    let cache: Arc<dyn CacheProvider> =
        Arc::new(MemoryCacheProvider::new(&MemoryCacheConfig::default()));
    let locks = Arc::new(CacheLockService::new(
        Arc::clone(&cache),
        Duration::from_secs(60),
    ));
    let validator = Arc::new(validator(fi));
    let lifecycle = Arc::new(EntityLifecycleManager::new(
        Arc::clone(&provider),
        Arc::clone(&validator),
        Arc::clone(&locks) as Arc<dyn EntityLockService>,
    ));
    let languages = Arc::new(LanguageCache::from_rows([
        (fi, "fi".to_string()),
        (sv, "sv".to_string()),
    ]));
    let service = ContentService::new(
        lifecycle,
        Arc::new(VersioningManager::new()),
        languages,
        Arc::clone(&locks) as Arc<dyn EntityLockService>,
    );
    Fixture {
        provider,
        cache,
        locks,
        validator,
        service,
        fi,
        sv,
    }
}

fn complete(language_id: LanguageId) -> LocalizedContent {
    LocalizedContent::named(language_id, "Resident parking permit")
        .with_summary("Apply for a parking permit for your street")
        .with_description("Residents of the city centre may park on their home street.")
}

fn save_model(
    id: Option<EntityVersionId>,
    action: EntityAction,
    contents: Vec<LocalizedContent>,
) -> SaveContentModel {
    let mut model = SaveContentModel::new(EntityKind::Service, action);
    model.id = id;
    model.organization_id = Some(OrganizationId::new());
    model.contents = contents;
    model
}

async fn create<C>(f: &Fixture<C>, contents: Vec<LocalizedContent>) -> EntityHeader
where
    C: ValidationChecker<MemoryUnitOfWork>,
{
    f.service
        .save(&save_model(None, EntityAction::Save, contents))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_new_content_starts_as_draft() {
    let f = fixture();
    let header = create(&f, vec![complete(f.fi)]).await;

    assert_eq!(header.publishing_status, PublishingStatus::Draft);
    assert_eq!(header.version.major, 0);
    assert_eq!(header.language_ids(), vec![f.fi]);
    assert_eq!(header.language_availabilities[0].status, LanguageStatus::Draft);
}

#[tokio::test]
async fn test_save_and_publish_creates_published_link() {
    let f = fixture();
    let draft = create(&f, vec![complete(f.fi)]).await;

    let published = f
        .service
        .save(&save_model(
            Some(draft.id),
            EntityAction::SaveAndPublish,
            vec![complete(f.fi)],
        ))
        .await
        .unwrap();

    assert_ne!(published.id, draft.id);
    assert_eq!(published.root_id, draft.root_id);
    assert_eq!(published.publishing_status, PublishingStatus::Published);
    assert_eq!(published.version.major, 1);
    assert_eq!(published.action, Some(EntityAction::SaveAndPublish));
    assert!(published.validation_messages.is_none());

    let previous = f.provider.version(draft.id).await.unwrap();
    assert_eq!(previous.versioning.successor_id, Some(published.id));
    assert!(!f.locks.is_locked(draft.root_id).await.unwrap());
}

#[tokio::test]
async fn test_editing_published_content_leaves_it_published() {
    let f = fixture();
    let draft = create(&f, vec![complete(f.fi)]).await;
    let published = f
        .service
        .save(&save_model(
            Some(draft.id),
            EntityAction::SaveAndPublish,
            vec![complete(f.fi)],
        ))
        .await
        .unwrap();

    let edited = f
        .service
        .save(&save_model(
            Some(published.id),
            EntityAction::Save,
            vec![complete(f.fi).with_summary("Apply online for a resident parking permit")],
        ))
        .await
        .unwrap();

    assert_eq!(edited.publishing_status, PublishingStatus::Modified);
    assert_eq!(edited.language_availabilities[0].status, LanguageStatus::Draft);
    let still_published = f.provider.version(published.id).await.unwrap();
    assert_eq!(still_published.publishing_status, PublishingStatus::Published);

    let republished = f
        .service
        .save(&save_model(
            Some(edited.id),
            EntityAction::SaveAndPublish,
            vec![complete(f.fi)],
        ))
        .await
        .unwrap();

    assert_eq!(republished.version.major, 2);
    let retired = f.provider.version(published.id).await.unwrap();
    assert_eq!(retired.publishing_status, PublishingStatus::OldPublished);
    assert!(retired
        .languages
        .iter()
        .all(|l| l.status == LanguageStatus::Archived));
}

#[tokio::test]
async fn test_in_place_save_keeps_version() {
    let f = fixture();
    let draft = create(&f, vec![complete(f.fi)]).await;

    let mut model = save_model(Some(draft.id), EntityAction::Save, vec![complete(f.sv)]);
    model.versioning_mode = VersioningMode::PRESERVE_ALL;
    let saved = f.service.save(&model).await.unwrap();

    assert_eq!(saved.id, draft.id);
    assert_eq!(saved.version, draft.version);
    assert_eq!(saved.language_availabilities.len(), 2);
    assert_eq!(f.provider.versions_of(draft.root_id).await.len(), 1);
}

#[tokio::test]
async fn test_publish_of_incomplete_content_stays_draft() {
    let f = fixture();
    let draft = create(&f, vec![LocalizedContent::named(f.fi, "Parking")]).await;

    let header = f
        .service
        .save(&save_model(
            Some(draft.id),
            EntityAction::SaveAndPublish,
            vec![LocalizedContent::named(f.fi, "Parking")],
        ))
        .await
        .unwrap();

    assert_ne!(header.id, draft.id);
    assert_eq!(header.publishing_status, PublishingStatus::Draft);
    assert_eq!(header.version.major, 0);
    assert_eq!(header.language_availabilities[0].status, LanguageStatus::Draft);
    assert!(header.validation_messages.is_none());
    assert_eq!(f.provider.versions_of(draft.root_id).await.len(), 2);
    assert!(!f.locks.is_locked(draft.root_id).await.unwrap());
}

#[tokio::test]
async fn test_publish_skips_only_languages_with_violations() {
    let f = fixture();
    let draft = create(
        &f,
        vec![complete(f.fi), LocalizedContent::named(f.sv, "Pysäköinti")],
    )
    .await;

    let header = f
        .service
        .save(&save_model(Some(draft.id), EntityAction::SaveAndPublish, vec![]))
        .await
        .unwrap();

    assert_eq!(header.publishing_status, PublishingStatus::Published);
    let status = |id| {
        header
            .language_availabilities
            .iter()
            .find(|l| l.language_id == id)
            .map(|l| l.status)
    };
    assert_eq!(status(f.fi), Some(LanguageStatus::Published));
    assert_eq!(status(f.sv), Some(LanguageStatus::Draft));
    assert!(header.validation_messages.is_none());
}

#[tokio::test]
async fn test_publish_of_language_missing_from_version_is_rejected() {
    let f = fixture();
    let draft = create(&f, vec![complete(f.fi)]).await;

    let mut model = save_model(Some(draft.id), EntityAction::SaveAndPublish, vec![]);
    model.publish_languages = vec![f.sv];
    let result = f.service.save(&model).await;

    assert_matches!(result, Err(LifecycleError::App(e)) if e.kind == ErrorKind::Validation);
    assert_eq!(f.provider.counts().rolled_back, 1);
    assert!(!f.locks.is_locked(draft.root_id).await.unwrap());
}

#[tokio::test]
async fn test_publish_gate_goes_through_injected_checker() {
    let f = fixture_with(|_| CountingValidator::returning(ValidationMessages::new()));
    let draft = create(&f, vec![LocalizedContent::named(f.fi, "Parking")]).await;

    let header = f
        .service
        .save(&save_model(Some(draft.id), EntityAction::SaveAndPublish, vec![]))
        .await
        .unwrap();

    assert_eq!(header.publishing_status, PublishingStatus::Published);
    assert_eq!(header.language_availabilities[0].status, LanguageStatus::Published);
    assert_eq!(f.validator.calls(), 2);
}

#[tokio::test]
async fn test_checker_violation_keeps_language_unpublished() {
    let f = fixture_with(|fi| CountingValidator::returning(violation(fi)));
    let draft = create(&f, vec![complete(f.fi)]).await;

    let header = f
        .service
        .save(&save_model(Some(draft.id), EntityAction::SaveAndPublish, vec![]))
        .await
        .unwrap();

    assert_eq!(header.publishing_status, PublishingStatus::Draft);
    assert_eq!(header.language_availabilities[0].status, LanguageStatus::Draft);
    assert!(header.validation_messages.is_none());
    assert_eq!(f.validator.calls(), 2);
}

#[tokio::test]
async fn test_unknown_language_is_rejected_before_any_work() {
    let f = fixture();
    let result = f
        .service
        .save(&save_model(None, EntityAction::Save, vec![complete(LanguageId::new())]))
        .await;

    assert_matches!(result, Err(LifecycleError::App(e)) if e.kind == ErrorKind::Validation);
    assert_eq!(f.provider.counts().opened, 0);
}

#[tokio::test]
async fn test_save_and_validate_reports_nothing_for_drafts() {
    let f = fixture();
    let header = f
        .service
        .save(&save_model(
            None,
            EntityAction::SaveAndValidate,
            vec![LocalizedContent::named(f.fi, "Parking")],
        ))
        .await
        .unwrap();

    assert!(header.validation_messages.is_none());
}

#[tokio::test]
async fn test_schedule_publish_of_invalid_content_is_blocked() {
    let f = fixture();
    let draft = create(&f, vec![LocalizedContent::named(f.fi, "Parking")]).await;

    let result = f
        .service
        .schedule(&ScheduleModel {
            id: Some(draft.id),
            publish_action: PublishAction::SchedulePublish,
            languages: vec![ScheduleLanguage {
                language_id: f.fi,
                publish_at: Some(Utc::now() + chrono::Duration::days(2)),
                archive_at: None,
            }],
            requested_by: None,
        })
        .await;

    assert_matches!(
        result,
        Err(LifecycleError::SchedulePublish { messages, .. })
            if messages
                .for_language(f.fi)
                .iter()
                .any(|m| m.key == ValidationRuleKey::SummaryRequired)
    );
    let stored = f.provider.version(draft.id).await.unwrap();
    assert_eq!(stored.languages[0].publish_at, None);
}

#[tokio::test]
async fn test_scheduled_content_is_validated_on_get() {
    let f = fixture();
    let draft = create(&f, vec![complete(f.fi)]).await;
    let at = Utc::now() + chrono::Duration::days(2);

    let scheduled = f
        .service
        .schedule(&ScheduleModel {
            id: Some(draft.id),
            publish_action: PublishAction::SchedulePublish,
            languages: vec![ScheduleLanguage {
                language_id: f.fi,
                publish_at: Some(at),
                archive_at: None,
            }],
            requested_by: None,
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(scheduled.language_availabilities[0].valid_from, Some(at));

    let header = f.service.get(&GetEntityModel::new(draft.id)).await.unwrap();
    assert_eq!(header, scheduled);
}

#[tokio::test]
async fn test_validate_with_lock_holds_entity() {
    let f = fixture();
    let draft = create(&f, vec![complete(f.fi)]).await;
    let editor = LockToken::new();

    let header = f.service.validate(draft.id, Some(editor)).await.unwrap();
    assert_eq!(header.root_id, draft.root_id);
    assert!(f.locks.is_locked(draft.root_id).await.unwrap());

    let other = CacheLockService::new(Arc::clone(&f.cache), Duration::from_secs(60));
    assert_matches!(
        other.lock(draft.root_id, LockToken::new()).await,
        Err(e) if e.kind == ErrorKind::Conflict
    );
    assert_matches!(
        f.service.validate(draft.id, Some(LockToken::new())).await,
        Err(LifecycleError::App(e)) if e.kind == ErrorKind::Conflict
    );

    f.service.validate(draft.id, Some(editor)).await.unwrap();
    f.service.release(draft.root_id, editor).await.unwrap();
    assert!(!f.locks.is_locked(draft.root_id).await.unwrap());
}

#[tokio::test]
async fn test_editor_lock_blocks_publish_until_released() {
    let f = fixture();
    let draft = create(&f, vec![complete(f.fi)]).await;
    let editor = LockToken::new();
    f.service.validate(draft.id, Some(editor)).await.unwrap();

    let model = save_model(Some(draft.id), EntityAction::SaveAndPublish, vec![]);
    assert_matches!(
        f.service.save(&model).await,
        Err(LifecycleError::App(e)) if e.kind == ErrorKind::Conflict
    );
    assert_eq!(f.provider.versions_of(draft.root_id).await.len(), 1);

    f.service.release(draft.root_id, editor).await.unwrap();
    let published = f.service.save(&model).await.unwrap();
    assert_eq!(published.publishing_status, PublishingStatus::Published);
}
