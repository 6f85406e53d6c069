//! Scheduled publishing job.
//!
//! Each sweep reads the language availabilities whose publish or archive
//! instant has passed and transitions them, one unit of work per entity.
//! A due publication must pass the validation checker for its language; a
//! blocked language loses its publish instant and records the failed
//! attempt so it is not retried every sweep.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{error, info, warn};

use catalog_core::error::AppError;
use catalog_core::result::AppResult;
use catalog_core::traits::store::{DueLanguage, ScheduleStore, VersionStore};
use catalog_core::traits::unit_of_work::{UnitOfWork, UnitOfWorkProvider};
use catalog_core::types::{EntityRootId, EntityVersionId, LanguageId};
use catalog_entity::content::ContentVersion;
use catalog_entity::lifecycle::{EntityHeader, HeaderLanguage, PublishingOutcome, PublishingResult};
use catalog_entity::status::PublishingStatus;
use catalog_entity::traits::VersionedEntity;
use catalog_service::{ValidationChecker, VersioningManager};

use super::{JobExecutionError, ScheduledJob};

/// Due languages of one version.
#[derive(Debug)]
struct DueEntity {
    root_id: EntityRootId,
    languages: Vec<LanguageId>,
}

/// Applies due publish and archive instants.
pub struct ScheduledPublishingJob<P, C> {
    provider: Arc<P>,
    versioning: Arc<VersioningManager>,
    validator: Arc<C>,
    batch_size: i64,
}

impl<P, C> std::fmt::Debug for ScheduledPublishingJob<P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledPublishingJob")
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl<P, C> ScheduledPublishingJob<P, C>
where
    P: UnitOfWorkProvider,
    P::Read: ScheduleStore,
    P::Write: VersionStore<ContentVersion>,
    C: ValidationChecker<P::Write>,
{
    /// Create the job. `batch_size` bounds each kind of transition per sweep.
    pub fn new(
        provider: Arc<P>,
        versioning: Arc<VersioningManager>,
        validator: Arc<C>,
        batch_size: i64,
    ) -> Self {
        Self {
            provider,
            versioning,
            validator,
            batch_size,
        }
    }

    /// Run one sweep as of `now`.
    pub async fn run(&self, now: DateTime<Utc>) -> AppResult<Vec<PublishingResult>> {
        let (publications, archivals) = self.find_due(now).await?;
        let mut results = Vec::new();

        for (entity_id, due) in group(publications) {
            results.extend(self.publish_entity(entity_id, due, now).await);
        }
        for (entity_id, due) in group(archivals) {
            results.extend(self.archive_entity(entity_id, due, now).await);
        }
        Ok(results)
    }

    async fn find_due(
        &self,
        now: DateTime<Utc>,
    ) -> AppResult<(Vec<DueLanguage>, Vec<DueLanguage>)> {
        let mut uow = self.provider.begin_read().await?;
        let found = read_due(&mut uow, now, self.batch_size).await;
        end_unit(uow, found).await
    }

    async fn publish_entity(
        &self,
        entity_id: EntityVersionId,
        due: DueEntity,
        now: DateTime<Utc>,
    ) -> Vec<PublishingResult> {
        let outcome = match self.provider.begin_write().await {
            Ok(mut uow) => {
                let outcome = self
                    .publish_in_unit(&mut uow, entity_id, &due, now)
                    .await;
                end_unit(uow, outcome).await
            }
            Err(e) => Err(e),
        };

        outcome.unwrap_or_else(|e| {
            error!(entity_id = %entity_id, error = %e, "Scheduled publishing failed");
            failed(entity_id, &due, &e.to_string())
        })
    }

    async fn publish_in_unit(
        &self,
        uow: &mut P::Write,
        entity_id: EntityVersionId,
        due: &DueEntity,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<PublishingResult>> {
        let mut version = load(&mut *uow, entity_id).await?;

        if version.is_retired() || version.publishing_status == PublishingStatus::OldPublished {
            for language_id in &due.languages {
                if let Some(language) = version.language_mut(*language_id) {
                    language.publish_at = None;
                }
            }
            uow.update_version(&version).await?;
            warn!(entity_id = %entity_id, "Scheduled publication of a superseded version dropped");
            return Ok(failed(entity_id, due, "Version has been superseded"));
        }

        let targets: Vec<HeaderLanguage> = EntityHeader::from_version(&version)
            .language_availabilities
            .into_iter()
            .filter(|l| due.languages.contains(&l.language_id))
            .collect();
        let messages = self
            .validator
            .check_entity(entity_id, &mut *uow, &targets)
            .await?;
        let mut results = Vec::with_capacity(due.languages.len());
        let mut ready = Vec::new();

        for language_id in &due.languages {
            let violations = messages.for_language(*language_id);
            let Some(language) = version.language_mut(*language_id) else {
                results.push(result(
                    due.root_id,
                    entity_id,
                    *language_id,
                    PublishingOutcome::Failed {
                        reason: "Language is not available on the version".to_string(),
                    },
                ));
                continue;
            };

            if violations.is_empty() {
                ready.push(*language_id);
            } else {
                language.publish_at = None;
                language.last_failed_publish_at = Some(now);
                warn!(
                    entity_id = %entity_id,
                    language_id = %language_id,
                    violations = violations.len(),
                    "Scheduled publication blocked by validation"
                );
                results.push(result(
                    due.root_id,
                    entity_id,
                    *language_id,
                    PublishingOutcome::Blocked {
                        rules: violations.iter().map(|m| m.key).collect(),
                    },
                ));
            }
        }

        if ready.is_empty() {
            uow.update_version(&version).await?;
        } else {
            self.versioning
                .publish(&mut *uow, &mut version, &ready, None, now)
                .await?;
        }

        results.extend(ready.into_iter().map(|language_id| {
            result(due.root_id, entity_id, language_id, PublishingOutcome::Published)
        }));
        Ok(results)
    }

    async fn archive_entity(
        &self,
        entity_id: EntityVersionId,
        due: DueEntity,
        now: DateTime<Utc>,
    ) -> Vec<PublishingResult> {
        let outcome = match self.provider.begin_write().await {
            Ok(mut uow) => {
                let outcome = self
                    .archive_in_unit(&mut uow, entity_id, &due, now)
                    .await;
                end_unit(uow, outcome).await
            }
            Err(e) => Err(e),
        };

        outcome.unwrap_or_else(|e| {
            error!(entity_id = %entity_id, error = %e, "Scheduled archiving failed");
            failed(entity_id, &due, &e.to_string())
        })
    }

    async fn archive_in_unit(
        &self,
        uow: &mut P::Write,
        entity_id: EntityVersionId,
        due: &DueEntity,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<PublishingResult>> {
        let mut version = load(&mut *uow, entity_id).await?;

        if version.publishing_status == PublishingStatus::OldPublished {
            for language_id in &due.languages {
                if let Some(language) = version.language_mut(*language_id) {
                    language.archive_at = None;
                }
            }
            uow.update_version(&version).await?;
            warn!(entity_id = %entity_id, "Scheduled archival of a retired version dropped");
            return Ok(failed(entity_id, due, "Version has been retired"));
        }

        let (present, missing): (Vec<LanguageId>, Vec<LanguageId>) = due
            .languages
            .iter()
            .partition(|language_id| version.language(**language_id).is_some());

        if !present.is_empty() {
            self.versioning
                .archive(&mut *uow, &mut version, &present, None, now)
                .await?;
        }

        let archived = present.into_iter().map(|language_id| {
            result(due.root_id, entity_id, language_id, PublishingOutcome::Archived)
        });
        let skipped = missing.into_iter().map(|language_id| {
            result(
                due.root_id,
                entity_id,
                language_id,
                PublishingOutcome::Failed {
                    reason: "Language is not available on the version".to_string(),
                },
            )
        });
        Ok(archived.chain(skipped).collect())
    }
}

#[async_trait]
impl<P, C> ScheduledJob for ScheduledPublishingJob<P, C>
where
    P: UnitOfWorkProvider,
    P::Read: ScheduleStore,
    P::Write: VersionStore<ContentVersion>,
    C: ValidationChecker<P::Write>,
{
    fn name(&self) -> &str {
        "scheduled_publishing"
    }

    async fn execute(&self) -> Result<Value, JobExecutionError> {
        let results = self.run(Utc::now()).await.map_err(|e| {
            JobExecutionError::Transient(format!("Scheduled publishing sweep failed: {e}"))
        })?;

        let count = |matches: fn(&PublishingOutcome) -> bool| {
            results.iter().filter(|r| matches(&r.outcome)).count()
        };
        let published = count(|o| matches!(o, PublishingOutcome::Published));
        let archived = count(|o| matches!(o, PublishingOutcome::Archived));
        let blocked = count(|o| matches!(o, PublishingOutcome::Blocked { .. }));
        let failed = count(|o| matches!(o, PublishingOutcome::Failed { .. }));

        if !results.is_empty() {
            info!(published, archived, blocked, failed, "Scheduled publishing sweep finished");
        }

        Ok(serde_json::json!({
            "task": "scheduled_publishing",
            "published": published,
            "archived": archived,
            "blocked": blocked,
            "failed": failed,
        }))
    }
}

async fn read_due<S: ScheduleStore>(
    uow: &mut S,
    now: DateTime<Utc>,
    limit: i64,
) -> AppResult<(Vec<DueLanguage>, Vec<DueLanguage>)> {
    let publications = uow.due_publications(now, limit).await?;
    let archivals = uow.due_archivals(now, limit).await?;
    Ok((publications, archivals))
}

async fn load<W: VersionStore<ContentVersion>>(
    uow: &mut W,
    entity_id: EntityVersionId,
) -> AppResult<ContentVersion> {
    uow.find_version(entity_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Version {entity_id} not found")))
}

async fn end_unit<U: UnitOfWork, T>(uow: U, outcome: AppResult<T>) -> AppResult<T> {
    match outcome {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = uow.rollback().await {
                error!(error = %rollback_err, "Rollback failed");
            }
            Err(e)
        }
    }
}

fn group(due: Vec<DueLanguage>) -> BTreeMap<EntityVersionId, DueEntity> {
    let mut grouped: BTreeMap<EntityVersionId, DueEntity> = BTreeMap::new();
    for row in due {
        grouped
            .entry(row.entity_id)
            .or_insert_with(|| DueEntity {
                root_id: row.root_id,
                languages: Vec::new(),
            })
            .languages
            .push(row.language_id);
    }
    grouped
}

fn result(
    root_id: EntityRootId,
    entity_id: EntityVersionId,
    language_id: LanguageId,
    outcome: PublishingOutcome,
) -> PublishingResult {
    PublishingResult {
        root_id,
        entity_id,
        language_id,
        outcome,
    }
}

fn failed(entity_id: EntityVersionId, due: &DueEntity, reason: &str) -> Vec<PublishingResult> {
    due.languages
        .iter()
        .map(|language_id| {
            result(
                due.root_id,
                entity_id,
                *language_id,
                PublishingOutcome::Failed {
                    reason: reason.to_string(),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::types::OrganizationId;
    use catalog_database::MemoryUnitOfWorkProvider;
    use catalog_entity::content::{ContentRoot, EntityKind, LocalizedContent};
    use catalog_entity::lifecycle::ValidationRuleKey;
    use catalog_entity::status::LanguageStatus;
    use catalog_service::ContentValidationManager;
    use chrono::Duration;

    type Job = ScheduledPublishingJob<MemoryUnitOfWorkProvider, ContentValidationManager>;

    fn job(provider: &Arc<MemoryUnitOfWorkProvider>) -> Job {
        ScheduledPublishingJob::new(
            Arc::clone(provider),
            Arc::new(VersioningManager::new()),
            Arc::new(ContentValidationManager::default()),
            50,
        )
    }

    fn service(language_id: LanguageId, complete: bool) -> (ContentRoot, ContentVersion) {
        let root = ContentRoot::new(EntityKind::Service);
        let mut version = ContentVersion::first(&root, &[language_id]);
        version.organization_id = Some(OrganizationId::new());
        let mut content = LocalizedContent::named(language_id, "Waste collection");
        if complete {
            content = content
                .with_summary("Household waste pickup schedule")
                .with_description("Bins are emptied every second week.");
        }
        version.upsert_content(content);
        (root, version)
    }

    #[tokio::test]
    async fn test_due_publication_is_published() {
        let provider = Arc::new(MemoryUnitOfWorkProvider::new());
        let fi = LanguageId::new();
        let now = Utc::now();
        let (root, mut version) = service(fi, true);
        version.languages[0].publish_at = Some(now - Duration::minutes(1));
        provider.seed(root, version.clone()).await;

        let results = job(&provider).run(now).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].outcome, PublishingOutcome::Published);
        let stored = provider.version(version.id).await.unwrap();
        assert_eq!(stored.publishing_status, PublishingStatus::Published);
        assert_eq!(stored.languages[0].status, LanguageStatus::Published);
        assert_eq!(stored.languages[0].publish_at, None);
        assert_eq!(stored.versioning.number.major, 1);
    }

    #[tokio::test]
    async fn test_invalid_due_publication_is_blocked() {
        let provider = Arc::new(MemoryUnitOfWorkProvider::new());
        let fi = LanguageId::new();
        let now = Utc::now();
        let (root, mut version) = service(fi, false);
        version.languages[0].publish_at = Some(now - Duration::minutes(1));
        provider.seed(root, version.clone()).await;

        let results = job(&provider).run(now).await.unwrap();

        assert!(matches!(
            &results[0].outcome,
            PublishingOutcome::Blocked { rules } if rules.contains(&ValidationRuleKey::SummaryRequired)
        ));
        let stored = provider.version(version.id).await.unwrap();
        assert_eq!(stored.languages[0].status, LanguageStatus::Draft);
        assert_eq!(stored.languages[0].publish_at, None);
        assert_eq!(stored.languages[0].last_failed_publish_at, Some(now));

        assert!(job(&provider).run(now).await.unwrap().is_empty());
    }

    /// Checker that reports every language clean.
    struct Permissive;

    #[async_trait]
    impl<W: Send> ValidationChecker<W> for Permissive {
        async fn check_entity(
            &self,
            _entity_id: EntityVersionId,
            _uow: &mut W,
            _languages: &[HeaderLanguage],
        ) -> AppResult<catalog_entity::lifecycle::ValidationMessages> {
            Ok(Default::default())
        }
    }

    #[tokio::test]
    async fn test_injected_checker_decides_due_publication() {
        let provider = Arc::new(MemoryUnitOfWorkProvider::new());
        let fi = LanguageId::new();
        let now = Utc::now();
        let (root, mut version) = service(fi, false);
        version.languages[0].publish_at = Some(now - Duration::minutes(1));
        provider.seed(root, version.clone()).await;

        let job = ScheduledPublishingJob::new(
            Arc::clone(&provider),
            Arc::new(VersioningManager::new()),
            Arc::new(Permissive),
            50,
        );
        let results = job.run(now).await.unwrap();

        assert_eq!(results[0].outcome, PublishingOutcome::Published);
        let stored = provider.version(version.id).await.unwrap();
        assert_eq!(stored.languages[0].status, LanguageStatus::Published);
        assert_eq!(stored.languages[0].last_failed_publish_at, None);
    }

    #[tokio::test]
    async fn test_future_instants_are_left_alone() {
        let provider = Arc::new(MemoryUnitOfWorkProvider::new());
        let fi = LanguageId::new();
        let now = Utc::now();
        let (root, mut version) = service(fi, true);
        version.languages[0].publish_at = Some(now + Duration::hours(1));
        provider.seed(root, version.clone()).await;

        assert!(job(&provider).run(now).await.unwrap().is_empty());
        assert_eq!(provider.version(version.id).await, Some(version));
    }

    #[tokio::test]
    async fn test_due_archival_archives_language() {
        let provider = Arc::new(MemoryUnitOfWorkProvider::new());
        let fi = LanguageId::new();
        let now = Utc::now();
        let (root, mut version) = service(fi, true);
        version.languages[0].status = LanguageStatus::Published;
        version.publishing_status = PublishingStatus::Published;
        version.languages[0].archive_at = Some(now - Duration::seconds(5));
        provider.seed(root, version.clone()).await;

        let results = job(&provider).run(now).await.unwrap();

        assert_eq!(results[0].outcome, PublishingOutcome::Archived);
        assert_eq!(results[0].root_id, version.root_id);
        let stored = provider.version(version.id).await.unwrap();
        assert_eq!(stored.languages[0].status, LanguageStatus::Archived);
        assert_eq!(stored.languages[0].archive_at, None);
        assert_eq!(stored.publishing_status, PublishingStatus::Deleted);
    }

    #[tokio::test]
    async fn test_superseded_version_is_not_published() {
        let provider = Arc::new(MemoryUnitOfWorkProvider::new());
        let fi = LanguageId::new();
        let now = Utc::now();
        let (root, mut version) = service(fi, true);
        version.languages[0].publish_at = Some(now - Duration::minutes(1));
        version.versioning.successor_id = Some(EntityVersionId::new());
        provider.seed(root, version.clone()).await;

        let results = job(&provider).run(now).await.unwrap();

        assert!(matches!(results[0].outcome, PublishingOutcome::Failed { .. }));
        let stored = provider.version(version.id).await.unwrap();
        assert_eq!(stored.languages[0].status, LanguageStatus::Draft);
        assert_eq!(stored.languages[0].publish_at, None);
    }

    #[tokio::test]
    async fn test_execute_summarizes_sweep() {
        let provider = Arc::new(MemoryUnitOfWorkProvider::new());
        let now = Utc::now();
        for complete in [true, false] {
            let (root, mut version) = service(LanguageId::new(), complete);
            version.languages[0].publish_at = Some(now - Duration::minutes(1));
            provider.seed(root, version).await;
        }

        let summary = job(&provider).execute().await.unwrap();

        assert_eq!(summary["published"], 1);
        assert_eq!(summary["blocked"], 1);
        assert_eq!(summary["failed"], 0);
    }
}
