use crate::domain::{ContentRecord, Environment};
use crate::environment::EnvironmentResolver;
use crate::error::{error_chain_fmt, InputError, StoreError};
use crate::models::{Post, PostDraft};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromotionOutcome {
    Inserted,
    Updated,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Promotion {
    pub outcome: PromotionOutcome,
    pub post: Post,
}

#[derive(thiserror::Error)]
pub enum PromotionError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("Failed to write '{slug}' to the {environment} store.")]
    Store {
        slug: String,
        environment: Environment,
        #[source]
        source: StoreError,
    },
}

impl std::fmt::Debug for PromotionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Copies published posts between environment stores, keyed by slug.
///
/// A promotion is a single upsert against the target store. Re-running it
/// after the source changed re-syncs the target row instead of adding a new
/// one. Nothing spans both stores, so there is nothing to roll back.
pub struct ContentPromoter {
    resolver: EnvironmentResolver,
}

impl ContentPromoter {
    pub fn new(resolver: EnvironmentResolver) -> Self {
        Self { resolver }
    }

    #[tracing::instrument(
        name = "Promote a post",
        skip(self, record),
        fields(post_slug = %record.slug, source = %source, target = %target)
    )]
    pub async fn promote(
        &self,
        record: &ContentRecord,
        source: Environment,
        target: Environment,
    ) -> Result<Promotion, PromotionError> {
        if source == target {
            return Err(InputError::SameEnvironment(source).into());
        }
        if record.slug.trim().is_empty() {
            return Err(InputError::MissingSlug.into());
        }
        if !record.published {
            return Err(InputError::Unpublished(record.slug.clone()).into());
        }

        let store_failure = |source: StoreError| PromotionError::Store {
            slug: record.slug.clone(),
            environment: target,
            source,
        };
        let store = self.resolver.resolve(target);
        let draft = PostDraft::from(record);

        let existing = store
            .find_post_by_slug(&record.slug)
            .await
            .map_err(store_failure)?;
        let promotion = match existing {
            Some(existing) => Promotion {
                outcome: PromotionOutcome::Updated,
                post: store
                    .update_post(existing.id, draft)
                    .await
                    .map_err(store_failure)?,
            },
            None => Promotion {
                outcome: PromotionOutcome::Inserted,
                post: store.insert_post(draft).await.map_err(store_failure)?,
            },
        };

        tracing::info!(outcome = ?promotion.outcome, "Post promoted");
        Ok(promotion)
    }

    /// Load `slug` from the `source` store, then [`promote`](Self::promote) it.
    pub async fn promote_slug(
        &self,
        slug: &str,
        source: Environment,
        target: Environment,
    ) -> Result<Promotion, PromotionError> {
        if source == target {
            return Err(InputError::SameEnvironment(source).into());
        }
        if slug.trim().is_empty() {
            return Err(InputError::MissingSlug.into());
        }
        let record: ContentRecord = self
            .resolver
            .resolve(source)
            .find_post_by_slug(slug)
            .await
            .map_err(|e| PromotionError::Store {
                slug: slug.to_string(),
                environment: source,
                source: e,
            })?
            .ok_or_else(|| InputError::UnknownSlug {
                slug: slug.to_string(),
                environment: source,
            })?
            .into();
        self.promote(&record, source, target).await
    }
}
