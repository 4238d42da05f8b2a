use crate::SocialApi;
use crate::model::{Liker, Post, PostId, Username};
use error_stack::{Report, ResultExt};
use futures::StreamExt;
use futures::stream;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use tracing::{instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEFAULT_FAN_OUT: NonZeroUsize = NonZeroUsize::new(8).unwrap();

#[derive(Debug, thiserror::Error)]
pub enum AudienceError {
    #[error("could not load the user's post lists")]
    Posts,
    #[error("{failed} of {total} liker batches failed")]
    Incomplete { failed: usize, total: usize },
}

pub type AudienceResult<T> = Result<T, Report<AudienceError>>;

/// Which post list a liker batch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PostSource {
    Own,
    Tagged,
}

/// The likers of one post, tagged with the post that produced them. Keeping
/// the post id on every batch is what lets the own/tagged split survive
/// filtering or reordering of the post lists.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LikerBatch {
    pub post: PostId,
    pub source: PostSource,
    pub likers: Vec<Liker>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchFailure {
    pub post: PostId,
    pub source: PostSource,
    pub reason: String,
}

/// The outcome of one aggregation run. `run` changes on every run, so a
/// caller juggling overlapping searches can discard reports that no longer
/// match its active one.
#[derive(Debug, Serialize, ToSchema)]
pub struct AudienceReport {
    pub run: Uuid,
    pub own_post_count: usize,
    pub tagged_post_count: usize,
    pub batches: Vec<LikerBatch>,
    pub failures: Vec<BatchFailure>,
}

impl AudienceReport {
    pub fn own_likers(&self) -> impl Iterator<Item = &Liker> {
        self.likers_from(PostSource::Own)
    }

    pub fn tagged_likers(&self) -> impl Iterator<Item = &Liker> {
        self.likers_from(PostSource::Tagged)
    }

    fn likers_from(&self, source: PostSource) -> impl Iterator<Item = &Liker> {
        self.batches
            .iter()
            .filter(move |batch| batch.source == source)
            .flat_map(|batch| batch.likers.iter())
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fans out one likers request per post across a user's own and tagged post
/// lists. The fan-out is bounded and order-preserving, so batch order always
/// matches post order no matter how the network interleaves completions.
#[derive(Debug, Clone)]
pub struct AudienceAggregator<S> {
    social: S,
    fan_out: NonZeroUsize,
}

impl<S> AudienceAggregator<S>
where
    S: SocialApi + Sync,
{
    pub fn new(social: S) -> Self {
        Self {
            social,
            fan_out: DEFAULT_FAN_OUT,
        }
    }

    pub fn with_fan_out(mut self, fan_out: NonZeroUsize) -> Self {
        self.fan_out = fan_out;
        self
    }

    /// Collects liker batches for every own and tagged post. A failed liker
    /// fetch becomes a `BatchFailure` entry instead of discarding the rest
    /// of the run.
    #[instrument(skip_all, fields(user = %username))]
    pub async fn collect(&self, username: &Username) -> AudienceResult<AudienceReport> {
        let (own, tagged) = tokio::try_join!(
            self.social.user_posts(username, None),
            self.social.tagged_posts(username, None),
        )
        .change_context(AudienceError::Posts)?;

        let own_post_count = own.items.len();
        let tagged_post_count = tagged.items.len();

        let posts: Vec<(PostSource, Post)> = own
            .items
            .into_iter()
            .map(|post| (PostSource::Own, post))
            .chain(tagged.items.into_iter().map(|post| (PostSource::Tagged, post)))
            .collect();

        let social = &self.social;
        let outcomes: Vec<Result<LikerBatch, BatchFailure>> = stream::iter(posts)
            .map(|(source, post)| async move {
                let id = post.id;
                match social.post_likers(&id).await {
                    Ok(likers) => Ok(LikerBatch {
                        post: id,
                        source,
                        likers,
                    }),
                    Err(report) => {
                        warn!("liker fetch for post {id} failed: {report:?}");
                        Err(BatchFailure {
                            reason: report.current_context().to_string(),
                            post: id,
                            source,
                        })
                    }
                }
            })
            .buffered(self.fan_out.get())
            .collect()
            .await;

        let mut batches = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(batch) => batches.push(batch),
                Err(failure) => failures.push(failure),
            }
        }

        Ok(AudienceReport {
            run: Uuid::now_v7(),
            own_post_count,
            tagged_post_count,
            batches,
            failures,
        })
    }

    /// The all-or-nothing variant: a single failed batch rejects the whole
    /// run and no partial lists escape.
    #[instrument(skip_all, fields(user = %username))]
    pub async fn collect_strict(&self, username: &Username) -> AudienceResult<AudienceReport> {
        let report = self.collect(username).await?;

        if report.is_complete() {
            Ok(report)
        } else {
            let failed = report.failures.len();
            Err(Report::new(AudienceError::Incomplete {
                failed,
                total: failed + report.batches.len(),
            }))
        }
    }
}
