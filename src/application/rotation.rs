//! Daily tip rotation.
//!
//! One cycle resolves today's category, picks an unposted tip at random, publishes it,
//! records the attempt, and then asks the generator for a replacement tip. Only a failed
//! database read or commit aborts a cycle; an empty category, a failed publish, and a failed
//! replenishment are ordinary outcomes.

use std::{fmt, sync::Arc};

use chrono_tz::Tz;
use metrics::counter;
use rand::Rng;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::{
    application::{
        generator::{ContentGenerator, GeneratorError},
        publisher::Publisher,
        repos::{
            CategoriesRepo, CreateTipParams, RecordPostParams, RepoError, TipsRepo,
            TipsWriteRepo,
        },
    },
    domain::{
        entities::{PostHistoryRecord, TipRecord},
        error::DomainError,
        rotation::{category_for_date, compose_post_text, eligible_tip_ids},
    },
    util::timezone::local_date,
};

pub const METRIC_ROTATION_CYCLES: &str = "tipbot_rotation_cycles_total";
pub const METRIC_PUBLISH_FAILURES: &str = "tipbot_publish_failures_total";
pub const METRIC_REPLENISH_FAILURES: &str = "tipbot_replenish_failures_total";

/// Stages of a rotation cycle, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    ResolveCategory,
    QueryEligible,
    Publish,
    RecordHistory,
    Replenish,
}

impl CycleStage {
    pub fn as_str(self) -> &'static str {
        match self {
            CycleStage::ResolveCategory => "resolve_category",
            CycleStage::QueryEligible => "query_eligible",
            CycleStage::Publish => "publish",
            CycleStage::RecordHistory => "record_history",
            CycleStage::Replenish => "replenish",
        }
    }
}

impl fmt::Display for CycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum RotationError {
    #[error("persistence failed during {stage}: {source}")]
    Persistence {
        stage: CycleStage,
        #[source]
        source: RepoError,
    },
}

impl RotationError {
    fn persistence(stage: CycleStage) -> impl FnOnce(RepoError) -> Self {
        move |source| RotationError::Persistence { stage, source }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// The category holds no tips at all (or does not exist).
    CategoryEmpty,
    /// Every tip in the category has already been attempted.
    CategoryExhausted,
}

impl EmptyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            EmptyReason::CategoryEmpty => "category_empty",
            EmptyReason::CategoryExhausted => "category_exhausted",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Eligibility {
    Available(Vec<TipRecord>),
    Empty(EmptyReason),
}

/// Today's pick without any side effects.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Picked { category_id: i64, tip: TipRecord },
    NothingToPost { category_id: i64, reason: EmptyReason },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostReport {
    pub category_id: i64,
    pub tip: TipRecord,
    pub posted: bool,
    pub external_id: Option<String>,
    pub history: PostHistoryRecord,
    pub replacement: Option<TipRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RotationOutcome {
    NothingToPost { category_id: i64, reason: EmptyReason },
    Attempted(Box<PostReport>),
}

#[derive(Debug, Error)]
enum ReplenishError {
    #[error("category {0} does not exist")]
    UnknownCategory(i64),
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Uniform choice among eligible tips.
pub fn choose_tip<R: Rng + ?Sized>(mut eligible: Vec<TipRecord>, rng: &mut R) -> Option<TipRecord> {
    if eligible.is_empty() {
        return None;
    }
    let index = rng.gen_range(0..eligible.len());
    Some(eligible.swap_remove(index))
}

pub struct RotationService {
    tips: Arc<dyn TipsRepo>,
    writer: Arc<dyn TipsWriteRepo>,
    categories: Arc<dyn CategoriesRepo>,
    publisher: Arc<dyn Publisher>,
    generator: Arc<dyn ContentGenerator>,
    timezone: Tz,
    cycle_lock: Mutex<()>,
}

impl RotationService {
    pub fn new(
        tips: Arc<dyn TipsRepo>,
        writer: Arc<dyn TipsWriteRepo>,
        categories: Arc<dyn CategoriesRepo>,
        publisher: Arc<dyn Publisher>,
        generator: Arc<dyn ContentGenerator>,
        timezone: Tz,
    ) -> Self {
        Self {
            tips,
            writer,
            categories,
            publisher,
            generator,
            timezone,
            cycle_lock: Mutex::new(()),
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Category scheduled for the calendar day containing `now` in the rotation timezone.
    pub fn category_for(&self, now: OffsetDateTime) -> i64 {
        category_for_date(local_date(now, self.timezone))
    }

    pub async fn eligible_tips(&self, category_id: i64) -> Result<Eligibility, RepoError> {
        let category_tips = self.tips.list_tip_ids(category_id).await?;
        if category_tips.is_empty() {
            return Ok(Eligibility::Empty(EmptyReason::CategoryEmpty));
        }

        let posted = self.tips.list_posted_tip_ids(&category_tips).await?;
        let eligible = eligible_tip_ids(&category_tips, &posted);
        if eligible.is_empty() {
            return Ok(Eligibility::Empty(EmptyReason::CategoryExhausted));
        }

        let tips = self.tips.get_tips(&eligible).await?;
        if tips.is_empty() {
            return Ok(Eligibility::Empty(EmptyReason::CategoryExhausted));
        }

        Ok(Eligibility::Available(tips))
    }

    /// Pick a random unposted tip for the day containing `now`. Writes nothing.
    pub async fn select(&self, now: OffsetDateTime) -> Result<Selection, RepoError> {
        let category_id = self.category_for(now);
        self.select_in(category_id).await
    }

    async fn select_in(&self, category_id: i64) -> Result<Selection, RepoError> {
        match self.eligible_tips(category_id).await? {
            Eligibility::Empty(reason) => Ok(Selection::NothingToPost {
                category_id,
                reason,
            }),
            Eligibility::Available(tips) => {
                let picked = choose_tip(tips, &mut rand::thread_rng());
                Ok(match picked {
                    Some(tip) => Selection::Picked { category_id, tip },
                    None => Selection::NothingToPost {
                        category_id,
                        reason: EmptyReason::CategoryExhausted,
                    },
                })
            }
        }
    }

    pub async fn run_daily_cycle(&self) -> Result<RotationOutcome, RotationError> {
        self.run_cycle_at(OffsetDateTime::now_utc()).await
    }

    /// Run one full cycle as of `now`. Cycles in this process never overlap.
    pub async fn run_cycle_at(&self, now: OffsetDateTime) -> Result<RotationOutcome, RotationError> {
        let _cycle = self.cycle_lock.lock().await;

        let category_id = self.category_for(now);
        debug!(
            target = "application::rotation",
            stage = %CycleStage::ResolveCategory,
            category_id,
            timezone = %self.timezone,
            "resolved category"
        );

        let selection = self
            .select_in(category_id)
            .await
            .map_err(RotationError::persistence(CycleStage::QueryEligible))
            .inspect_err(|err| log_cycle_failure(category_id, err))?;

        let tip = match selection {
            Selection::NothingToPost {
                category_id,
                reason,
            } => {
                info!(
                    target = "application::rotation",
                    category_id,
                    reason = reason.as_str(),
                    "no tips available for posting today"
                );
                counter!(METRIC_ROTATION_CYCLES, "outcome" => "nothing_to_post").increment(1);
                return Ok(RotationOutcome::NothingToPost {
                    category_id,
                    reason,
                });
            }
            Selection::Picked { tip, .. } => tip,
        };

        let text = compose_post_text(&tip);
        let receipt = self.publisher.publish(&text).await;
        if !receipt.posted {
            warn!(
                target = "application::rotation",
                stage = %CycleStage::Publish,
                tip_id = tip.id,
                platform = self.publisher.platform(),
                "publish failed; the tip is consumed and will not be retried"
            );
            counter!(METRIC_PUBLISH_FAILURES).increment(1);
        }

        let history = self
            .writer
            .record_post(RecordPostParams {
                tip_id: tip.id,
                posted_at: now,
                platform: self.publisher.platform().to_string(),
                external_id: receipt.history_id(),
                engagement_count: 0,
            })
            .await
            .map_err(RotationError::persistence(CycleStage::RecordHistory))
            .inspect_err(|err| log_cycle_failure(category_id, err))?;

        info!(
            target = "application::rotation",
            stage = %CycleStage::RecordHistory,
            category_id,
            tip_id = tip.id,
            posted = receipt.posted,
            external_id = receipt.external_id.as_deref().unwrap_or(""),
            history_id = history.id,
            "recorded post attempt"
        );

        let replacement = self.replenish(category_id, now).await;

        let posted = receipt.posted;
        let outcome = if posted { "posted" } else { "publish_failed" };
        counter!(METRIC_ROTATION_CYCLES, "outcome" => outcome).increment(1);

        Ok(RotationOutcome::Attempted(Box::new(PostReport {
            category_id,
            tip,
            posted,
            external_id: if posted { receipt.external_id } else { None },
            history,
            replacement,
        })))
    }

    /// Best-effort backfill. Failures are logged and never reach the caller.
    async fn replenish(&self, category_id: i64, now: OffsetDateTime) -> Option<TipRecord> {
        match self.try_replenish(category_id, now).await {
            Ok(tip) => {
                info!(
                    target = "application::rotation",
                    stage = %CycleStage::Replenish,
                    category_id,
                    tip_id = tip.id,
                    "added replacement tip"
                );
                Some(tip)
            }
            Err(err) => {
                warn!(
                    target = "application::rotation",
                    stage = %CycleStage::Replenish,
                    category_id,
                    error = %err,
                    "replenishment skipped"
                );
                counter!(METRIC_REPLENISH_FAILURES).increment(1);
                None
            }
        }
    }

    async fn try_replenish(
        &self,
        category_id: i64,
        now: OffsetDateTime,
    ) -> Result<TipRecord, ReplenishError> {
        let category = self
            .categories
            .find_category(category_id)
            .await?
            .ok_or(ReplenishError::UnknownCategory(category_id))?;

        let generated = self.generator.generate(&category).await?;
        let mut draft = generated.draft.normalize()?;
        draft.category_id = category.id;

        let created_at = if generated.created_at > now {
            generated.created_at
        } else {
            now
        };
        let tip = self
            .writer
            .insert_tip(CreateTipParams::from_draft(draft, created_at))
            .await?;
        Ok(tip)
    }
}

fn log_cycle_failure(category_id: i64, err: &RotationError) {
    error!(
        target = "application::rotation",
        category_id,
        error = %err,
        "rotation cycle aborted"
    );
    counter!(METRIC_ROTATION_CYCLES, "outcome" => "failed").increment(1);
}
