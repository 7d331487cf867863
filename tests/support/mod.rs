#![allow(dead_code)]

use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono_tz::Tz;
use time::{OffsetDateTime, macros::datetime};
use tokio::sync::Mutex;

use tipbot::application::{
    generator::{ContentGenerator, GeneratedTip, GeneratorError},
    publisher::{PublishReceipt, Publisher},
    repos::{
        CategoriesRepo, CreateTipParams, HealthRepo, HistoryRepo, RecordPostParams, RepoError,
        SeedRepo, TipQueryFilter, TipsRepo, TipsWriteRepo,
    },
    rotation::RotationService,
    seed::{SeedCatalog, SeedSummary},
};
use tipbot::domain::{
    entities::{CategoryRecord, PostHistoryRecord, TipRecord},
    tips::TipDraft,
    types::TipProvenance,
};

pub const CATEGORY_NAMES: [&str; 8] = [
    "Python",
    "JavaScript",
    "DevOps",
    "Git",
    "Performance",
    "Security",
    "Debugging",
    "APIs",
];

#[derive(Default)]
struct State {
    categories: BTreeMap<i64, CategoryRecord>,
    tips: BTreeMap<i64, TipRecord>,
    history: Vec<PostHistoryRecord>,
    next_tip_id: i64,
    next_history_id: i64,
}

/// In-memory catalog with switchable read and commit failures.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_reads: AtomicBool,
    fail_commits: AtomicBool,
    fail_inserts: AtomicBool,
}

impl MemoryStore {
    /// Store holding the eight standard categories with ids 1..=8 and no tips.
    pub fn with_categories() -> Arc<Self> {
        let store = Self::default();
        {
            let mut state = store.state.try_lock().expect("fresh store is unlocked");
            for (index, name) in CATEGORY_NAMES.iter().enumerate() {
                let id = index as i64 + 1;
                state.categories.insert(
                    id,
                    CategoryRecord {
                        id,
                        name: (*name).to_string(),
                        description: Some(format!("{name} tips")),
                        created_at: None,
                    },
                );
            }
            state.next_tip_id = 1;
            state.next_history_id = 1;
        }
        Arc::new(store)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub async fn add_tip_with_id(&self, id: i64, category_id: i64, title: &str) {
        let mut state = self.state.lock().await;
        state.tips.insert(id, tip_record(id, category_id, title));
        state.next_tip_id = state.next_tip_id.max(id + 1);
    }

    pub async fn add_tip(&self, category_id: i64, title: &str) -> i64 {
        let mut state = self.state.lock().await;
        let id = state.next_tip_id.max(1);
        state.next_tip_id = id + 1;
        state.tips.insert(id, tip_record(id, category_id, title));
        id
    }

    pub async fn mark_posted(&self, tip_id: i64, external_id: &str) {
        let mut state = self.state.lock().await;
        let id = state.next_history_id.max(1);
        state.next_history_id = id + 1;
        let posted_at = datetime!(2025-02-01 09:00:00 UTC);
        state.history.push(PostHistoryRecord {
            id,
            tip_id,
            posted_at,
            platform: "twitter".into(),
            external_id: external_id.into(),
            engagement_count: 0,
        });
        if let Some(tip) = state.tips.get_mut(&tip_id) {
            tip.last_posted = Some(posted_at);
        }
    }

    pub async fn history(&self) -> Vec<PostHistoryRecord> {
        self.state.lock().await.history.clone()
    }

    pub async fn tip(&self, id: i64) -> Option<TipRecord> {
        self.state.lock().await.tips.get(&id).cloned()
    }

    pub async fn tips_in(&self, category_id: i64) -> Vec<TipRecord> {
        self.state
            .lock()
            .await
            .tips
            .values()
            .filter(|tip| tip.category_id == category_id)
            .cloned()
            .collect()
    }

    fn check_reads(&self) -> Result<(), RepoError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(RepoError::Timeout)
        } else {
            Ok(())
        }
    }
}

fn tip_record(id: i64, category_id: i64, title: &str) -> TipRecord {
    TipRecord {
        id,
        category_id,
        title: title.to_string(),
        body: format!("{title} explained."),
        code_sample: None,
        hashtags: Some("#DailyTechTip #Coding".into()),
        provenance: TipProvenance::Human,
        created_at: datetime!(2025-01-01 00:00:00 UTC),
        last_posted: None,
    }
}

#[async_trait]
impl CategoriesRepo for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        self.check_reads()?;
        Ok(self.state.lock().await.categories.values().cloned().collect())
    }

    async fn find_category(&self, id: i64) -> Result<Option<CategoryRecord>, RepoError> {
        self.check_reads()?;
        Ok(self.state.lock().await.categories.get(&id).cloned())
    }
}

#[async_trait]
impl TipsRepo for MemoryStore {
    async fn list_tip_ids(&self, category_id: i64) -> Result<BTreeSet<i64>, RepoError> {
        self.check_reads()?;
        Ok(self
            .state
            .lock()
            .await
            .tips
            .values()
            .filter(|tip| tip.category_id == category_id)
            .map(|tip| tip.id)
            .collect())
    }

    async fn list_posted_tip_ids(&self, ids: &BTreeSet<i64>) -> Result<BTreeSet<i64>, RepoError> {
        self.check_reads()?;
        Ok(self
            .state
            .lock()
            .await
            .history
            .iter()
            .map(|entry| entry.tip_id)
            .filter(|id| ids.contains(id))
            .collect())
    }

    async fn get_tips(&self, ids: &BTreeSet<i64>) -> Result<Vec<TipRecord>, RepoError> {
        self.check_reads()?;
        let state = self.state.lock().await;
        Ok(ids.iter().filter_map(|id| state.tips.get(id).cloned()).collect())
    }

    async fn get_tip(&self, id: i64) -> Result<Option<TipRecord>, RepoError> {
        self.check_reads()?;
        Ok(self.state.lock().await.tips.get(&id).cloned())
    }

    async fn list_tips(&self, filter: &TipQueryFilter) -> Result<Vec<TipRecord>, RepoError> {
        self.check_reads()?;
        let state = self.state.lock().await;
        let posted: BTreeSet<i64> = state.history.iter().map(|entry| entry.tip_id).collect();
        let mut tips: Vec<TipRecord> = state
            .tips
            .values()
            .filter(|tip| filter.category_id.is_none_or(|id| tip.category_id == id))
            .filter(|tip| filter.posted.is_none_or(|want| posted.contains(&tip.id) == want))
            .cloned()
            .collect();
        tips.sort_by_key(|tip| (tip.category_id, tip.id));
        if let Some(limit) = filter.limit {
            tips.truncate(limit as usize);
        }
        Ok(tips)
    }
}

#[async_trait]
impl TipsWriteRepo for MemoryStore {
    async fn insert_tip(&self, params: CreateTipParams) -> Result<TipRecord, RepoError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("insert rejected"));
        }
        let mut state = self.state.lock().await;
        if !state.categories.contains_key(&params.category_id) {
            return Err(RepoError::InvalidInput {
                message: "unknown category".into(),
            });
        }
        let id = state.next_tip_id.max(1);
        state.next_tip_id = id + 1;
        let record = TipRecord {
            id,
            category_id: params.category_id,
            title: params.title,
            body: params.body,
            code_sample: params.code_sample,
            hashtags: params.hashtags,
            provenance: params.provenance,
            created_at: params.created_at,
            last_posted: None,
        };
        state.tips.insert(id, record.clone());
        Ok(record)
    }

    async fn delete_tip(&self, id: i64) -> Result<bool, RepoError> {
        let mut state = self.state.lock().await;
        if state.history.iter().any(|entry| entry.tip_id == id) {
            return Err(RepoError::Integrity {
                message: "tip is referenced by post_history".into(),
            });
        }
        Ok(state.tips.remove(&id).is_some())
    }

    async fn record_post(&self, params: RecordPostParams) -> Result<PostHistoryRecord, RepoError> {
        let mut state = self.state.lock().await;
        if !state.tips.contains_key(&params.tip_id) {
            return Err(RepoError::NotFound);
        }
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("commit failed: connection reset"));
        }

        let id = state.next_history_id.max(1);
        state.next_history_id = id + 1;
        let record = PostHistoryRecord {
            id,
            tip_id: params.tip_id,
            posted_at: params.posted_at,
            platform: params.platform,
            external_id: params.external_id,
            engagement_count: params.engagement_count,
        };
        state.history.push(record.clone());
        if let Some(tip) = state.tips.get_mut(&params.tip_id) {
            tip.last_posted = Some(params.posted_at);
        }
        Ok(record)
    }
}

#[async_trait]
impl HistoryRepo for MemoryStore {
    async fn list_history(&self, limit: u32) -> Result<Vec<PostHistoryRecord>, RepoError> {
        self.check_reads()?;
        let mut history = self.state.lock().await.history.clone();
        history.sort_by(|a, b| b.posted_at.cmp(&a.posted_at).then(b.id.cmp(&a.id)));
        history.truncate(limit as usize);
        Ok(history)
    }
}

#[async_trait]
impl SeedRepo for MemoryStore {
    async fn seed_catalog(&self, catalog: &SeedCatalog) -> Result<SeedSummary, RepoError> {
        let mut state = self.state.lock().await;
        let mut summary = SeedSummary::default();
        for category in &catalog.categories {
            let existing = state
                .categories
                .values()
                .find(|record| record.name == category.name)
                .map(|record| record.id);
            let category_id = match existing {
                Some(id) => id,
                None => {
                    let id = state.categories.keys().max().copied().unwrap_or(0) + 1;
                    state.categories.insert(
                        id,
                        CategoryRecord {
                            id,
                            name: category.name.clone(),
                            description: category.description.clone(),
                            created_at: None,
                        },
                    );
                    summary.categories_created += 1;
                    id
                }
            };
            for tip in &category.tips {
                let exists = state
                    .tips
                    .values()
                    .any(|record| record.category_id == category_id && record.title == tip.title);
                if exists {
                    continue;
                }
                let draft = tip.to_draft().map_err(|err| RepoError::InvalidInput {
                    message: err.to_string(),
                })?;
                let id = state.next_tip_id.max(1);
                state.next_tip_id = id + 1;
                state.tips.insert(
                    id,
                    TipRecord {
                        id,
                        category_id,
                        title: draft.title,
                        body: draft.body,
                        code_sample: draft.code_sample,
                        hashtags: draft.hashtags,
                        provenance: draft.provenance,
                        created_at: OffsetDateTime::now_utc(),
                        last_posted: None,
                    },
                );
                summary.tips_created += 1;
            }
        }
        Ok(summary)
    }
}

#[async_trait]
impl HealthRepo for MemoryStore {
    async fn ping(&self) -> Result<(), RepoError> {
        self.check_reads()
    }
}

/// Publisher that replays scripted receipts, then succeeds with sequential ids.
#[derive(Default)]
pub struct ScriptedPublisher {
    script: Mutex<VecDeque<PublishReceipt>>,
    sent: Mutex<Vec<String>>,
    always_fail: AtomicBool,
}

impl ScriptedPublisher {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let publisher = Self::default();
        publisher.always_fail.store(true, Ordering::SeqCst);
        Arc::new(publisher)
    }

    pub async fn push(&self, receipt: PublishReceipt) {
        self.script.lock().await.push_back(receipt);
    }

    pub async fn sent(&self) -> Vec<String> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Publisher for ScriptedPublisher {
    fn platform(&self) -> &str {
        "twitter"
    }

    async fn publish(&self, text: &str) -> PublishReceipt {
        let mut sent = self.sent.lock().await;
        sent.push(text.to_string());
        if self.always_fail.load(Ordering::SeqCst) {
            return PublishReceipt::failed();
        }
        match self.script.lock().await.pop_front() {
            Some(receipt) => receipt,
            None => PublishReceipt::posted(format!("post-{}", sent.len())),
        }
    }
}

/// Generator that returns a fixed tip or a fixed failure.
pub struct StubGenerator {
    outcome: Result<String, String>,
}

impl StubGenerator {
    pub fn producing(title: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(title.to_string()),
        })
    }

    pub fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(reason.to_string()),
        })
    }
}

#[async_trait]
impl ContentGenerator for StubGenerator {
    async fn generate(&self, category: &CategoryRecord) -> Result<GeneratedTip, GeneratorError> {
        match &self.outcome {
            Ok(title) => Ok(GeneratedTip {
                draft: TipDraft {
                    category_id: category.id,
                    title: title.clone(),
                    body: format!("A fresh {} tip.", category.name),
                    code_sample: None,
                    hashtags: None,
                    provenance: TipProvenance::Generated,
                },
                created_at: datetime!(2025-03-05 09:00:05 UTC),
            }),
            Err(reason) => Err(GeneratorError::Request(reason.clone())),
        }
    }
}

pub fn rotation_service(
    store: &Arc<MemoryStore>,
    publisher: Arc<dyn Publisher>,
    generator: Arc<dyn ContentGenerator>,
) -> RotationService {
    RotationService::new(
        store.clone() as Arc<dyn TipsRepo>,
        store.clone() as Arc<dyn TipsWriteRepo>,
        store.clone() as Arc<dyn CategoriesRepo>,
        publisher,
        generator,
        Tz::UTC,
    )
}

/// 09:00 UTC on Wednesday 2025-03-05 (category 3).
pub const WEDNESDAY_MORNING: OffsetDateTime = datetime!(2025-03-05 09:00:00 UTC);
