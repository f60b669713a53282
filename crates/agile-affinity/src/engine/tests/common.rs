use std::collections::BTreeSet;
use std::sync::Arc;

use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::engine::domain::{
    AffinityRecord, AffinitySource, DifficultyFlag, Goal, GoalId, PersonId, Practice,
    PracticeEntry, PracticeId, PracticeTypeId, PracticeVersion, PracticeVersionId,
    Recommendation, RecommendationId, RecommendationKind, TeamId, TraitProfile,
};
use crate::engine::memory::{InMemoryStore, InMemoryStoreBuilder};
use crate::engine::repository::{
    AffinityRepository, CatalogRepository, FlagRepository, PeopleRepository, ProfileRepository,
    RepositoryError,
};
use crate::engine::service::AffinityService;
use crate::engine::survey::SurveyAnswer;

pub(super) const TEAM: TeamId = TeamId(100);

pub(super) fn entry(id: i64, name: &str, type_id: i64, description: &str) -> PracticeEntry {
    PracticeEntry {
        version: PracticeVersion {
            id: PracticeVersionId(id),
            practice_id: PracticeId(id),
            label: "1.0".to_string(),
        },
        practice: Practice {
            id: PracticeId(id),
            name: name.to_string(),
            description: description.to_string(),
            type_id: PracticeTypeId(type_id),
        },
    }
}

pub(super) fn recommendation(
    id: i64,
    practice: i64,
    goals: &[i64],
    context: Option<i64>,
    kind: RecommendationKind,
) -> Recommendation {
    Recommendation {
        id: RecommendationId(id),
        practice_version_id: PracticeVersionId(practice),
        kind,
        context_id: context.map(crate::engine::domain::ContextId),
        goal_ids: goals.iter().copied().map(GoalId).collect::<BTreeSet<_>>(),
    }
}

pub(super) fn affinity(person: i64, practice: i64, score: u8) -> AffinityRecord {
    AffinityRecord {
        person_id: PersonId(person),
        practice_version_id: PracticeVersionId(practice),
        score,
        source: AffinitySource::Calculated,
        updated_at: Utc::now(),
    }
}

pub(super) fn persons(ids: &[i64]) -> Vec<PersonId> {
    ids.iter().copied().map(PersonId).collect()
}

pub(super) fn ids(practices: &[i64]) -> Vec<PracticeVersionId> {
    practices.iter().copied().map(PracticeVersionId).collect()
}

/// Answers for the whole questionnaire, in item order.
pub(super) fn full_survey(values: [u8; 10]) -> Vec<SurveyAnswer> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| SurveyAnswer {
            item_id: index as u32 + 1,
            value: *value,
        })
        .collect()
}

/// Seven practices, four goals, and a three-person team without affinities.
///
/// | practice | goals      | recommendation          |
/// |----------|------------|-------------------------|
/// | 1        | 1, 2, 3    | helpful, any context    |
/// | 2        | 1, 2, 3    | helpful, context 10     |
/// | 3        | 1, 2       | helpful, any context    |
/// | 4        | 4          | helpful, context 20     |
/// | 5        | 3          | unhelpful, any context  |
/// | 6        | 1, 2, 3, 4 | helpful, context 20     |
/// | 7        | none       | none                    |
pub(super) fn catalog() -> InMemoryStoreBuilder {
    InMemoryStore::builder()
        .team(TEAM, persons(&[1, 2, 3]))
        .person(PersonId(4))
        .goal(Goal {
            id: GoalId(1),
            name: "Shared understanding".to_string(),
        })
        .goal(Goal {
            id: GoalId(2),
            name: "Fast feedback".to_string(),
        })
        .goal(Goal {
            id: GoalId(3),
            name: "Predictable delivery".to_string(),
        })
        .goal(Goal {
            id: GoalId(4),
            name: "Continuous improvement".to_string(),
        })
        .practice(entry(1, "Sprint Planning", 1, "Plan the iteration scope"))
        .practice(entry(2, "Kanban Board", 3, "Visualise flow and limit work"))
        .practice(entry(3, "Mob Programming", 2, "Whole-team creative problem solving"))
        .practice(entry(4, "Retrospective", 2, "Inspect and adapt to change"))
        .practice(entry(5, "Big Design Up Front", 1, "Fix the design before coding"))
        .practice(entry(6, "Scrumban", 3, "Innovation friendly flow with cadence"))
        .practice(entry(7, "Pair Programming", 2, "Two people, one keyboard"))
        .recommendation(recommendation(1, 1, &[1, 2, 3], None, RecommendationKind::Helpful))
        .recommendation(recommendation(2, 2, &[1, 2, 3], Some(10), RecommendationKind::Helpful))
        .recommendation(recommendation(3, 3, &[1, 2], None, RecommendationKind::Helpful))
        .recommendation(recommendation(4, 4, &[4], Some(20), RecommendationKind::Helpful))
        .recommendation(recommendation(5, 5, &[3], None, RecommendationKind::Unhelpful))
        .recommendation(recommendation(6, 6, &[1, 2, 3, 4], Some(20), RecommendationKind::Helpful))
}

fn with_scores(mut builder: InMemoryStoreBuilder, practice: i64, scores: [u8; 3]) -> InMemoryStoreBuilder {
    for (index, score) in scores.into_iter().enumerate() {
        builder = builder.affinity(affinity(index as i64 + 1, practice, score));
    }
    builder
}

/// Catalog with stored affinities for persons 1 to 3.
///
/// Averages: p1 30 (min 20), p2 70, p3 100, p4 50, p5 35, p6 70, p7 45.
pub(super) fn scored_catalog() -> InMemoryStoreBuilder {
    let mut builder = catalog();
    for (practice, scores) in [
        (1, [20, 30, 40]),
        (2, [60, 70, 80]),
        (3, [100, 100, 100]),
        (4, [50, 50, 50]),
        (5, [35, 35, 35]),
        (6, [60, 70, 80]),
        (7, [45, 45, 45]),
    ] {
        builder = with_scores(builder, practice, scores);
    }
    builder
}

pub(super) fn scored_store() -> Arc<InMemoryStore> {
    Arc::new(scored_catalog().build())
}

pub(super) fn service(store: Arc<InMemoryStore>) -> AffinityService<InMemoryStore> {
    AffinityService::new(store, EngineConfig::default())
}

/// Wraps a real store and injects failures into selected calls.
pub(super) struct FaultyStore {
    pub(super) inner: InMemoryStore,
    pub(super) fail_batches: bool,
    pub(super) fail_recommendations: bool,
}

impl FaultyStore {
    pub(super) fn failing_batches(inner: InMemoryStore) -> Self {
        Self {
            inner,
            fail_batches: true,
            fail_recommendations: false,
        }
    }

    pub(super) fn failing_recommendations(inner: InMemoryStore) -> Self {
        Self {
            inner,
            fail_batches: false,
            fail_recommendations: true,
        }
    }
}

impl PeopleRepository for FaultyStore {
    fn person_exists(&self, person_id: PersonId) -> Result<bool, RepositoryError> {
        self.inner.person_exists(person_id)
    }

    fn team_members(&self, team_id: TeamId) -> Result<Option<Vec<PersonId>>, RepositoryError> {
        self.inner.team_members(team_id)
    }
}

impl ProfileRepository for FaultyStore {
    fn fetch_profile(&self, person_id: PersonId) -> Result<Option<TraitProfile>, RepositoryError> {
        self.inner.fetch_profile(person_id)
    }

    fn save_profile(&self, profile: TraitProfile) -> Result<TraitProfile, RepositoryError> {
        self.inner.save_profile(profile)
    }
}

impl CatalogRepository for FaultyStore {
    fn practice_versions(&self) -> Result<Vec<PracticeEntry>, RepositoryError> {
        self.inner.practice_versions()
    }

    fn practice_version(
        &self,
        id: PracticeVersionId,
    ) -> Result<Option<PracticeEntry>, RepositoryError> {
        self.inner.practice_version(id)
    }

    fn recommendations(&self) -> Result<Vec<Recommendation>, RepositoryError> {
        if self.fail_recommendations {
            return Err(RepositoryError::Unavailable("catalog offline".to_string()));
        }
        self.inner.recommendations()
    }

    fn goals(&self, ids: &BTreeSet<GoalId>) -> Result<Vec<Goal>, RepositoryError> {
        self.inner.goals(ids)
    }
}

impl AffinityRepository for FaultyStore {
    fn affinity(
        &self,
        person_id: PersonId,
        practice_version_id: PracticeVersionId,
    ) -> Result<Option<AffinityRecord>, RepositoryError> {
        self.inner.affinity(person_id, practice_version_id)
    }

    fn affinities_for_person(
        &self,
        person_id: PersonId,
    ) -> Result<Vec<AffinityRecord>, RepositoryError> {
        self.inner.affinities_for_person(person_id)
    }

    fn affinities_for_practice(
        &self,
        practice_version_id: PracticeVersionId,
    ) -> Result<Vec<AffinityRecord>, RepositoryError> {
        self.inner.affinities_for_practice(practice_version_id)
    }

    fn upsert_affinity(&self, record: AffinityRecord) -> Result<AffinityRecord, RepositoryError> {
        self.inner.upsert_affinity(record)
    }

    fn upsert_affinity_batch(
        &self,
        person_id: PersonId,
        records: Vec<AffinityRecord>,
    ) -> Result<Vec<AffinityRecord>, RepositoryError> {
        if self.fail_batches {
            return Err(RepositoryError::Transaction("deadlock detected".to_string()));
        }
        self.inner.upsert_affinity_batch(person_id, records)
    }
}

impl FlagRepository for FaultyStore {
    fn upsert_flag(&self, flag: DifficultyFlag) -> Result<DifficultyFlag, RepositoryError> {
        self.inner.upsert_flag(flag)
    }

    fn flags_for_persons(
        &self,
        person_ids: &[PersonId],
    ) -> Result<Vec<DifficultyFlag>, RepositoryError> {
        self.inner.flags_for_persons(person_ids)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
