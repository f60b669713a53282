use agile_affinity::engine::{
    ContextId, Goal, GoalId, InMemoryStore, PersonId, Practice, PracticeEntry, PracticeId,
    PracticeTypeId, PracticeVersion, PracticeVersionId, Recommendation, RecommendationId,
    RecommendationKind, TeamId, COLLABORATIVE_CATEGORY, STRUCTURED_CATEGORY,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) const DEMO_TEAM: TeamId = TeamId(1);
pub(crate) const DEMO_MEMBERS: [PersonId; 3] = [PersonId(1), PersonId(2), PersonId(3)];

/// Category for practices that are neither structured nor collaborative.
const FLOW_CATEGORY: PracticeTypeId = PracticeTypeId(3);

pub(crate) const KICKOFF: ContextId = ContextId(1);
pub(crate) const DELIVERY: ContextId = ContextId(2);

const GOALS: [(i64, &str); 5] = [
    (1, "Predictable delivery"),
    (2, "Shared understanding"),
    (3, "Fast feedback"),
    (4, "Continuous improvement"),
    (5, "Product discovery"),
];

const PRACTICES: [(i64, &str, PracticeTypeId, &str); 8] = [
    (
        1,
        "Sprint Planning",
        STRUCTURED_CATEGORY,
        "Time-boxed planning of the next iteration against a prioritised backlog",
    ),
    (
        2,
        "Daily Stand-up",
        COLLABORATIVE_CATEGORY,
        "Short daily sync where the team surfaces blockers",
    ),
    (
        3,
        "Retrospective",
        COLLABORATIVE_CATEGORY,
        "Regular reflection to inspect and adapt how the team handles change",
    ),
    (
        4,
        "Kanban Board",
        FLOW_CATEGORY,
        "Visualise work in progress and limit it to keep flow steady",
    ),
    (
        5,
        "Design Sprint",
        FLOW_CATEGORY,
        "Five-day creative process for rapid prototyping and innovation",
    ),
    (
        6,
        "Mob Programming",
        COLLABORATIVE_CATEGORY,
        "Whole team works on the same change at one keyboard",
    ),
    (
        7,
        "Definition of Done",
        STRUCTURED_CATEGORY,
        "Explicit checklist every increment must satisfy before release",
    ),
    (
        8,
        "Hackathon",
        FLOW_CATEGORY,
        "Creative exploration of ideas that may change the roadmap",
    ),
];

/// (id, practice, kind, context, goals)
const RECOMMENDATIONS: [(i64, i64, RecommendationKind, Option<ContextId>, &[i64]); 9] = [
    (1, 1, RecommendationKind::Helpful, None, &[1, 2]),
    (2, 2, RecommendationKind::Helpful, Some(DELIVERY), &[2, 3]),
    (3, 3, RecommendationKind::Helpful, None, &[4]),
    (4, 4, RecommendationKind::Helpful, Some(DELIVERY), &[2, 3]),
    (5, 5, RecommendationKind::Helpful, Some(KICKOFF), &[5, 2]),
    (6, 6, RecommendationKind::Helpful, Some(DELIVERY), &[2, 3]),
    (7, 7, RecommendationKind::Helpful, None, &[1]),
    (8, 8, RecommendationKind::Helpful, Some(KICKOFF), &[5]),
    (9, 1, RecommendationKind::Unhelpful, Some(KICKOFF), &[5]),
];

/// Builds the sample catalog and a three-person team with no profiles yet.
pub(crate) fn seeded_store() -> InMemoryStore {
    let mut builder = InMemoryStore::builder().team(DEMO_TEAM, DEMO_MEMBERS.to_vec());

    for (id, name) in GOALS {
        builder = builder.goal(Goal {
            id: GoalId(id),
            name: name.to_string(),
        });
    }

    for (id, name, type_id, description) in PRACTICES {
        builder = builder.practice(PracticeEntry {
            version: PracticeVersion {
                id: PracticeVersionId(id),
                practice_id: PracticeId(id),
                label: "1.0".to_string(),
            },
            practice: Practice {
                id: PracticeId(id),
                name: name.to_string(),
                description: description.to_string(),
                type_id,
            },
        });
    }

    for (id, practice, kind, context_id, goals) in RECOMMENDATIONS {
        builder = builder.recommendation(Recommendation {
            id: RecommendationId(id),
            practice_version_id: PracticeVersionId(practice),
            kind,
            context_id,
            goal_ids: goals.iter().copied().map(GoalId).collect(),
        });
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agile_affinity::engine::{CatalogRepository, PeopleRepository};

    #[test]
    fn seeded_store_exposes_demo_team_and_catalog() {
        let store = seeded_store();

        let members = store
            .team_members(DEMO_TEAM)
            .expect("store readable")
            .expect("demo team present");
        assert_eq!(members, DEMO_MEMBERS.to_vec());
        assert_eq!(
            store.practice_versions().expect("store readable").len(),
            PRACTICES.len()
        );
        assert_eq!(
            store.recommendations().expect("store readable").len(),
            RECOMMENDATIONS.len()
        );
    }
}
