use crate::infra::{seeded_store, DELIVERY, DEMO_MEMBERS};
use agile_affinity::config::{AppConfig, EngineConfig};
use agile_affinity::engine::{
    survey_items, AffinityService, ContextId, InMemoryStore, PersonId, PracticeVersionId,
    RecommendationReport, ReportOptions, SurveyAnswer,
};
use agile_affinity::error::AppError;
use clap::Args;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Team average (0-100) a practice needs to be recommended. Defaults to the configured value.
    #[arg(long)]
    pub(crate) min_threshold: Option<u8>,
    /// Affinity points an alternative must gain. Defaults to the configured value.
    #[arg(long)]
    pub(crate) min_improvement: Option<f64>,
    /// Context id for context-specific recommendations (defaults to the delivery context).
    #[arg(long)]
    pub(crate) context: Option<i64>,
    /// Print the textual summary without the JSON report.
    #[arg(long)]
    pub(crate) summary_only: bool,
}

/// Sample answers in questionnaire order; item 10 is reverse-scored.
const DEMO_SURVEYS: [(PersonId, &str, [u8; 10]); 3] = [
    (PersonId(1), "Avery", [5, 5, 3, 3, 1, 1, 2, 2, 4, 1]),
    (PersonId(2), "Jordan", [2, 2, 5, 5, 4, 4, 5, 5, 2, 5]),
    (PersonId(3), "Sam", [2, 2, 2, 2, 1, 1, 3, 3, 5, 1]),
];

const KANBAN: PracticeVersionId = PracticeVersionId(4);

pub(crate) fn print_survey_items() {
    println!("Personality questionnaire (answer each item from 1 to 5)");
    for item in survey_items() {
        let reversed = if item.reverse_scored { ", reversed" } else { "" };
        println!(
            "{:>2}. {} [{}{}]",
            item.id,
            item.prompt,
            item.dimension.label(),
            reversed
        );
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let summary_only = args.summary_only;

    println!("Agile affinity demo");
    let report = build_demo_report(config.engine, args).await?;
    render_summary(&report);

    if !summary_only {
        println!("\n{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

/// Surveys the sample team, waits for every recalculation, records one
/// difficulty flag, and builds the full report.
pub(crate) async fn build_demo_report(
    engine: EngineConfig,
    args: DemoArgs,
) -> Result<RecommendationReport, AppError> {
    let service: AffinityService<InMemoryStore> =
        AffinityService::new(Arc::new(seeded_store()), engine);

    for (person_id, name, values) in DEMO_SURVEYS {
        let answers: Vec<SurveyAnswer> = (1..=10)
            .zip(values)
            .map(|(item_id, value)| SurveyAnswer { item_id, value })
            .collect();
        let submission = service.submit_survey(person_id, &answers)?;
        if let Some(ticket) = submission.recalculation {
            let records = ticket.wait().await?;
            println!("- {name} (person {person_id}): {} practices scored", records.len());
        }
    }

    service.flag_difficulty(
        PersonId(3),
        KANBAN,
        Some("Watching cards age on the board makes me anxious".to_string()),
        Some(DELIVERY),
    )?;

    let options = ReportOptions {
        min_affinity_threshold: args.min_threshold,
        min_improvement: args.min_improvement,
        context_id: Some(args.context.map(ContextId).unwrap_or(DELIVERY)),
        goal_ids: Vec::new(),
        include_difficult: true,
        include_alternatives: true,
    };
    let report = service.comprehensive_report(&DEMO_MEMBERS, options)?;
    info!(
        high = report.summary.high_affinity_count,
        low = report.summary.low_affinity_count,
        "demo report ready"
    );
    Ok(report)
}

fn render_summary(report: &RecommendationReport) {
    println!("\nTeam of {} members", report.summary.member_count);

    println!("High affinity practices:");
    for ranked in &report.high_affinity {
        println!(
            "  - {}: avg {:.1} (min {}, max {})",
            ranked.practice_name, ranked.stats.average, ranked.stats.minimum, ranked.stats.maximum
        );
    }

    println!("Problematic practices:");
    for ranked in &report.low_affinity {
        println!(
            "  - {}: avg {:.1}, weakest member at {}",
            ranked.practice_name, ranked.stats.average, ranked.stats.minimum
        );
    }

    if !report.context_recommendations.is_empty() {
        println!("Recommended for this context:");
        for candidate in &report.context_recommendations {
            println!(
                "  - {}: avg {:.1}",
                candidate.practice_name, candidate.stats.average
            );
        }
    }

    for flagged in &report.difficult_practices {
        println!(
            "Flagged as difficult: {} ({} flag(s))",
            flagged.practice_name, flagged.flag_count
        );
    }

    for suggestion in &report.alternatives {
        println!("Alternative: {}", suggestion.alternative.reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agile_affinity::engine::PracticeStanding;

    #[tokio::test]
    async fn demo_report_proposes_alternatives_for_kanban() {
        let report = build_demo_report(EngineConfig::default(), DemoArgs::default())
            .await
            .expect("demo report builds");

        assert_eq!(report.summary.member_count, 3);
        let kanban = report
            .low_affinity
            .iter()
            .find(|ranked| ranked.practice_version_id == KANBAN)
            .expect("kanban is problematic for the sample team");
        assert_eq!(kanban.standing, PracticeStanding::Problematic);
        assert!(kanban.stats.minimum < 30);

        assert!(!report.alternatives.is_empty());
        assert!(report
            .alternatives
            .iter()
            .all(|suggestion| suggestion.replaces == KANBAN));
        assert_eq!(report.difficult_practices.len(), 1);
        assert!(!report.context_recommendations.is_empty());
    }

    #[tokio::test]
    async fn demo_report_respects_threshold_override() {
        let report = build_demo_report(
            EngineConfig::default(),
            DemoArgs {
                min_threshold: Some(100),
                ..DemoArgs::default()
            },
        )
        .await
        .expect("demo report builds");

        assert!(report.high_affinity.is_empty());
    }
}
