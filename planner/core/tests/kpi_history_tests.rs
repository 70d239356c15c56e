// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! KPI history aggregation through the repository, in memory and on disk.

use serde_json::json;
use std::sync::Arc;
use stratplan_core::application::kpi_history::{HistoryError, KpiHistoryService};
use stratplan_core::domain::kpi::{aggregate, indicator_catalogue, KpiError, KpiSnapshot};
use stratplan_core::domain::plan::TeamId;
use stratplan_core::infrastructure::repositories::local::LocalPlanRepository;
use stratplan_core::infrastructure::repositories::InMemoryPlanRepository;
use tempfile::TempDir;

#[test]
fn test_absent_value_is_not_zero() {
    let snapshots = vec![
        KpiSnapshot::new(1, json!({ "roi": 5 })),
        KpiSnapshot::new(2, json!({})),
    ];
    let table = aggregate(&snapshots).unwrap();

    assert_eq!(table.value_at(1, "roi").unwrap(), Some(5.0));
    assert_eq!(table.value_at(2, "roi").unwrap(), None);
    assert_eq!(table.delta(2, "roi").unwrap(), None);
}

#[test]
fn test_gaps_are_not_synthesized() {
    let snapshots = vec![
        KpiSnapshot::new(3, json!({ "bep": 1200.0 })),
        KpiSnapshot::new(1, json!({ "bep": 900.0 })),
    ];
    let table = aggregate(&snapshots).unwrap();

    assert_eq!(table.rounds(), vec![1, 3]);
    assert_eq!(table.value_at(2, "bep").unwrap(), None);
    // delta compares against the previous recorded round
    assert_eq!(table.delta(3, "bep").unwrap(), Some(300.0));
    // input left untouched
    assert_eq!(snapshots[0].round, 3);
}

#[test]
fn test_statement_indicators_and_summary() {
    let table = aggregate(&[KpiSnapshot::new(
        1,
        json!({
            "roi": 0.08,
            "statements": {
                "dre": { "revenue": 150000.0, "net_profit": 12000.0 },
                "balance_sheet": { "total_assets": 300000.0 }
            }
        }),
    )])
    .unwrap();

    assert_eq!(table.value_at(1, "revenue").unwrap(), Some(150000.0));
    assert_eq!(table.value_at(1, "total_assets").unwrap(), Some(300000.0));
    assert_eq!(table.value_at(1, "ebitda").unwrap(), None);

    let summary = table.financial_summary(1).unwrap();
    assert_eq!(summary.len(), 4);
    assert!(summary.contains_key("net_profit"));
    assert!(!summary.contains_key("ebitda"));
    assert!(table.financial_summary(2).is_none());
}

#[test]
fn test_unknown_indicator_is_an_error() {
    let table = aggregate(&[]).unwrap();
    assert!(table.is_empty());
    assert_eq!(
        table.value_at(1, "happiness"),
        Err(KpiError::UnknownIndicator("happiness".to_string()))
    );
    assert!(indicator_catalogue().iter().any(|i| i.name == "solvency_index"));
}

#[tokio::test]
async fn test_service_reads_in_memory_history() {
    let repo = Arc::new(InMemoryPlanRepository::new());
    let team = TeamId::new("team-a");
    repo.record_history(&team, KpiSnapshot::new(2, json!({ "roi": 0.2 })));
    repo.record_history(&team, KpiSnapshot::new(1, json!({ "roi": 0.1 })));

    let service = KpiHistoryService::new(repo);
    let table = service.team_history(&team).await.unwrap();

    assert_eq!(table.latest_round(), Some(2));
    let series = table.series("roi").unwrap();
    assert_eq!(series, vec![(1, Some(0.1)), (2, Some(0.2))]);

    let empty = service.team_history(&TeamId::new("team-b")).await.unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn test_service_reports_duplicate_rounds() {
    let repo = Arc::new(InMemoryPlanRepository::new());
    let team = TeamId::new("team-a");
    repo.record_history(&team, KpiSnapshot::new(1, json!({ "roi": 0.1 })));
    repo.record_history(&team, KpiSnapshot::new(1, json!({ "roi": 0.3 })));

    let result = KpiHistoryService::new(repo).team_history(&team).await;
    assert!(matches!(
        result,
        Err(HistoryError::Kpi(KpiError::DuplicateRound(1)))
    ));
}

#[tokio::test]
async fn test_service_reads_local_history_file() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("history")).unwrap();
    std::fs::write(
        temp.path().join("history/team-a.json"),
        json!([
            { "round": 1, "kpis": { "solvency_index": 1.4 } },
            { "round": 2 }
        ])
        .to_string(),
    )
    .unwrap();

    let repo = Arc::new(LocalPlanRepository::new(temp.path()).unwrap());
    let table = KpiHistoryService::new(repo)
        .team_history(&TeamId::new("team-a"))
        .await
        .unwrap();

    assert_eq!(table.rounds(), vec![1, 2]);
    assert_eq!(table.value_at(1, "solvency_index").unwrap(), Some(1.4));
    assert_eq!(table.value_at(2, "solvency_index").unwrap(), None);
}
