// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Advisory service behavior: advisor output passes through, failures
//! degrade to the fallback message and never touch the plan.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use stratplan_core::application::advisory::{history_json, AdvisoryService};
use stratplan_core::application::plan_lifecycle::PlanLifecycleService;
use stratplan_core::domain::advisor::{AuditRequest, LLMError, SuggestionRequest, SuggestionService};
use stratplan_core::domain::kpi::{aggregate, HistoryTable, KpiSnapshot};
use stratplan_core::domain::plan::{ChampionshipId, PlanDocument, PlanStatus, TeamId};
use stratplan_core::domain::planner_config::WizardConfig;
use stratplan_core::infrastructure::repositories::InMemoryPlanRepository;

const FALLBACK: &str = "Advisor offline";

#[derive(Default)]
struct ScriptedAdvisor {
    reply: Option<String>,
    suggestions: Mutex<Vec<SuggestionRequest>>,
    audits: Mutex<Vec<AuditRequest>>,
}

#[async_trait]
impl SuggestionService for ScriptedAdvisor {
    async fn suggest_field(&self, request: &SuggestionRequest) -> Result<String, LLMError> {
        self.suggestions.lock().push(request.clone());
        self.reply
            .clone()
            .ok_or_else(|| LLMError::Network("timeout".to_string()))
    }

    async fn audit_plan(&self, request: &AuditRequest) -> Result<String, LLMError> {
        self.audits.lock().push(request.clone());
        self.reply.clone().ok_or(LLMError::RateLimit)
    }
}

fn advisory(advisor: Option<Arc<dyn SuggestionService>>) -> AdvisoryService {
    AdvisoryService::new(advisor, WizardConfig::default(), "commerce", FALLBACK)
}

fn plan() -> PlanDocument {
    let mut doc = PlanDocument::new(ChampionshipId::new("cup"), TeamId::new("team-a"), 2);
    doc.set_canvas_block("customer_segments", "students").unwrap();
    doc
}

fn history() -> HistoryTable {
    aggregate(&[
        KpiSnapshot::new(1, json!({ "roi": 0.05, "equity": 1000.0 })),
        KpiSnapshot::new(2, json!({ "roi": 0.07 })),
    ])
    .unwrap()
}

#[tokio::test]
async fn test_suggestion_passes_through() {
    let advisor = Arc::new(ScriptedAdvisor {
        reply: Some("Offer a student discount.".to_string()),
        ..Default::default()
    });
    let service = advisory(Some(advisor.clone()));

    let advice = service
        .suggest(&plan(), 2, "value_propositions", "keep it short")
        .await;
    assert!(!advice.is_fallback);
    assert_eq!(advice.text, "Offer a student discount.");

    let requests = advisor.suggestions.lock();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].domain_hint, "value_propositions");
    assert_eq!(requests[0].branch, "commerce");
    assert_eq!(requests[0].context_prompt, "keep it short");
    assert!(requests[0].current_state_json.contains("students"));
}

#[tokio::test]
async fn test_failure_degrades_to_fallback() {
    let service = advisory(Some(Arc::new(ScriptedAdvisor::default())));

    let advice = service.suggest(&plan(), 1, "channels", "").await;
    assert!(advice.is_fallback);
    assert_eq!(advice.text, FALLBACK);

    let audit = service.audit(&plan(), 5, &history()).await;
    assert!(audit.is_fallback);
}

#[tokio::test]
async fn test_blank_reply_degrades_to_fallback() {
    let service = advisory(Some(Arc::new(ScriptedAdvisor {
        reply: Some("   ".to_string()),
        ..Default::default()
    })));
    assert!(service.suggest(&plan(), 1, "channels", "").await.is_fallback);
}

#[tokio::test]
async fn test_no_advisor_configured() {
    let service = advisory(None);
    let advice = service.audit(&plan(), 5, &history()).await;
    assert_eq!(advice.text, FALLBACK);
}

#[tokio::test]
async fn test_audit_receives_history() {
    let advisor = Arc::new(ScriptedAdvisor {
        reply: Some("ROI is improving.".to_string()),
        ..Default::default()
    });
    let service = advisory(Some(advisor.clone()));

    let advice = service.audit(&plan(), 5, &history()).await;
    assert_eq!(advice.text, "ROI is improving.");

    let audits = advisor.audits.lock();
    let history: serde_json::Value = serde_json::from_str(&audits[0].history).unwrap();
    assert_eq!(history[0]["round"], 1);
    assert_eq!(history[0]["indicators"]["equity"], 1000.0);
    assert!(history[1]["indicators"].get("equity").is_none());
}

#[test]
fn test_history_json_shape() {
    let value = history_json(&history());
    assert_eq!(value.as_array().map(Vec::len), Some(2));
    assert_eq!(value[1]["indicators"]["roi"], 0.07);
}

#[tokio::test]
async fn test_accepted_suggestion_is_a_normal_edit() {
    let repo = Arc::new(InMemoryPlanRepository::new());
    let lifecycle = PlanLifecycleService::new(repo, ChampionshipId::new("cup"), 5);
    let service = advisory(Some(Arc::new(ScriptedAdvisor {
        reply: Some("Grow online sales.".to_string()),
        ..Default::default()
    })));

    let team = TeamId::new("team-a");
    let doc = lifecycle.load_or_init(&team, 1).await.unwrap();
    let advice = service.suggest(&doc, 3, "channels", "").await;

    let doc = lifecycle.update_step(&doc, 3, &advice.text).unwrap();
    let persisted = lifecycle.save(&doc, PlanStatus::Draft).await.unwrap();
    assert_eq!(persisted.step_text(3), Some("Grow online sales."));
}
