// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Prompt Template Engine
//!
//! Renders advisor prompts from Handlebars templates.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Turn suggestion and audit requests into provider prompts
//!
//! # Placeholders
//!
//! Suggestion: `{{step_label}}`, `{{domain_hint}}`, `{{current_state_json}}`,
//! `{{context_prompt}}`, `{{branch}}`.
//!
//! Audit: `{{step_label}}`, `{{plan_snapshot_json}}`, `{{history}}`.
//!
//! Output is not HTML-escaped; the JSON payloads go to the model verbatim.

use anyhow::{Context, Result};
use handlebars::Handlebars;

use crate::domain::advisor::{AuditRequest, SuggestionRequest};

const SUGGEST_TEMPLATE_NAME: &str = "suggest";
const AUDIT_TEMPLATE_NAME: &str = "audit";

const DEFAULT_SUGGEST_TEMPLATE: &str = "\
You are a business strategy coach helping a student team run a simulated \
{{branch}} company.

The team is working on the step \"{{step_label}}\" of its business plan and \
asks for a proposal for the field \"{{domain_hint}}\".

Current plan:
{{current_state_json}}
{{#if context_prompt}}

Instructions from the team:
{{context_prompt}}
{{/if}}

Answer with the proposed text for \"{{domain_hint}}\" only, in at most three \
short paragraphs.";

const DEFAULT_AUDIT_TEMPLATE: &str = "\
You are reviewing a student team's business plan during the step \
\"{{step_label}}\".

Plan:
{{plan_snapshot_json}}

Financial results of previous rounds (indicator values per round):
{{history}}

Point out where the plan contradicts the financial results, which \
indicators deserve attention next round, and one concrete correction. Be \
brief and specific.";

pub struct PromptTemplateEngine {
    handlebars: Handlebars<'static>,
}

impl PromptTemplateEngine {
    /// Engine with the built-in suggestion and audit templates.
    pub fn new() -> Result<Self> {
        Self::with_templates(DEFAULT_SUGGEST_TEMPLATE, DEFAULT_AUDIT_TEMPLATE)
    }

    pub fn with_templates(suggest: &str, audit: &str) -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(handlebars::no_escape);

        handlebars
            .register_template_string(SUGGEST_TEMPLATE_NAME, suggest)
            .context("Invalid suggestion template")?;
        handlebars
            .register_template_string(AUDIT_TEMPLATE_NAME, audit)
            .context("Invalid audit template")?;

        Ok(Self { handlebars })
    }

    pub fn render_suggestion(&self, request: &SuggestionRequest) -> Result<String> {
        self.handlebars
            .render(SUGGEST_TEMPLATE_NAME, request)
            .context("Failed to render suggestion prompt")
    }

    pub fn render_audit(&self, request: &AuditRequest) -> Result<String> {
        self.handlebars
            .render(AUDIT_TEMPLATE_NAME, request)
            .context("Failed to render audit prompt")
    }
}
