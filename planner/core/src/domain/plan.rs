// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Plan Document Aggregate
//!
//! The versioned strategic plan a team fills out once per competition round:
//! business-model canvas, empathy map, narrative wizard steps and the declared
//! strategic epicenter, plus the status that drives the review workflow.
//!
//! Every block name, step index and enumerated value is checked against a fixed
//! schema before anything is written, so a malformed key fails with
//! [`PlanError::UnknownField`] / [`PlanError::InvalidStep`] instead of
//! producing a stray entry in the persisted record.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Plan aggregate, its value objects and the status state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::repository::RepositoryError;

/// Competition round number (1-based).
pub type Round = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanId(pub Uuid);

impl PlanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for PlanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub String);

impl TeamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChampionshipId(pub String);

impl ChampionshipId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChampionshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Status state machine
// ============================================================================

/// Review status of one plan version.
///
/// `Draft` is the only status the owning team edits. `Approved` and
/// `Finalized` are written by a reviewing role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Draft,
    Submitted,
    Approved,
    Finalized,
}

impl PlanStatus {
    pub const ALL: [PlanStatus; 4] = [
        PlanStatus::Draft,
        PlanStatus::Submitted,
        PlanStatus::Approved,
        PlanStatus::Finalized,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Draft => "draft",
            PlanStatus::Submitted => "submitted",
            PlanStatus::Approved => "approved",
            PlanStatus::Finalized => "finalized",
        }
    }

    /// Whether a lineage whose latest persisted status is `from` (`None` when
    /// nothing was saved yet) may gain a new version with status `to`.
    pub fn can_follow(from: Option<PlanStatus>, to: PlanStatus) -> bool {
        use PlanStatus::*;
        matches!(
            (from, to),
            (None, Draft)
                | (Some(Draft), Draft)
                | (Some(Draft), Submitted)
                | (Some(Submitted), Approved)
                | (Some(Approved), Finalized)
        )
    }

    /// Read-only to the owning team.
    pub fn is_locked(&self) -> bool {
        !matches!(self, PlanStatus::Draft)
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanStatus {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlanStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| PlanError::unknown_field("status", s))
    }
}

// ============================================================================
// Epicenter
// ============================================================================

/// Declared primary axis of strategic change for a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Epicenter {
    Resource,
    #[default]
    Offer,
    Customer,
    Finance,
}

impl Epicenter {
    pub const ALL: [Epicenter; 4] = [
        Epicenter::Resource,
        Epicenter::Offer,
        Epicenter::Customer,
        Epicenter::Finance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Epicenter::Resource => "resource",
            Epicenter::Offer => "offer",
            Epicenter::Customer => "customer",
            Epicenter::Finance => "finance",
        }
    }
}

impl fmt::Display for Epicenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Epicenter {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Epicenter::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| PlanError::unknown_field("epicenter", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Public => "public",
        }
    }
}

impl FromStr for Visibility {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Visibility::Private),
            "public" => Ok(Visibility::Public),
            other => Err(PlanError::unknown_field("visibility", other)),
        }
    }
}

// ============================================================================
// Business Model Canvas
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanvasBlock {
    CustomerSegments,
    ValuePropositions,
    Channels,
    CustomerRelationships,
    RevenueStreams,
    KeyResources,
    KeyActivities,
    KeyPartnerships,
    CostStructure,
}

impl CanvasBlock {
    pub const ALL: [CanvasBlock; 9] = [
        CanvasBlock::CustomerSegments,
        CanvasBlock::ValuePropositions,
        CanvasBlock::Channels,
        CanvasBlock::CustomerRelationships,
        CanvasBlock::RevenueStreams,
        CanvasBlock::KeyResources,
        CanvasBlock::KeyActivities,
        CanvasBlock::KeyPartnerships,
        CanvasBlock::CostStructure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanvasBlock::CustomerSegments => "customer_segments",
            CanvasBlock::ValuePropositions => "value_propositions",
            CanvasBlock::Channels => "channels",
            CanvasBlock::CustomerRelationships => "customer_relationships",
            CanvasBlock::RevenueStreams => "revenue_streams",
            CanvasBlock::KeyResources => "key_resources",
            CanvasBlock::KeyActivities => "key_activities",
            CanvasBlock::KeyPartnerships => "key_partnerships",
            CanvasBlock::CostStructure => "cost_structure",
        }
    }
}

impl FromStr for CanvasBlock {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CanvasBlock::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| PlanError::unknown_field("canvas", s))
    }
}

/// The nine Business Model Canvas blocks. Missing keys load as empty text,
/// unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Canvas {
    pub customer_segments: String,
    pub value_propositions: String,
    pub channels: String,
    pub customer_relationships: String,
    pub revenue_streams: String,
    pub key_resources: String,
    pub key_activities: String,
    pub key_partnerships: String,
    pub cost_structure: String,
}

impl Canvas {
    pub fn get(&self, block: CanvasBlock) -> &str {
        match block {
            CanvasBlock::CustomerSegments => &self.customer_segments,
            CanvasBlock::ValuePropositions => &self.value_propositions,
            CanvasBlock::Channels => &self.channels,
            CanvasBlock::CustomerRelationships => &self.customer_relationships,
            CanvasBlock::RevenueStreams => &self.revenue_streams,
            CanvasBlock::KeyResources => &self.key_resources,
            CanvasBlock::KeyActivities => &self.key_activities,
            CanvasBlock::KeyPartnerships => &self.key_partnerships,
            CanvasBlock::CostStructure => &self.cost_structure,
        }
    }

    pub fn set(&mut self, block: CanvasBlock, text: impl Into<String>) {
        let slot = match block {
            CanvasBlock::CustomerSegments => &mut self.customer_segments,
            CanvasBlock::ValuePropositions => &mut self.value_propositions,
            CanvasBlock::Channels => &mut self.channels,
            CanvasBlock::CustomerRelationships => &mut self.customer_relationships,
            CanvasBlock::RevenueStreams => &mut self.revenue_streams,
            CanvasBlock::KeyResources => &mut self.key_resources,
            CanvasBlock::KeyActivities => &mut self.key_activities,
            CanvasBlock::KeyPartnerships => &mut self.key_partnerships,
            CanvasBlock::CostStructure => &mut self.cost_structure,
        };
        *slot = text.into();
    }
}

// ============================================================================
// Empathy Map
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmpathyBlock {
    Sees,
    Hears,
    ThinksFeels,
    SaysDoes,
    Pains,
    Gains,
}

impl EmpathyBlock {
    pub const ALL: [EmpathyBlock; 6] = [
        EmpathyBlock::Sees,
        EmpathyBlock::Hears,
        EmpathyBlock::ThinksFeels,
        EmpathyBlock::SaysDoes,
        EmpathyBlock::Pains,
        EmpathyBlock::Gains,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmpathyBlock::Sees => "sees",
            EmpathyBlock::Hears => "hears",
            EmpathyBlock::ThinksFeels => "thinks_feels",
            EmpathyBlock::SaysDoes => "says_does",
            EmpathyBlock::Pains => "pains",
            EmpathyBlock::Gains => "gains",
        }
    }
}

impl FromStr for EmpathyBlock {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmpathyBlock::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| PlanError::unknown_field("empathy", s))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmpathyMap {
    pub sees: String,
    pub hears: String,
    pub thinks_feels: String,
    pub says_does: String,
    pub pains: String,
    pub gains: String,
}

impl EmpathyMap {
    pub fn get(&self, block: EmpathyBlock) -> &str {
        match block {
            EmpathyBlock::Sees => &self.sees,
            EmpathyBlock::Hears => &self.hears,
            EmpathyBlock::ThinksFeels => &self.thinks_feels,
            EmpathyBlock::SaysDoes => &self.says_does,
            EmpathyBlock::Pains => &self.pains,
            EmpathyBlock::Gains => &self.gains,
        }
    }

    pub fn set(&mut self, block: EmpathyBlock, text: impl Into<String>) {
        let slot = match block {
            EmpathyBlock::Sees => &mut self.sees,
            EmpathyBlock::Hears => &mut self.hears,
            EmpathyBlock::ThinksFeels => &mut self.thinks_feels,
            EmpathyBlock::SaysDoes => &mut self.says_does,
            EmpathyBlock::Pains => &mut self.pains,
            EmpathyBlock::Gains => &mut self.gains,
        };
        *slot = text.into();
    }
}

// ============================================================================
// Wizard steps & plan data
// ============================================================================

/// One narrative wizard step. `text` is the only field the core reads; any
/// other keys the UI stores alongside it are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepEntry {
    #[serde(default)]
    pub text: String,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl StepEntry {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Editable content of a plan, persisted as the record's `data` column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlanData {
    pub steps: BTreeMap<u8, StepEntry>,
    pub canvas: Canvas,
    pub empathy: EmpathyMap,
    pub epicenter: Epicenter,
}

impl PlanData {
    /// Merge a stored `data` payload over the defaults.
    ///
    /// Missing sections and blocks take their default value; unknown keys are
    /// rejected. A `null` payload yields the default plan.
    pub fn from_stored(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
    }

    /// Every stored step index must fall inside `1..=step_count`.
    pub fn validate_steps(&self, step_count: u8) -> Result<(), PlanError> {
        match self.steps.keys().find(|index| !step_in_range(**index, step_count)) {
            Some(index) => Err(PlanError::InvalidStep {
                index: *index,
                max: step_count,
            }),
            None => Ok(()),
        }
    }
}

fn step_in_range(index: u8, step_count: u8) -> bool {
    (1..=step_count).contains(&index)
}

// ============================================================================
// Plan document
// ============================================================================

/// One version of a team's plan for one round.
///
/// A document that was never saved carries `version == 0` and no `id`; its
/// `status` is only meaningful once persisted (see [`PlanDocument::persisted_status`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDocument {
    pub id: Option<PlanId>,
    pub championship_id: ChampionshipId,
    pub team_id: TeamId,
    pub round: Round,
    pub version: u32,
    pub status: PlanStatus,
    pub data: PlanData,
    pub visibility: Visibility,
    pub is_template: bool,
    pub shared_with: Vec<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl PlanDocument {
    /// Fresh, unsaved document with every field at its default.
    pub fn new(championship_id: ChampionshipId, team_id: TeamId, round: Round) -> Self {
        Self {
            id: None,
            championship_id,
            team_id,
            round,
            version: 0,
            status: PlanStatus::Draft,
            data: PlanData::default(),
            visibility: Visibility::Private,
            is_template: false,
            shared_with: Vec::new(),
            saved_at: None,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.version > 0
    }

    /// Status of the version this document was loaded from, `None` if unsaved.
    pub fn persisted_status(&self) -> Option<PlanStatus> {
        self.is_persisted().then_some(self.status)
    }

    pub fn step_text(&self, index: u8) -> Option<&str> {
        self.data.steps.get(&index).map(|s| s.text.as_str())
    }

    /// Set the text of a wizard step, keeping any extra keys already stored.
    pub fn set_step(&mut self, index: u8, text: impl Into<String>, step_count: u8) -> Result<(), PlanError> {
        if !step_in_range(index, step_count) {
            return Err(PlanError::InvalidStep { index, max: step_count });
        }
        self.data.steps.entry(index).or_default().text = text.into();
        Ok(())
    }

    pub fn set_canvas_block(&mut self, block_name: &str, text: impl Into<String>) -> Result<(), PlanError> {
        let block: CanvasBlock = block_name.parse()?;
        self.data.canvas.set(block, text);
        Ok(())
    }

    pub fn set_empathy_block(&mut self, block_name: &str, text: impl Into<String>) -> Result<(), PlanError> {
        let block: EmpathyBlock = block_name.parse()?;
        self.data.empathy.set(block, text);
        Ok(())
    }

    pub fn set_epicenter(&mut self, value: &str) -> Result<(), PlanError> {
        self.data.epicenter = value.parse()?;
        Ok(())
    }

    /// JSON view of the editable content, as handed to advisory prompts.
    pub fn snapshot_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.data).unwrap_or(serde_json::Value::Null)
    }
}

/// A plan version the repository has accepted: it has an id and a version >= 1.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedPlanDocument(PlanDocument);

impl PersistedPlanDocument {
    pub fn new(document: PlanDocument) -> Result<Self, RepositoryError> {
        if document.id.is_none() {
            return Err(RepositoryError::ValidationRejected(
                "persisted plan has no id".to_string(),
            ));
        }
        if document.version == 0 {
            return Err(RepositoryError::ValidationRejected(
                "persisted plan has version 0".to_string(),
            ));
        }
        Ok(Self(document))
    }

    pub fn id(&self) -> PlanId {
        // checked in `new`
        self.0.id.unwrap_or_default()
    }

    pub fn version(&self) -> u32 {
        self.0.version
    }

    pub fn status(&self) -> PlanStatus {
        self.0.status
    }

    pub fn document(&self) -> &PlanDocument {
        &self.0
    }

    pub fn into_document(self) -> PlanDocument {
        self.0
    }
}

impl std::ops::Deref for PersistedPlanDocument {
    type Target = PlanDocument;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Invalid step index {index}: wizard steps are 1..={max}")]
    InvalidStep { index: u8, max: u8 },

    #[error("Unknown {schema} field '{name}'")]
    UnknownField { schema: &'static str, name: String },

    #[error("Invalid status transition from {} to {requested}", status_label(.current))]
    InvalidTransition {
        current: Option<PlanStatus>,
        requested: PlanStatus,
    },

    #[error("Round must be a positive integer, got {0}")]
    InvalidRound(Round),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl PlanError {
    fn unknown_field(schema: &'static str, name: &str) -> Self {
        PlanError::UnknownField {
            schema,
            name: name.to_string(),
        }
    }
}

pub(crate) fn status_label(status: &Option<PlanStatus>) -> &'static str {
    status.map(|s| s.as_str()).unwrap_or("none")
}
