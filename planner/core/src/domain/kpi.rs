// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Round KPI History
//!
//! Aggregates the per-round KPI snapshots recorded by the simulation engine
//! into a [`HistoryTable`] indexed by round number and indicator name.
//!
//! Rounds that were never recorded are absent columns, never synthesized.
//! Values that were not recorded are `None`, never `0.0`: a dashboard must
//! render a placeholder for them instead of implying a measured zero.
//!
//! The aggregator only reads: snapshots are borrowed and copied into the
//! table, the caller's list is left untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::plan::Round;

/// KPI values recorded for one completed round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSnapshot {
    pub round: Round,

    /// Sparse indicator map, plus a nested `statements` object for line items.
    #[serde(default)]
    pub kpis: Map<String, Value>,
}

impl KpiSnapshot {
    /// Build a snapshot from a JSON object. Non-object values yield an empty map.
    pub fn new(round: Round, kpis: Value) -> Self {
        let kpis = match kpis {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self { round, kpis }
    }
}

/// Where an indicator's value lives inside a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorSource {
    /// `kpis.<name>`
    Flat,
    /// `kpis.statements.<statement>.<name>`
    Statement(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indicator {
    pub name: &'static str,
    pub source: IndicatorSource,
}

const fn flat(name: &'static str) -> Indicator {
    Indicator {
        name,
        source: IndicatorSource::Flat,
    }
}

const fn statement(statement: &'static str, name: &'static str) -> Indicator {
    Indicator {
        name,
        source: IndicatorSource::Statement(statement),
    }
}

const CATALOGUE: &[Indicator] = &[
    flat("roi"),
    flat("bep"),
    flat("solvency_index"),
    flat("liquidity_current"),
    flat("liquidity_quick"),
    flat("scissors_effect"),
    flat("equity"),
    flat("working_capital"),
    flat("market_share"),
    statement("dre", "revenue"),
    statement("dre", "cost_of_goods_sold"),
    statement("dre", "gross_profit"),
    statement("dre", "operating_expenses"),
    statement("dre", "ebitda"),
    statement("dre", "net_profit"),
    statement("balance_sheet", "total_assets"),
    statement("balance_sheet", "total_liabilities"),
];

/// The fixed set of indicators the history table can be queried for.
pub fn indicator_catalogue() -> &'static [Indicator] {
    CATALOGUE
}

impl Indicator {
    pub fn lookup(name: &str) -> Result<&'static Indicator, KpiError> {
        CATALOGUE
            .iter()
            .find(|i| i.name == name)
            .ok_or_else(|| KpiError::UnknownIndicator(name.to_string()))
    }

    /// Dotted path of the value inside a snapshot's `kpis`.
    pub fn path(&self) -> String {
        match self.source {
            IndicatorSource::Flat => self.name.to_string(),
            IndicatorSource::Statement(statement) => format!("statements.{}.{}", statement, self.name),
        }
    }

    /// Numeric value recorded in `kpis`, `None` when absent or not a number.
    pub fn read(&self, kpis: &Map<String, Value>) -> Option<f64> {
        let value = match self.source {
            IndicatorSource::Flat => kpis.get(self.name),
            IndicatorSource::Statement(statement) => kpis
                .get("statements")
                .and_then(|s| s.get(statement))
                .and_then(|s| s.get(self.name)),
        };
        value.and_then(Value::as_f64)
    }
}

/// Round-indexed view of a team's KPI history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryTable {
    /// Sorted by round, unique.
    columns: Vec<KpiSnapshot>,
}

/// Sort and validate a team's snapshots into a [`HistoryTable`].
pub fn aggregate(snapshots: &[KpiSnapshot]) -> Result<HistoryTable, KpiError> {
    let mut columns = snapshots.to_vec();
    columns.sort_by_key(|s| s.round);

    if let Some(first) = columns.first() {
        if first.round == 0 {
            return Err(KpiError::InvalidRound(0));
        }
    }
    if let Some(pair) = columns.windows(2).find(|pair| pair[0].round == pair[1].round) {
        return Err(KpiError::DuplicateRound(pair[0].round));
    }

    Ok(HistoryTable { columns })
}

impl HistoryTable {
    pub fn rounds(&self) -> Vec<Round> {
        self.columns.iter().map(|s| s.round).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn latest_round(&self) -> Option<Round> {
        self.columns.last().map(|s| s.round)
    }

    pub fn snapshot(&self, round: Round) -> Option<&KpiSnapshot> {
        self.position(round).map(|idx| &self.columns[idx])
    }

    fn position(&self, round: Round) -> Option<usize> {
        self.columns.binary_search_by_key(&round, |s| s.round).ok()
    }

    /// Value of `indicator` in `round`.
    ///
    /// `Ok(None)` when the round has no column or the indicator was not
    /// recorded for it; `Err(UnknownIndicator)` when the name is not in the
    /// catalogue at all.
    pub fn value_at(&self, round: Round, indicator: &str) -> Result<Option<f64>, KpiError> {
        let indicator = Indicator::lookup(indicator)?;
        Ok(self.snapshot(round).and_then(|s| indicator.read(&s.kpis)))
    }

    /// Change of `indicator` since the previous recorded round.
    ///
    /// `None` for the first column, for rounds without a column, and when
    /// either side was not recorded.
    pub fn delta(&self, round: Round, indicator: &str) -> Result<Option<f64>, KpiError> {
        let indicator = Indicator::lookup(indicator)?;
        let delta = match self.position(round) {
            Some(idx) if idx > 0 => {
                let current = indicator.read(&self.columns[idx].kpis);
                let previous = indicator.read(&self.columns[idx - 1].kpis);
                current.zip(previous).map(|(c, p)| c - p)
            }
            _ => None,
        };
        Ok(delta)
    }

    /// One entry per recorded round, in round order.
    pub fn series(&self, indicator: &str) -> Result<Vec<(Round, Option<f64>)>, KpiError> {
        let indicator = Indicator::lookup(indicator)?;
        Ok(self
            .columns
            .iter()
            .map(|s| (s.round, indicator.read(&s.kpis)))
            .collect())
    }

    /// Catalogue indicators recorded for `round`, keyed by name. Indicators
    /// that were not recorded are omitted. `None` if the round has no column.
    pub fn financial_summary(&self, round: Round) -> Option<Map<String, Value>> {
        let snapshot = self.snapshot(round)?;
        let summary = CATALOGUE
            .iter()
            .filter_map(|indicator| {
                indicator
                    .read(&snapshot.kpis)
                    .and_then(serde_json::Number::from_f64)
                    .map(|n| (indicator.name.to_string(), Value::Number(n)))
            })
            .collect();
        Some(summary)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KpiError {
    #[error("Duplicate KPI snapshot for round {0}")]
    DuplicateRound(Round),

    #[error("Unknown indicator '{0}'")]
    UnknownIndicator(String),

    #[error("KPI snapshot round must be a positive integer, got {0}")]
    InvalidRound(Round),
}
