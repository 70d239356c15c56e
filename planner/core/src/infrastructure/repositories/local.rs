// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Local Filesystem Plan Repository
//!
//! Stores every plan version as its own JSON file, for single-user setups and
//! tests that want persistence without a database.
//!
//! ```text
//! <root>/plans/<team>/round-<n>/v<version>.json
//! <root>/history/<team>.json
//! ```
//!
//! A version is written to a hidden staging file in the lineage directory and
//! then hard-linked to `v<version>.json`. Readers therefore never see a
//! partial version file, and because the link fails when the target exists,
//! two writers racing for the same version cannot both succeed. Staging files
//! left behind by an interrupted write are ignored.
//!
//! The history file holds a JSON array of KPI snapshots and is written by
//! whatever collects round results.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::PlanRecord;
use crate::domain::kpi::KpiSnapshot;
use crate::domain::plan::{PersistedPlanDocument, PlanDocument, PlanId, Round, TeamId};
use crate::domain::repository::{PlanRepository, RepositoryError};

pub struct LocalPlanRepository {
    root: PathBuf,
}

impl LocalPlanRepository {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let root = root.into();
        for dir in ["plans", "history"] {
            std::fs::create_dir_all(root.join(dir)).map_err(|e| {
                RepositoryError::Unavailable(format!("Failed to create {}: {}", root.join(dir).display(), e))
            })?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn team_segment(team_id: &TeamId) -> Result<&str, RepositoryError> {
        let id = team_id.as_str();
        if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
            return Err(RepositoryError::ValidationRejected(format!("invalid team id '{}'", id)));
        }
        Ok(id)
    }

    fn lineage_dir(&self, team_id: &TeamId, round: Round) -> Result<PathBuf, RepositoryError> {
        Ok(self
            .root
            .join("plans")
            .join(Self::team_segment(team_id)?)
            .join(format!("round-{}", round)))
    }

    fn history_path(&self, team_id: &TeamId) -> Result<PathBuf, RepositoryError> {
        Ok(self
            .root
            .join("history")
            .join(format!("{}.json", Self::team_segment(team_id)?)))
    }

    /// Version numbers present in a lineage directory, ascending.
    async fn versions(dir: &Path) -> Result<Vec<u32>, RepositoryError> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut versions = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let parsed = name
                .to_str()
                .and_then(|n| n.strip_prefix('v'))
                .and_then(|n| n.strip_suffix(".json"))
                .and_then(|n| n.parse::<u32>().ok());
            if let Some(version) = parsed {
                versions.push(version);
            }
        }
        versions.sort_unstable();
        Ok(versions)
    }

    async fn read_version(dir: &Path, version: u32) -> Result<PlanDocument, RepositoryError> {
        let path = dir.join(format!("v{}.json", version));
        let bytes = tokio::fs::read(&path).await?;
        let record: PlanRecord =
            serde_json::from_slice(&bytes).map_err(|e| RepositoryError::corrupt(path.display(), e))?;
        record.into_document()
    }

    /// Write `bytes` to `staging`, then link it to `target`. Fails with
    /// `AlreadyExists` when `target` is already there.
    async fn publish(staging: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(staging)
            .await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::hard_link(staging, target).await
    }

    /// Append a KPI snapshot to the team's history file.
    pub async fn record_history(&self, team_id: &TeamId, snapshot: KpiSnapshot) -> Result<(), RepositoryError> {
        let mut history = self.load_team_history(team_id).await?;
        history.push(snapshot);
        let path = self.history_path(team_id)?;
        tokio::fs::write(&path, serde_json::to_vec_pretty(&history)?).await?;
        Ok(())
    }
}

#[async_trait]
impl PlanRepository for LocalPlanRepository {
    async fn load_active_plan(&self, team_id: &TeamId, round: Round) -> Result<Option<PlanDocument>, RepositoryError> {
        let dir = self.lineage_dir(team_id, round)?;
        match Self::versions(&dir).await?.last() {
            Some(&latest) => Ok(Some(Self::read_version(&dir, latest).await?)),
            None => Ok(None),
        }
    }

    async fn save_plan(&self, document: &PlanDocument) -> Result<PersistedPlanDocument, RepositoryError> {
        let dir = self.lineage_dir(&document.team_id, document.round)?;
        let latest = match Self::versions(&dir).await?.last() {
            Some(&version) => Some((version, Self::read_version(&dir, version).await?.status)),
            None => None,
        };
        RepositoryError::check_next_version(latest, document.version, document.status)?;

        let id = PlanId::new();
        let record = PlanRecord::from_document(document, id)?;
        let bytes = serde_json::to_vec_pretty(&record)?;

        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(format!("v{}.json", document.version));
        let staging = dir.join(format!(".v{}-{}.tmp", document.version, id));

        let published = Self::publish(&staging, &path, &bytes).await;
        if let Err(e) = tokio::fs::remove_file(&staging).await {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = %staging.display(), "Failed to remove staging file: {}", e);
            }
        }
        published.map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => {
                RepositoryError::ValidationRejected(format!("version {} already exists", document.version))
            }
            _ => RepositoryError::from(e),
        })?;

        debug!(path = %path.display(), "Wrote plan version");

        let mut stored = document.clone();
        stored.id = Some(id);
        PersistedPlanDocument::new(stored)
    }

    async fn load_lineage(&self, team_id: &TeamId, round: Round) -> Result<Vec<PlanDocument>, RepositoryError> {
        let dir = self.lineage_dir(team_id, round)?;
        let mut lineage = Vec::new();
        for version in Self::versions(&dir).await? {
            lineage.push(Self::read_version(&dir, version).await?);
        }
        Ok(lineage)
    }

    async fn load_team_history(&self, team_id: &TeamId) -> Result<Vec<KpiSnapshot>, RepositoryError> {
        let path = self.history_path(team_id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| RepositoryError::corrupt(path.display(), e)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::{ChampionshipId, PlanStatus};
    use serde_json::json;
    use tempfile::TempDir;

    fn document(version: u32, status: PlanStatus) -> PlanDocument {
        let mut doc = PlanDocument::new(ChampionshipId::new("cup"), TeamId::new("team-a"), 2);
        doc.version = version;
        doc.status = status;
        doc
    }

    #[tokio::test]
    async fn test_save_and_reload_versions() {
        let temp = TempDir::new().unwrap();
        let repo = LocalPlanRepository::new(temp.path()).unwrap();
        let team = TeamId::new("team-a");

        let mut first = document(1, PlanStatus::Draft);
        first.set_canvas_block("channels", "retail").unwrap();
        repo.save_plan(&first).await.unwrap();
        repo.save_plan(&document(2, PlanStatus::Submitted)).await.unwrap();

        assert!(temp.path().join("plans/team-a/round-2/v1.json").exists());
        assert!(temp.path().join("plans/team-a/round-2/v2.json").exists());

        let active = repo.load_active_plan(&team, 2).await.unwrap().unwrap();
        assert_eq!(active.version, 2);
        assert_eq!(active.status, PlanStatus::Submitted);

        let lineage = repo.load_lineage(&team, 2).await.unwrap();
        assert_eq!(lineage.len(), 2);
        assert_eq!(lineage[0].data.canvas.channels, "retail");
    }

    #[tokio::test]
    async fn test_missing_lineage_is_empty() {
        let temp = TempDir::new().unwrap();
        let repo = LocalPlanRepository::new(temp.path()).unwrap();
        let team = TeamId::new("nobody");

        assert!(repo.load_active_plan(&team, 1).await.unwrap().is_none());
        assert!(repo.load_lineage(&team, 1).await.unwrap().is_empty());
        assert!(repo.load_team_history(&team).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_version_rejected() {
        let temp = TempDir::new().unwrap();
        let repo = LocalPlanRepository::new(temp.path()).unwrap();

        repo.save_plan(&document(1, PlanStatus::Draft)).await.unwrap();
        let result = repo.save_plan(&document(1, PlanStatus::Draft)).await;
        assert!(matches!(result, Err(RepositoryError::ValidationRejected(_))));
    }

    #[tokio::test]
    async fn test_save_leaves_only_version_files() {
        let temp = TempDir::new().unwrap();
        let repo = LocalPlanRepository::new(temp.path()).unwrap();

        repo.save_plan(&document(1, PlanStatus::Draft)).await.unwrap();
        repo.save_plan(&document(2, PlanStatus::Draft)).await.unwrap();

        let mut names: Vec<String> = std::fs::read_dir(temp.path().join("plans/team-a/round-2"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["v1.json", "v2.json"]);
    }

    #[tokio::test]
    async fn test_interrupted_write_is_ignored() {
        let temp = TempDir::new().unwrap();
        let repo = LocalPlanRepository::new(temp.path()).unwrap();
        let team = TeamId::new("team-a");

        repo.save_plan(&document(1, PlanStatus::Draft)).await.unwrap();
        let dir = temp.path().join("plans/team-a/round-2");
        std::fs::write(dir.join(".v2-550e8400-e29b-41d4-a716-446655440000.tmp"), b"{\"id\": ").unwrap();

        let active = repo.load_active_plan(&team, 2).await.unwrap().unwrap();
        assert_eq!(active.version, 1);
        assert_eq!(repo.load_lineage(&team, 2).await.unwrap().len(), 1);

        repo.save_plan(&document(2, PlanStatus::Draft)).await.unwrap();
        assert_eq!(repo.load_active_plan(&team, 2).await.unwrap().unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_draft_over_submitted_lineage_rejected() {
        let temp = TempDir::new().unwrap();
        let repo = LocalPlanRepository::new(temp.path()).unwrap();

        repo.save_plan(&document(1, PlanStatus::Draft)).await.unwrap();
        repo.save_plan(&document(2, PlanStatus::Submitted)).await.unwrap();

        let result = repo.save_plan(&document(2, PlanStatus::Draft)).await;
        assert!(matches!(
            result,
            Err(RepositoryError::InvalidTransition {
                latest: Some(PlanStatus::Submitted),
                requested: PlanStatus::Draft,
            })
        ));
        assert!(!temp.path().join("plans/team-a/round-2/v3.json").exists());
    }

    #[tokio::test]
    async fn test_corrupt_version_file_is_unavailable() {
        let temp = TempDir::new().unwrap();
        let repo = LocalPlanRepository::new(temp.path()).unwrap();
        let dir = temp.path().join("plans/team-a/round-1");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("v1.json"), b"not json").unwrap();

        let team = TeamId::new("team-a");
        assert!(matches!(
            repo.load_active_plan(&team, 1).await,
            Err(RepositoryError::Unavailable(_))
        ));
        assert!(matches!(
            repo.load_lineage(&team, 1).await,
            Err(RepositoryError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_team_id_cannot_escape_root() {
        let temp = TempDir::new().unwrap();
        let repo = LocalPlanRepository::new(temp.path()).unwrap();

        let result = repo.load_team_history(&TeamId::new("../etc")).await;
        assert!(matches!(result, Err(RepositoryError::ValidationRejected(_))));
    }

    #[tokio::test]
    async fn test_stored_file_merged_with_defaults() {
        let temp = TempDir::new().unwrap();
        let repo = LocalPlanRepository::new(temp.path()).unwrap();
        let dir = temp.path().join("plans/team-a/round-1");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("v1.json"),
            json!({
                "id": "550e8400-e29b-41d4-a716-446655440000",
                "championshipId": "cup",
                "teamId": "team-a",
                "round": 1,
                "version": 1,
                "status": "draft",
                "data": { "steps": { "2": { "text": "pricing" } } }
            })
            .to_string(),
        )
        .unwrap();

        let doc = repo.load_active_plan(&TeamId::new("team-a"), 1).await.unwrap().unwrap();
        assert_eq!(doc.step_text(2), Some("pricing"));
        assert_eq!(doc.data.empathy.pains, "");
    }

    #[tokio::test]
    async fn test_record_history() {
        let temp = TempDir::new().unwrap();
        let repo = LocalPlanRepository::new(temp.path()).unwrap();
        let team = TeamId::new("team-a");

        repo.record_history(&team, KpiSnapshot::new(1, json!({ "roi": 0.1 })))
            .await
            .unwrap();
        repo.record_history(&team, KpiSnapshot::new(2, json!({ "roi": 0.2 })))
            .await
            .unwrap();

        let history = repo.load_team_history(&team).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].round, 2);
    }
}
