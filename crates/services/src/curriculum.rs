use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use hub_core::model::{CurriculumDocument, DisciplineId};
use tracing::debug;

use crate::error::CurriculumError;

/// Read-only source of curriculum documents, one per discipline.
#[async_trait]
pub trait CurriculumSource: Send + Sync {
    /// Fetch the curriculum for `discipline`.
    ///
    /// # Errors
    ///
    /// Returns `CurriculumError::NotFound` if the discipline is unknown, or a
    /// load/parse error from the backing source.
    async fn curriculum(
        &self,
        discipline: &DisciplineId,
    ) -> Result<CurriculumDocument, CurriculumError>;
}

/// Map-backed source for tests and embedding.
#[derive(Clone, Default)]
pub struct InMemoryCurriculum {
    documents: Arc<HashMap<DisciplineId, CurriculumDocument>>,
}

impl InMemoryCurriculum {
    #[must_use]
    pub fn new(documents: impl IntoIterator<Item = CurriculumDocument>) -> Self {
        let documents = documents
            .into_iter()
            .map(|doc| (doc.discipline.clone(), doc))
            .collect();
        Self {
            documents: Arc::new(documents),
        }
    }
}

#[async_trait]
impl CurriculumSource for InMemoryCurriculum {
    async fn curriculum(
        &self,
        discipline: &DisciplineId,
    ) -> Result<CurriculumDocument, CurriculumError> {
        self.documents
            .get(discipline)
            .cloned()
            .ok_or_else(|| CurriculumError::NotFound(discipline.clone()))
    }
}

/// Loads `<dir>/<discipline>.json` on every request.
#[derive(Debug, Clone)]
pub struct JsonCurriculumDir {
    dir: PathBuf,
}

impl JsonCurriculumDir {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, discipline: &DisciplineId) -> Option<PathBuf> {
        let name = discipline.as_str();
        let plain = name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        plain.then(|| self.dir.join(format!("{name}.json")))
    }
}

#[async_trait]
impl CurriculumSource for JsonCurriculumDir {
    async fn curriculum(
        &self,
        discipline: &DisciplineId,
    ) -> Result<CurriculumDocument, CurriculumError> {
        let path = self
            .path_for(discipline)
            .ok_or_else(|| CurriculumError::NotFound(discipline.clone()))?;

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(CurriculumError::NotFound(discipline.clone()));
            }
            Err(source) => return Err(CurriculumError::Io { path, source }),
        };

        let doc: CurriculumDocument = serde_json::from_str(&raw)
            .map_err(|source| CurriculumError::Parse {
                path: path.clone(),
                source,
            })?;
        if &doc.discipline != discipline {
            return Err(CurriculumError::Mismatch {
                expected: discipline.clone(),
                found: doc.discipline,
            });
        }
        debug!(path = %path.display(), stages = doc.stages.len(), "loaded curriculum");
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str) -> CurriculumDocument {
        CurriculumDocument {
            discipline: DisciplineId::new(name).unwrap(),
            stages: Vec::new(),
        }
    }

    #[tokio::test]
    async fn in_memory_source_finds_by_discipline() {
        let source = InMemoryCurriculum::new([doc("frontend"), doc("backend")]);
        let found = source
            .curriculum(&DisciplineId::new("backend").unwrap())
            .await
            .unwrap();
        assert_eq!(found.discipline.as_str(), "backend");

        let missing = source
            .curriculum(&DisciplineId::new("design").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(missing, CurriculumError::NotFound(_)));
    }

    #[tokio::test]
    async fn json_dir_rejects_path_like_ids() {
        let source = JsonCurriculumDir::new(std::env::temp_dir());
        let err = source
            .curriculum(&DisciplineId::new("../etc/passwd").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, CurriculumError::NotFound(_)));
    }

    #[tokio::test]
    async fn json_dir_loads_and_checks_discipline() {
        let dir = std::env::temp_dir().join(format!("hub-curricula-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("frontend.json"),
            r#"{"discipline":"frontend","stages":[{"id":"1","regions":{"Global":{"checklist":["html"]}}}]}"#,
        )
        .unwrap();
        std::fs::write(dir.join("backend.json"), r#"{"discipline":"frontend","stages":[]}"#)
            .unwrap();

        let source = JsonCurriculumDir::new(&dir);
        let loaded = source
            .curriculum(&DisciplineId::new("frontend").unwrap())
            .await
            .unwrap();
        assert_eq!(loaded.stages.len(), 1);

        let err = source
            .curriculum(&DisciplineId::new("backend").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, CurriculumError::Mismatch { .. }));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
