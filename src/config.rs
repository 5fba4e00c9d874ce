//! Engine configuration
//!
//! Holds the constants that decide how a curriculum is interpreted: the
//! name-matching policy, the cohort gate, the meta-prerequisite marker and
//! the one-shot data patches applied while loading.
//!
//! ```yaml
//! matching: exact
//! cohort_gate:
//!   through_semester: 3
//!   patterns: ["electivo profesional", "emprendimiento"]
//! meta_prerequisite:
//!   patterns: ["semestres anteriores"]
//! patches:
//!   - subject: "Formación General Valórica II"
//!     add_prerequisites: ["Formación General Valórica I"]
//! ```

use crate::error::{Error, Result};
use crate::normalize::{fold_diacritics, normalize, normalize_strong, MatchPolicy};
use regex::{Regex, RegexBuilder};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "prereq engine config")]
pub struct EngineConfig {
    /// Policy used to match prerequisite descriptors against subject names
    #[serde(default)]
    pub matching: MatchPolicy,

    /// Whole-cohort gate for categories such as professional electives
    #[serde(default)]
    pub cohort_gate: CohortGateConfig,

    /// Descriptor markers meaning "all previous semesters completed"
    #[serde(default)]
    pub meta_prerequisite: MetaPrerequisiteConfig,

    /// Data corrections applied once while loading
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patches: Vec<Patch>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            matching: MatchPolicy::Exact,
            cohort_gate: CohortGateConfig::default(),
            meta_prerequisite: MetaPrerequisiteConfig::default(),
            patches: Vec::new(),
        }
    }
}

/// Gate requiring every subject up to a semester before gated subjects unlock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CohortGateConfig {
    /// Last semester of the cohort that must be fully completed
    #[serde(default = "default_through_semester")]
    pub through_semester: u32,

    /// Regex patterns matched against the normalized subject name
    #[serde(default = "default_gate_patterns")]
    pub patterns: Vec<String>,
}

fn default_through_semester() -> u32 {
    3
}

fn default_gate_patterns() -> Vec<String> {
    vec![
        "electivo profesional".to_string(),
        "emprendimiento".to_string(),
        "professional elective".to_string(),
        "entrepreneurship".to_string(),
    ]
}

impl Default for CohortGateConfig {
    fn default() -> Self {
        Self {
            through_semester: default_through_semester(),
            patterns: default_gate_patterns(),
        }
    }
}

/// Markers for the "all previous semesters" meta-prerequisite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MetaPrerequisiteConfig {
    /// Regex patterns matched against the strongly normalized descriptor
    #[serde(default = "default_meta_patterns")]
    pub patterns: Vec<String>,
}

fn default_meta_patterns() -> Vec<String> {
    vec![
        "semestres anteriores".to_string(),
        "all previous semesters".to_string(),
    ]
}

impl Default for MetaPrerequisiteConfig {
    fn default() -> Self {
        Self {
            patterns: default_meta_patterns(),
        }
    }
}

/// Adds missing prerequisite edges to one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Patch {
    /// Subject name the patch applies to
    pub subject: String,

    /// Descriptors appended to the subject's prerequisites if absent
    #[serde(default)]
    pub add_prerequisites: Vec<String>,
}

impl EngineConfig {
    /// Parse config from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_norway::from_str(yaml).map_err(|e| Error::Config(e.to_string()))
    }

    /// Serialize config to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_norway::to_string(self)?)
    }

    /// Load config from a YAML file
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(Error::Io)?;
        Self::from_yaml(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Compile the pattern lists into [`Classifier`]
    pub fn classifier(&self) -> Result<Classifier> {
        Ok(Classifier {
            gate_patterns: compile_patterns(&self.cohort_gate.patterns)?,
            meta_patterns: compile_patterns(&self.meta_prerequisite.patterns)?,
        })
    }
}

/// Names are matched in folded form, so patterns are folded and compiled
/// case-insensitively: "Formación" matches like "formacion".
fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            RegexBuilder::new(&fold_diacritics(p))
                .case_insensitive(true)
                .build()
                .map_err(|e| Error::InvalidPattern {
                    pattern: p.clone(),
                    message: e.to_string(),
                })
        })
        .collect()
}

/// Compiled category and meta-token detectors
///
/// Used once at load time; evaluation never looks at name patterns again.
#[derive(Debug, Clone)]
pub struct Classifier {
    gate_patterns: Vec<Regex>,
    meta_patterns: Vec<Regex>,
}

impl Classifier {
    /// Does this subject name belong to the cohort-gated category?
    pub fn is_cohort_gated(&self, name: &str) -> bool {
        let key = normalize(name);
        self.gate_patterns.iter().any(|re| re.is_match(&key))
    }

    /// Is this descriptor the "all previous semesters" meta-token?
    pub fn is_meta_token(&self, descriptor: &str) -> bool {
        let key = normalize_strong(descriptor);
        self.meta_patterns.iter().any(|re| re.is_match(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.matching, MatchPolicy::Exact);
        assert_eq!(config.cohort_gate.through_semester, 3);
        assert!(config.patches.is_empty());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = EngineConfig::from_yaml("matching: tolerant\n").unwrap();
        assert_eq!(config.matching, MatchPolicy::Tolerant);
        assert_eq!(config.cohort_gate, CohortGateConfig::default());
        assert_eq!(config.meta_prerequisite, MetaPrerequisiteConfig::default());
    }

    #[test]
    fn test_load_from_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.yaml");
        std::fs::write(
            &path,
            r#"
cohort_gate:
  through_semester: 2
  patterns: ["capstone"]
patches:
  - subject: "Física II"
    add_prerequisites: ["Cálculo I"]
"#,
        )
        .unwrap();

        let config = EngineConfig::from_path(&path).unwrap();
        assert_eq!(config.cohort_gate.through_semester, 2);
        assert_eq!(config.cohort_gate.patterns, vec!["capstone".to_string()]);
        assert_eq!(config.patches.len(), 1);
        assert_eq!(config.patches[0].add_prerequisites, vec!["Cálculo I"]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = EngineConfig::from_path(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_yaml_roundtrip_keeps_patches() {
        let config = EngineConfig {
            patches: vec![Patch {
                subject: "B".into(),
                add_prerequisites: vec!["A".into()],
            }],
            ..EngineConfig::default()
        };
        let yaml = config.to_yaml().unwrap();
        assert_eq!(EngineConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_classifier_uses_normalized_names() {
        let classifier = EngineConfig::default().classifier().unwrap();
        assert!(classifier.is_cohort_gated("Electivo Profesional III"));
        assert!(classifier.is_cohort_gated("EMPRENDIMIENTO"));
        assert!(!classifier.is_cohort_gated("Ingeniería Económica"));
        assert!(classifier.is_meta_token("Haber completado todos los semestres anteriores."));
        assert!(!classifier.is_meta_token("Cálculo I"));
    }

    #[test]
    fn test_patterns_are_accent_and_case_insensitive() {
        let mut config = EngineConfig::default();
        config.cohort_gate.patterns = vec!["Emprendimiento".into(), "Formación Dual".into()];
        config.meta_prerequisite.patterns = vec!["Semestres Anteriores".into()];
        let classifier = config.classifier().unwrap();
        assert!(classifier.is_cohort_gated("Emprendimiento"));
        assert!(classifier.is_cohort_gated("formacion dual II"));
        assert!(!classifier.is_cohort_gated("Formación General"));
        assert!(classifier.is_meta_token("todos los semestres anteriores"));
    }

    #[test]
    fn test_invalid_pattern() {
        let mut config = EngineConfig::default();
        config.cohort_gate.patterns = vec!["(unclosed".into()];
        let err = config.classifier().unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }
}
