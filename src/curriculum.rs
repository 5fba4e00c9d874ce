//! Curriculum store: the immutable catalog of subjects
//!
//! A curriculum is authored as a document mapping semester numbers to the
//! subjects offered in them:
//!
//! ```yaml
//! name: "Toy plan"
//! semesters:
//!   1:
//!     subjects:
//!       - name: A
//!   2:
//!     subjects:
//!       - name: B
//!         prerequisites: [A]
//!   3:
//!     subjects:
//!       - name: C
//!         prerequisites: [B]
//! ```
//!
//! Loading applies the configured patches, tags every subject with its
//! [`Category`], splits descriptors into named prerequisites and the
//! "all previous semesters" meta-token, and builds a reverse-dependency
//! index. After that the [`Curriculum`] is read-only.

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::normalize::{names_equal, normalize, NameMatcher};
use crate::validate::{self, Issue, Severity};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// Authoring format
// ---------------------------------------------------------------------------

/// A curriculum as written by its author
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "prereq curriculum", description = "Subjects grouped by semester")]
pub struct CurriculumDocument {
    /// Human-readable plan name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Engine rules shipped with the plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<EngineConfig>,

    /// Semester number -> subjects offered that semester
    #[serde(default)]
    pub semesters: BTreeMap<u32, SemesterRecord>,
}

/// One semester of the authored plan
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SemesterRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default)]
    pub subjects: Vec<SubjectRecord>,
}

/// One subject of the authored plan
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SubjectRecord {
    pub name: String,

    /// Redundant with the enclosing semester; checked when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester: Option<u32>,

    /// Subject names, or a meta-token such as
    /// "haber completado todos los semestres anteriores"
    #[serde(default)]
    pub prerequisites: Vec<String>,

    /// Overrides name-pattern tagging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl SubjectRecord {
    pub fn new(name: &str, prerequisites: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            semester: None,
            prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
            category: None,
        }
    }
}

impl CurriculumDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a subject to `semester`
    pub fn subject(self, semester: u32, name: &str, prerequisites: &[&str]) -> Self {
        self.record(semester, SubjectRecord::new(name, prerequisites))
    }

    /// Append a fully specified record to `semester`
    pub fn record(mut self, semester: u32, record: SubjectRecord) -> Self {
        self.semesters
            .entry(semester)
            .or_default()
            .subjects
            .push(record);
        self
    }

    /// Parse a document from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_norway::from_str(yaml).map_err(|e| Error::CurriculumParse(e.to_string()))
    }

    /// Serialize the document to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_norway::to_string(self)?)
    }

    /// Parse a document from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::CurriculumParse(e.to_string()))
    }

    /// Serialize the document to JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::CurriculumParse(e.to_string()))
    }

    /// Read a document, choosing the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(Error::Io)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        };
        parsed.map_err(|e| Error::CurriculumParse(format!("{}: {}", path.display(), e)))
    }

    /// Add the patch descriptors to every record they name.
    ///
    /// Returns the subjects of patches that matched no record.
    fn apply_patches(&mut self, config: &EngineConfig) -> Vec<String> {
        let mut unmatched = Vec::new();
        for patch in &config.patches {
            let mut hit = false;
            for record in self
                .semesters
                .values_mut()
                .flat_map(|s| s.subjects.iter_mut())
                .filter(|r| names_equal(&r.name, &patch.subject))
            {
                hit = true;
                for descriptor in &patch.add_prerequisites {
                    if !record.prerequisites.iter().any(|p| names_equal(p, descriptor)) {
                        record.prerequisites.push(descriptor.clone());
                    }
                }
            }
            if !hit {
                unmatched.push(patch.subject.clone());
            }
        }
        unmatched
    }
}

// ---------------------------------------------------------------------------
// Loaded catalog
// ---------------------------------------------------------------------------

/// Index of a subject inside its [`Curriculum`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectId(usize);

impl SubjectId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Subject category, assigned once at load time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Regular,
    /// Locked until the whole cohort (semesters 1..=N) is completed
    CohortGated,
}

/// A parsed prerequisite descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prerequisite {
    /// Another subject, referenced by name
    Named(String),
    /// Every subject of every earlier semester must be completed
    AllPreviousSemesters(String),
}

impl Prerequisite {
    /// The descriptor text as authored
    pub fn descriptor(&self) -> &str {
        match self {
            Prerequisite::Named(s) | Prerequisite::AllPreviousSemesters(s) => s,
        }
    }

    pub fn is_meta(&self) -> bool {
        matches!(self, Prerequisite::AllPreviousSemesters(_))
    }
}

/// One curriculum course
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub semester: u32,
    pub prerequisites: Vec<Prerequisite>,
    pub category: Category,
}

impl Subject {
    /// Non-meta prerequisite descriptors
    pub fn named_prerequisites(&self) -> impl Iterator<Item = &str> {
        self.prerequisites.iter().filter_map(|p| match p {
            Prerequisite::Named(name) => Some(name.as_str()),
            Prerequisite::AllPreviousSemesters(_) => None,
        })
    }

    pub fn requires_all_previous(&self) -> bool {
        self.prerequisites.iter().any(Prerequisite::is_meta)
    }

    pub fn is_cohort_gated(&self) -> bool {
        self.category == Category::CohortGated
    }

    /// Descriptors as authored, meta-token included
    pub fn descriptors(&self) -> Vec<&str> {
        self.prerequisites.iter().map(Prerequisite::descriptor).collect()
    }
}

/// The immutable catalog consulted by the engine
#[derive(Debug, Clone)]
pub struct Curriculum {
    name: Option<String>,
    subjects: Vec<Subject>,
    semesters: BTreeMap<u32, Vec<SubjectId>>,
    labels: BTreeMap<u32, String>,
    dependents: Vec<Vec<SubjectId>>,
    matcher: NameMatcher,
    cohort_through: u32,
    fingerprint: String,
    warnings: Vec<Issue>,
}

impl Curriculum {
    /// Load `document` under `config`, rejecting data-authoring errors
    pub fn new(document: CurriculumDocument, config: &EngineConfig) -> Result<Self> {
        let (curriculum, issues) = Self::assemble(document, config)?;
        let errors: Vec<Issue> = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .cloned()
            .collect();
        if !errors.is_empty() {
            return Err(Error::InvalidCurriculum(errors));
        }

        for warning in &issues {
            tracing::warn!(code = %warning.code, "{}", warning.message);
        }
        tracing::info!(
            subjects = curriculum.subjects.len(),
            semesters = curriculum.semesters.len(),
            fingerprint = %curriculum.fingerprint,
            "curriculum loaded"
        );

        Ok(Self {
            warnings: issues,
            ..curriculum
        })
    }

    /// Load `document` with its embedded rules, or the defaults
    pub fn load(document: CurriculumDocument) -> Result<Self> {
        let config = document.rules.clone().unwrap_or_default();
        Self::new(document, &config)
    }

    /// Parse and load a YAML curriculum with its embedded rules
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::load(CurriculumDocument::from_yaml(yaml)?)
    }

    /// Parse and load a JSON curriculum with its embedded rules
    pub fn from_json(json: &str) -> Result<Self> {
        Self::load(CurriculumDocument::from_json(json)?)
    }

    /// Build the catalog and collect every issue without rejecting any.
    pub(crate) fn assemble(
        mut document: CurriculumDocument,
        config: &EngineConfig,
    ) -> Result<(Self, Vec<Issue>)> {
        let classifier = config.classifier()?;
        let mut issues: Vec<Issue> = document
            .apply_patches(config)
            .into_iter()
            .map(|subject| {
                Issue::error(
                    "E004",
                    &format!("Patch targets unknown subject \"{}\"", subject),
                    Some(&subject),
                )
            })
            .collect();

        let fingerprint = fingerprint_of(&document)?;

        let mut subjects = Vec::new();
        let mut semesters: BTreeMap<u32, Vec<SubjectId>> = BTreeMap::new();
        let mut labels = BTreeMap::new();
        for (&number, semester) in &document.semesters {
            if let Some(label) = &semester.label {
                labels.insert(number, label.clone());
            }
            let ids = semesters.entry(number).or_default();
            for record in &semester.subjects {
                if let Some(declared) = record.semester.filter(|s| *s != number) {
                    issues.push(Issue::error(
                        "E002",
                        &format!(
                            "\"{}\" declares semester {} but is listed under semester {}",
                            record.name, declared, number
                        ),
                        Some(&record.name),
                    ));
                }

                let id = SubjectId(subjects.len());
                let category = record.category.unwrap_or_else(|| {
                    if classifier.is_cohort_gated(&record.name) {
                        Category::CohortGated
                    } else {
                        Category::Regular
                    }
                });
                let prerequisites = record
                    .prerequisites
                    .iter()
                    .map(|d| {
                        if classifier.is_meta_token(d) {
                            Prerequisite::AllPreviousSemesters(d.clone())
                        } else {
                            Prerequisite::Named(d.clone())
                        }
                    })
                    .collect();

                subjects.push(Subject {
                    id,
                    name: record.name.clone(),
                    semester: number,
                    prerequisites,
                    category,
                });
                ids.push(id);
            }
        }

        let matcher = NameMatcher::new(config.matching);
        let dependents = build_dependents(&subjects, &matcher);
        let cohort_through = config.cohort_gate.through_semester;
        issues.extend(validate::check_subjects(&subjects, &matcher, cohort_through));

        let curriculum = Self {
            name: document.name.clone(),
            subjects,
            semesters,
            labels,
            dependents,
            matcher,
            cohort_through,
            fingerprint,
            warnings: Vec::new(),
        };
        Ok((curriculum, issues))
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// All subject entries, in semester order
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// `None` for an id minted by another curriculum
    pub fn subject(&self, id: SubjectId) -> Option<&Subject> {
        self.subjects.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// Semester numbers in ascending order
    pub fn semesters(&self) -> impl Iterator<Item = u32> + '_ {
        self.semesters.keys().copied()
    }

    /// Subjects offered in semester `number`, in authored order
    pub fn semester(&self, number: u32) -> Option<impl Iterator<Item = &Subject> + '_> {
        self.semesters
            .get(&number)
            .map(|ids| ids.iter().filter_map(|id| self.subject(*id)))
    }

    pub fn semester_label(&self, number: u32) -> Option<&str> {
        self.labels.get(&number).map(String::as_str)
    }

    /// First entry carrying `name`, in semester order
    pub fn find(&self, name: &str) -> Option<&Subject> {
        let key = normalize(name);
        self.subjects.iter().find(|s| normalize(&s.name) == key)
    }

    /// Every entry carrying `name`; some plans list a course in two semesters
    pub fn entries<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Subject> + 'a {
        let key = normalize(name);
        self.subjects
            .iter()
            .filter(move |s| normalize(&s.name) == key)
    }

    /// Subjects with a named prerequisite resolving to `id`
    pub fn dependents(&self, id: SubjectId) -> impl Iterator<Item = &Subject> + '_ {
        self.dependents
            .get(id.0)
            .into_iter()
            .flatten()
            .filter_map(|d| self.subject(*d))
    }

    /// Subjects with a named prerequisite resolving to any entry named `name`
    pub fn dependents_of(&self, name: &str) -> Vec<&Subject> {
        let mut found: Vec<&Subject> = self
            .entries(name)
            .flat_map(|s| self.dependents(s.id))
            .collect();
        found.sort_by_key(|s| s.id);
        found.dedup_by_key(|s| s.id);
        found
    }

    /// Subjects with `semester <= through`
    pub fn subjects_through(&self, through: u32) -> impl Iterator<Item = &Subject> + '_ {
        self.subjects.iter().filter(move |s| s.semester <= through)
    }

    /// Subjects with `semester < before`
    pub fn subjects_before(&self, before: u32) -> impl Iterator<Item = &Subject> + '_ {
        self.subjects.iter().filter(move |s| s.semester < before)
    }

    /// Last semester of the cohort gating [`Category::CohortGated`] subjects
    pub fn cohort_through(&self) -> u32 {
        self.cohort_through
    }

    pub fn matcher(&self) -> &NameMatcher {
        &self.matcher
    }

    /// Hash of the patched document, for tying reports to a catalog version
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Warning-severity issues found while loading
    pub fn warnings(&self) -> &[Issue] {
        &self.warnings
    }
}

fn build_dependents(subjects: &[Subject], matcher: &NameMatcher) -> Vec<Vec<SubjectId>> {
    let mut dependents = vec![Vec::new(); subjects.len()];
    for subject in subjects {
        for descriptor in subject.named_prerequisites() {
            for target in subjects.iter().filter(|t| matcher.matches(descriptor, &t.name)) {
                let list: &mut Vec<SubjectId> = &mut dependents[target.id.0];
                if !list.contains(&subject.id) {
                    list.push(subject.id);
                }
            }
        }
    }
    dependents
}

fn fingerprint_of(document: &CurriculumDocument) -> Result<String> {
    use sha2::{Digest, Sha256};
    let content = serde_json::to_vec(&document.semesters)?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(format!("sha256:{}", hex::encode(&hasher.finalize()[..8])))
}
