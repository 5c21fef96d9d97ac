//! Templates: ordered column-to-rule mappings
//!
//! A template is built in code with [`Template::builder`] or loaded from a
//! TOML file:
//!
//! ```toml
//! name = "Field samples"
//!
//! [[columns]]
//! name = "status"
//! rule = "set"
//! values = ["open", "closed"]
//!
//! [[columns]]
//! name = "city"
//! rule = "linked_set"
//! parent = "country"
//! empty_ok = true
//!
//! [columns.values]
//! France = ["Paris", "Lyon"]
//! ```
//!
//! Both paths end in the same consistency checks.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::TemplateError;
use crate::rule::{Pattern, Rule, RuleKind};

/// Ordered mapping from column name to rule. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    name: Option<String>,
    columns: Vec<(String, Rule)>,
    index: HashMap<String, usize>,
}

impl Template {
    pub fn builder() -> TemplateBuilder {
        TemplateBuilder::default()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.columns.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn get(&self, column: &str) -> Option<&Rule> {
        self.index.get(column).map(|&i| &self.columns[i].1)
    }

    /// Declaration position of a column (0-based).
    pub fn position(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Parse a template from TOML. Relative `terms_file` paths resolve
    /// against the current directory.
    pub fn from_toml(input: &str) -> Result<Self, TemplateError> {
        Self::parse(input, None)
    }

    /// Load a template file. Relative `terms_file` paths resolve against the
    /// template's directory.
    pub fn from_toml_file(path: &Path) -> Result<Self, TemplateError> {
        let input = std::fs::read_to_string(path).map_err(|e| TemplateError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&input, path.parent())
    }

    fn parse(input: &str, base_dir: Option<&Path>) -> Result<Self, TemplateError> {
        let file: TemplateFile =
            toml::from_str(input).map_err(|e| TemplateError::Parse(e.to_string()))?;

        let mut builder = Template::builder();
        if let Some(name) = file.name {
            builder = builder.name(name);
        }
        for spec in file.columns {
            let rule = spec.rule.into_rule(&spec.name, base_dir)?;
            builder = builder.column(spec.name, rule.with_empty_ok(spec.empty_ok));
        }
        builder.build()
    }

    /// Render the template as TOML. Ontology terms are always written inline.
    pub fn to_toml(&self) -> Result<String, TemplateError> {
        let file = TemplateFile {
            name: self.name.clone(),
            columns: self
                .columns
                .iter()
                .map(|(name, rule)| ColumnSpec {
                    name: name.clone(),
                    empty_ok: rule.empty_ok,
                    rule: RuleSpec::from_rule(rule),
                })
                .collect(),
        };
        toml::to_string(&file).map_err(|e| TemplateError::Serialize(e.to_string()))
    }
}

/// Collects columns, then checks the whole template in [`build`](Self::build).
#[derive(Debug, Default)]
pub struct TemplateBuilder {
    name: Option<String>,
    columns: Vec<(String, Rule)>,
}

impl TemplateBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn column(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.columns.push((name.into(), rule));
        self
    }

    pub fn build(self) -> Result<Template, TemplateError> {
        if self.columns.is_empty() {
            return Err(TemplateError::Empty);
        }

        let mut index = HashMap::with_capacity(self.columns.len());
        for (i, (name, _)) in self.columns.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(TemplateError::DuplicateColumn(name.clone()));
            }
        }

        for (i, (name, rule)) in self.columns.iter().enumerate() {
            check_rule(name, i, rule, &index)?;
        }

        Ok(Template {
            name: self.name,
            columns: self.columns,
            index,
        })
    }
}

fn check_rule(
    column: &str,
    position: usize,
    rule: &Rule,
    index: &HashMap<String, usize>,
) -> Result<(), TemplateError> {
    let bounds_error = |message: String| TemplateError::InvalidBounds {
        column: column.to_string(),
        message,
    };

    match &rule.kind {
        RuleKind::Integer {
            min: Some(min),
            max: Some(max),
        } if min > max => Err(bounds_error(format!("min {min} is greater than max {max}"))),
        RuleKind::Float {
            min: Some(min),
            max: Some(max),
        } if min > max => Err(bounds_error(format!("min {min} is greater than max {max}"))),
        RuleKind::Float { min, max }
            if min.is_some_and(|v| !v.is_finite()) || max.is_some_and(|v| !v.is_finite()) =>
        {
            Err(bounds_error("bounds must be finite numbers".into()))
        }
        RuleKind::Date {
            earliest: Some(earliest),
            latest: Some(latest),
            ..
        } if earliest > latest => Err(bounds_error(format!(
            "earliest date {earliest} is after latest date {latest}"
        ))),
        RuleKind::FixedSet(values) if values.is_empty() => Err(TemplateError::EmptyValues {
            column: column.to_string(),
        }),
        RuleKind::Ontology { terms, .. } if terms.is_empty() => Err(TemplateError::EmptyValues {
            column: column.to_string(),
        }),
        RuleKind::LinkedSet { parent, values } => {
            if values.is_empty() || values.values().all(|v| v.is_empty()) {
                return Err(TemplateError::EmptyValues {
                    column: column.to_string(),
                });
            }
            match index.get(parent) {
                None => Err(TemplateError::UnknownParent {
                    column: column.to_string(),
                    parent: parent.clone(),
                }),
                Some(&p) if p >= position => Err(TemplateError::ParentAfterChild {
                    column: column.to_string(),
                    parent: parent.clone(),
                }),
                Some(_) => Ok(()),
            }
        }
        RuleKind::Unique { unique_with } => {
            match unique_with.iter().find(|other| !index.contains_key(*other)) {
                Some(other) => Err(TemplateError::UnknownUniqueColumn {
                    column: column.to_string(),
                    other: other.clone(),
                }),
                None => Ok(()),
            }
        }
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// TOML file model
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct TemplateFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    columns: Vec<ColumnSpec>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ColumnSpec {
    name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    empty_ok: bool,
    #[serde(flatten)]
    rule: RuleSpec,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn default_day_first() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
enum RuleSpec {
    Any,
    Text,
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
    },
    Float {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// Bounds are `YYYY-MM-DD` strings.
    Date {
        #[serde(default = "default_day_first")]
        day_first: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        earliest: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        latest: Option<String>,
    },
    Email,
    Regex {
        pattern: String,
    },
    Unique {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        unique_with: Vec<String>,
    },
    Set {
        values: Vec<String>,
    },
    LinkedSet {
        parent: String,
        values: BTreeMap<String, Vec<String>>,
    },
    Ontology {
        ontology: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        root_term: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        terms: Vec<String>,
        /// Text file with one term per line.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        terms_file: Option<PathBuf>,
    },
}

impl RuleSpec {
    fn into_rule(self, column: &str, base_dir: Option<&Path>) -> Result<Rule, TemplateError> {
        let rule = match self {
            RuleSpec::Any => Rule::any(),
            RuleSpec::Text => Rule::text(),
            RuleSpec::Integer { min, max } => Rule::integer(min, max),
            RuleSpec::Float { min, max } => Rule::float(min, max),
            RuleSpec::Date {
                day_first,
                earliest,
                latest,
            } => Rule::new(RuleKind::Date {
                day_first,
                earliest: parse_bound(column, earliest)?,
                latest: parse_bound(column, latest)?,
            }),
            RuleSpec::Email => Rule::email(),
            RuleSpec::Regex { pattern } => {
                let pattern =
                    Pattern::new(&pattern).map_err(|e| TemplateError::InvalidPattern {
                        column: column.to_string(),
                        message: e.to_string(),
                    })?;
                Rule::new(RuleKind::Regex(pattern))
            }
            RuleSpec::Unique { unique_with } => Rule::unique(unique_with),
            RuleSpec::Set { values } => Rule::fixed_set(values),
            RuleSpec::LinkedSet { parent, values } => Rule::linked_set(parent, values),
            RuleSpec::Ontology {
                ontology,
                root_term,
                mut terms,
                terms_file,
            } => {
                if let Some(file) = terms_file {
                    terms.extend(read_terms(&resolve(&file, base_dir))?);
                }
                let mut rule = Rule::ontology(ontology, terms);
                if let RuleKind::Ontology { root_term: root, .. } = &mut rule.kind {
                    *root = root_term;
                }
                rule
            }
        };
        Ok(rule)
    }

    fn from_rule(rule: &Rule) -> Self {
        match &rule.kind {
            RuleKind::Any => RuleSpec::Any,
            RuleKind::Text => RuleSpec::Text,
            RuleKind::Integer { min, max } => RuleSpec::Integer {
                min: *min,
                max: *max,
            },
            RuleKind::Float { min, max } => RuleSpec::Float {
                min: *min,
                max: *max,
            },
            RuleKind::Date {
                day_first,
                earliest,
                latest,
            } => RuleSpec::Date {
                day_first: *day_first,
                earliest: earliest.map(|d| d.format("%Y-%m-%d").to_string()),
                latest: latest.map(|d| d.format("%Y-%m-%d").to_string()),
            },
            RuleKind::Email => RuleSpec::Email,
            RuleKind::Regex(pattern) => RuleSpec::Regex {
                pattern: pattern.as_str().to_string(),
            },
            RuleKind::Unique { unique_with } => RuleSpec::Unique {
                unique_with: unique_with.clone(),
            },
            RuleKind::FixedSet(values) => RuleSpec::Set {
                values: values.values().to_vec(),
            },
            RuleKind::LinkedSet { parent, values } => RuleSpec::LinkedSet {
                parent: parent.clone(),
                values: values
                    .iter()
                    .map(|(k, v)| (k.clone(), v.values().to_vec()))
                    .collect(),
            },
            RuleKind::Ontology {
                ontology,
                root_term,
                terms,
            } => RuleSpec::Ontology {
                ontology: ontology.clone(),
                root_term: root_term.clone(),
                terms: terms.values().to_vec(),
                terms_file: None,
            },
        }
    }
}

fn parse_bound(column: &str, value: Option<String>) -> Result<Option<NaiveDate>, TemplateError> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").map_err(|_| {
                TemplateError::InvalidBounds {
                    column: column.to_string(),
                    message: format!("'{v}' is not a YYYY-MM-DD date"),
                }
            })
        })
        .transpose()
}

fn resolve(path: &Path, base_dir: Option<&Path>) -> PathBuf {
    match base_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    }
}

fn read_terms(path: &Path) -> Result<Vec<String>, TemplateError> {
    let content = std::fs::read_to_string(path).map_err(|e| TemplateError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect())
}
