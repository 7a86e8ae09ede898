//! Merge job configuration.
//!
//! A merge job reads several text sources in order and folds them into one
//! tree. Example YAML:
//!
//! ```yaml
//! sources:
//!   - name: base
//!     path: data/country.txt.gz
//!   - name: corrections
//!     path: data/fixes.txt
//!     overwrite: true
//! output: merged.txt
//! format: text
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::converter::TextParser;
use crate::error::{Error, Result};
use crate::record::{Record, RecordView};
use crate::tree::Tree;

/// Dump output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `a.b.c.d/n (payload)` lines
    #[default]
    Text,
    /// JSON array of `{ "cidr", "payload" }` objects
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }

    /// Render a tree in this format.
    pub fn render(&self, tree: &Tree<String>) -> Result<String> {
        match self {
            OutputFormat::Text => {
                let mut out = tree.to_string();
                if !out.is_empty() {
                    out.push('\n');
                }
                Ok(out)
            }
            OutputFormat::Json => {
                let views: Vec<RecordView> = tree.records().iter().map(RecordView::from).collect();
                Ok(serde_json::to_string_pretty(&views)?)
            }
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(Error::Config(format!("unknown output format: {}", s))),
        }
    }
}

/// One input of a merge job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Label used in logs; defaults to the file name
    #[serde(default)]
    pub name: Option<String>,
    /// Text source path, optionally gzip-compressed
    pub path: PathBuf,
    /// Whether this source replaces payloads of earlier sources
    #[serde(default)]
    pub overwrite: bool,
    /// Fail on malformed lines instead of skipping them
    #[serde(default)]
    pub strict: bool,
}

impl SourceConfig {
    /// Create a non-overwriting, lenient source.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            name: None,
            path: path.into(),
            overwrite: false,
            strict: false,
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.path.display().to_string(),
        }
    }

    /// Parse every record of this source.
    pub fn load(&self) -> Result<Vec<Record<String>>> {
        TextParser::new().strict(self.strict).parse_file(&self.path)
    }
}

/// Configuration for a merge job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Sources in insertion order
    pub sources: Vec<SourceConfig>,
    /// Output path; stdout when absent
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub format: OutputFormat,
}

impl MergeConfig {
    /// Create a config from sources, writing text to stdout.
    pub fn new(sources: Vec<SourceConfig>) -> Self {
        Self {
            sources,
            output: None,
            format: OutputFormat::Text,
        }
    }

    /// Parse and validate a YAML config.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: MergeConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML config file. Relative source paths resolve against the
    /// config file's directory.
    pub fn from_path(path: &Path) -> Result<Self> {
        let mut config = Self::from_yaml_str(&fs::read_to_string(path)?)?;
        if let Some(base) = path.parent() {
            for source in &mut config.sources {
                if source.path.is_relative() {
                    source.path = base.join(&source.path);
                }
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(Error::Config("no sources configured".to_string()));
        }
        Ok(())
    }

    /// Build a tree from all sources, in order.
    pub fn build_tree(&self) -> Result<Tree<String>> {
        self.validate()?;

        let mut tree = Tree::new();
        for source in &self.sources {
            let records = source.load()?;
            log::info!(
                "Loaded {} records from {} (overwrite: {})",
                records.len(),
                source.display_name(),
                source.overwrite
            );
            for record in records {
                tree.add_record(record, source.overwrite);
            }
            log::debug!("Tree now holds {} blocks", tree.len());
        }
        Ok(tree)
    }
}
