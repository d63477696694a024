//! Configuration file handling.
//!
//! Settings live in `survey_rater.toml`: how exports are laid out, the
//! default aggregation options, and the accreditation criteria with the
//! survey files that feed each of them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analyzers::aggregate::AggregateOptions;
use crate::analyzers::bucket::{BinaryScheme, BucketMode};
use crate::parser::LoadOptions;
use crate::scores::ScoreLoadOptions;
use crate::table::DEFAULT_DELIMITER;

pub const DEFAULT_CONFIG_FILE: &str = "survey_rater.toml";

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,

    /// Options used by every criterion that does not set its own.
    #[serde(default)]
    pub aggregate: AggregateOptions,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default = "default_criteria")]
    pub criteria: Vec<CriterionConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            aggregate: AggregateOptions::default(),
            output: OutputConfig::default(),
            criteria: default_criteria(),
        }
    }
}

/// Layout shared by all survey exports unless a source overrides it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Directory relative source paths are resolved against.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    #[serde(default = "default_header_rows")]
    pub header_rows: usize,

    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    #[serde(default)]
    pub respondent_column: Option<String>,

    #[serde(default)]
    pub exclude_columns: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            header_rows: default_header_rows(),
            delimiter: default_delimiter(),
            respondent_column: None,
            exclude_columns: Vec::new(),
        }
    }
}

impl InputConfig {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            header_rows: self.header_rows,
            respondent_column: self.respondent_column.clone(),
            delimiter: self.delimiter.clone(),
            exclude_columns: self.exclude_columns.clone(),
        }
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_header_rows() -> usize {
    1
}

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where `summary` writes `index.json` and the per-criterion reports.
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("aggregates")
}

/// One accreditation criterion (C.1 ... C.8) and its survey files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionConfig {
    pub id: String,
    pub name: String,

    /// Overrides the top-level `[aggregate]` options for this criterion.
    #[serde(default)]
    pub aggregate: Option<AggregateOptions>,

    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl CriterionConfig {
    /// The criterion's own options, or `fallback` when it has none.
    pub fn options<'a>(&'a self, fallback: &'a AggregateOptions) -> &'a AggregateOptions {
        self.aggregate.as_ref().unwrap_or(fallback)
    }
}

/// A single survey export feeding a criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Respondent population shown in reports ("Dosen", "Mahasiswa", ...).
    pub label: String,
    pub path: PathBuf,

    #[serde(default)]
    pub header_rows: Option<usize>,

    #[serde(default)]
    pub respondent_column: Option<String>,

    #[serde(default)]
    pub exclude_columns: Option<Vec<String>>,

    /// Set for long-format exports holding one pre-averaged score per row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<ScoreColumns>,
}

/// Column roles of a long-format score export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreColumns {
    pub score_column: String,

    /// Attribute the scores are averaged by.
    #[serde(default)]
    pub group_column: Option<String>,

    /// Attribute columns offered as chained filters, outermost first.
    #[serde(default)]
    pub filter_columns: Vec<String>,
}

impl ScoreColumns {
    /// Filter columns followed by the group column, without repeats.
    pub fn load_options(&self) -> ScoreLoadOptions {
        let mut attribute_columns = self.filter_columns.clone();
        if let Some(group) = self
            .group_column
            .as_ref()
            .filter(|g| !attribute_columns.contains(g))
        {
            attribute_columns.push(group.clone());
        }
        ScoreLoadOptions {
            score_column: self.score_column.clone(),
            attribute_columns,
        }
    }
}

impl SourceConfig {
    /// Load options for this file: the shared input layout with this
    /// source's overrides applied.
    pub fn load_options(&self, input: &InputConfig) -> LoadOptions {
        let mut options = input.load_options();
        if let Some(header_rows) = self.header_rows {
            options.header_rows = header_rows;
        }
        if let Some(column) = &self.respondent_column {
            options.respondent_column = Some(column.clone());
        }
        if let Some(exclude) = &self.exclude_columns {
            options.exclude_columns = exclude.clone();
        }
        options
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Loads `survey_rater.toml` from the working directory.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Explicit path first, then the default location, then built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::load_default()?.unwrap_or_default()),
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> Result<String> {
        toml::to_string_pretty(&Config::default()).context("Failed to serialize default config")
    }

    /// Resolves a source path against `input.base_dir`; absolute paths are kept.
    pub fn source_path(&self, source: &SourceConfig) -> PathBuf {
        if source.path.is_absolute() {
            source.path.clone()
        } else {
            self.input.base_dir.join(&source.path)
        }
    }

    pub fn criterion(&self, id: &str) -> Option<&CriterionConfig> {
        self.criteria.iter().find(|c| c.id == id)
    }
}

fn source(label: &str, path: &str) -> SourceConfig {
    SourceConfig {
        label: label.to_string(),
        path: PathBuf::from(path),
        header_rows: None,
        respondent_column: None,
        exclude_columns: None,
        scores: None,
    }
}

fn two_header_source(label: &str, path: &str) -> SourceConfig {
    SourceConfig {
        header_rows: Some(2),
        ..source(label, path)
    }
}

fn with_respondents(mut source: SourceConfig, column: &str) -> SourceConfig {
    source.respondent_column = Some(column.to_string());
    source
}

fn with_scores(
    mut source: SourceConfig,
    score_column: &str,
    group_column: &str,
    filters: &[&str],
) -> SourceConfig {
    source.scores = Some(ScoreColumns {
        score_column: score_column.to_string(),
        group_column: Some(group_column.to_string()),
        filter_columns: filters.iter().map(|f| f.to_string()).collect(),
    });
    source
}

fn criterion(id: &str, name: &str, aggregate: AggregateOptions, sources: Vec<SourceConfig>) -> CriterionConfig {
    CriterionConfig {
        id: id.to_string(),
        name: name.to_string(),
        aggregate: Some(aggregate),
        sources,
    }
}

/// The eight criteria of the accreditation dashboard with their usual exports.
fn default_criteria() -> Vec<CriterionConfig> {
    let binary = AggregateOptions {
        bucket_mode: BucketMode::Binary,
        ..Default::default()
    };
    let understanding = AggregateOptions {
        bucket_mode: BucketMode::Binary,
        binary_scheme: BinaryScheme::Understanding,
        ..Default::default()
    };
    let four_way = AggregateOptions::default();

    vec![
        criterion(
            "C.1",
            "Visi dan Misi",
            understanding,
            vec![
                with_respondents(
                    source("STT Wastukancana", "C.1.SurveyPemahamanVisiMisiSTTWastukancana.csv"),
                    "1. Status Bpk/Ibu/Saudara/i:",
                ),
                with_respondents(
                    source("Teknik Informatika", "C.1.SurveyPemahamanVisiMisiTIF.csv"),
                    "1. Status Bpk/Ibu/Saudara/i:",
                ),
            ],
        ),
        criterion(
            "C.2",
            "Tata Kelola, Tata Pamong, dan Kerja Sama",
            binary.clone(),
            vec![
                with_respondents(
                    source("Dosen dan Tendik", "C2.tatakeloladosendantendik-prep.csv"),
                    "Status Bpk/Ibu/Saudara/i.",
                ),
                two_header_source("Mahasiswa", "C2.tatakelolamhs-preprossesing.csv"),
            ],
        ),
        criterion(
            "C.3",
            "Mahasiswa",
            binary.clone(),
            vec![source("Mahasiswa", "C3.-layanan-mahasiswa-prep.csv")],
        ),
        criterion(
            "C.4",
            "Sumber Daya Manusia",
            binary.clone(),
            vec![
                two_header_source("Dosen", "C.4.KepuasanDosenterhadapSDM-prep.csv"),
                two_header_source("Tendik", "C.4.KepuasanTendikterhadapSDM-prep.csv"),
            ],
        ),
        criterion(
            "C.5",
            "Keuangan, Sarana, dan Prasarana",
            binary.clone(),
            vec![
                source("Dosen", "C5.saranadosen-prep.csv"),
                source("Mahasiswa", "C5.saranamahasiswa-prep.csv"),
                source("Tendik", "C5.saranatendik-prep.csv"),
            ],
        ),
        criterion(
            "C.6",
            "Pendidikan",
            four_way,
            vec![
                with_scores(
                    source("Dosen", "C.6.Kepuasandosen-prep.csv"),
                    "Rata-rata per Kompetensi",
                    "Kompetensi",
                    &["Tahun Akademik", "Nama Dosen", "Matakuliah"],
                ),
                source("Tendik", "C.6.Kepuasantendik-prep.csv"),
            ],
        ),
        criterion(
            "C.7",
            "Penelitian",
            binary.clone(),
            vec![source("Dosen", "penelitian-prep.csv")],
        ),
        criterion(
            "C.8",
            "Pengabdian kepada Masyarakat",
            binary,
            vec![source("Dosen", "pengabdian-prep.csv")],
        ),
    ]
}
