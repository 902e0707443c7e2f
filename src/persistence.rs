//! Model serialization and persistence
//!
//! Two on-disk formats are supported:
//!
//! - a flat key-value text format (the default):
//!
//!   ```text
//!   solver_type L2R_L2LOSS_SVC_DUAL
//!   nr_class 2
//!   label -1 1
//!   nr_feature 3
//!   bias -1.0
//!   cost 1.0
//!   w
//!   0.25 -0.5 1.0
//!   ```
//!
//!   with one `w` row per weight vector;
//! - JSON (`.json` files), which additionally records metadata.
//!
//! Floats are written in shortest round-trip form, so weights reload bit-exact.

use crate::core::{Result, SVMError, SolverType};
use crate::model::Model;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// On-disk model encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Text,
    Json,
}

impl ModelFormat {
    /// JSON for `.json` paths, text otherwise
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => ModelFormat::Json,
            _ => ModelFormat::Text,
        }
    }
}

/// Save `model` in the format implied by the file extension
pub fn save_model<P: AsRef<Path>>(model: &Model, path: P) -> Result<()> {
    let path = path.as_ref();
    match ModelFormat::from_path(path) {
        ModelFormat::Text => {
            let file = File::create(path)?;
            write_text(model, BufWriter::new(file))
        }
        ModelFormat::Json => SerializableModel::from_model(model).save_to_file(path),
    }
}

/// Load a model saved by [`save_model`]
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Model> {
    let path = path.as_ref();
    match ModelFormat::from_path(path) {
        ModelFormat::Text => {
            let file = File::open(path)?;
            read_text(BufReader::new(file))
        }
        ModelFormat::Json => SerializableModel::load_from_file(path)?.to_model(),
    }
}

/// Write the text format
pub fn write_text<W: Write>(model: &Model, mut writer: W) -> Result<()> {
    writeln!(writer, "solver_type {}", model.solver_type().name())?;
    writeln!(writer, "nr_class {}", model.nr_class())?;
    write!(writer, "label")?;
    for label in model.labels() {
        write!(writer, " {label}")?;
    }
    writeln!(writer)?;
    writeln!(writer, "nr_feature {}", model.n_features())?;
    writeln!(writer, "bias {:?}", model.bias().unwrap_or(-1.0))?;
    writeln!(writer, "cost {:?}", model.cost())?;
    writeln!(writer, "w")?;
    for row in model.weights() {
        let line: Vec<String> = row.iter().map(|w| format!("{w:?}")).collect();
        writeln!(writer, "{}", line.join(" "))?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Default)]
struct TextHeader {
    solver_type: Option<SolverType>,
    nr_class: Option<usize>,
    labels: Option<Vec<i32>>,
    nr_feature: Option<usize>,
    bias: Option<f64>,
    cost: Option<f64>,
}

/// Read the text format
pub fn read_text<R: BufRead>(reader: R) -> Result<Model> {
    let mut header = TextHeader::default();
    let mut lines = reader.lines().enumerate();
    let mut saw_weights = false;
    let mut last_line = 0;

    for (line_num, line) in lines.by_ref() {
        let line_no = line_num + 1;
        last_line = line_no;
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "w" {
            saw_weights = true;
            break;
        }

        let (key, value) = line
            .split_once(char::is_whitespace)
            .map(|(k, v)| (k, v.trim()))
            .ok_or_else(|| SVMError::parse(line_no, format!("missing value for {line}")))?;

        match key {
            "solver_type" => {
                let solver = value
                    .parse::<SolverType>()
                    .map_err(|e| SVMError::parse(line_no, e.to_string()))?;
                header.solver_type = Some(solver);
            }
            "nr_class" => header.nr_class = Some(parse_field(line_no, key, value)?),
            "label" => {
                let labels = value
                    .split_whitespace()
                    .map(|token| parse_field(line_no, key, token))
                    .collect::<Result<Vec<i32>>>()?;
                header.labels = Some(labels);
            }
            "nr_feature" => header.nr_feature = Some(parse_field(line_no, key, value)?),
            "bias" => header.bias = Some(parse_field(line_no, key, value)?),
            "cost" => header.cost = Some(parse_field(line_no, key, value)?),
            other => {
                return Err(SVMError::parse(line_no, format!("unknown field: {other}")));
            }
        }
    }

    if !saw_weights {
        return Err(SVMError::parse(last_line, "missing weight section"));
    }

    let solver_type = required(header.solver_type, "solver_type")?;
    let nr_class = required(header.nr_class, "nr_class")?;
    let labels = required(header.labels, "label")?;
    let n_features = required(header.nr_feature, "nr_feature")?;
    let bias = required(header.bias, "bias")?;
    let cost = header.cost.unwrap_or(1.0);

    if labels.len() != nr_class {
        return Err(SVMError::SerializationError(format!(
            "nr_class is {nr_class} but {} labels are listed",
            labels.len()
        )));
    }

    // exactly one row per weight vector; a model without features has empty rows
    let expected_rows = if nr_class == 2 { 1 } else { nr_class };
    let mut weights = Vec::with_capacity(expected_rows);
    for (line_num, line) in lines {
        let line = line?;
        let line = line.trim();
        if weights.len() == expected_rows {
            if line.is_empty() {
                continue;
            }
            return Err(SVMError::parse(
                line_num + 1,
                format!("expected {expected_rows} weight rows, found more"),
            ));
        }
        let row = line
            .split_whitespace()
            .map(|token| parse_field(line_num + 1, "w", token))
            .collect::<Result<Vec<f64>>>()?;
        weights.push(row);
    }

    let bias = if bias >= 0.0 { Some(bias) } else { None };
    Model::new(solver_type, labels, n_features, bias, cost, weights)
        .map_err(|e| SVMError::SerializationError(e.to_string()))
}

fn parse_field<T: std::str::FromStr>(line: usize, key: &str, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| SVMError::parse(line, format!("invalid {key} value: {value}")))
}

fn required<T>(value: Option<T>, key: &str) -> Result<T> {
    value.ok_or_else(|| SVMError::SerializationError(format!("missing field: {key}")))
}

/// Serializable representation of a trained model
#[derive(Serialize, Deserialize)]
pub struct SerializableModel {
    pub solver_type: String,
    pub labels: Vec<i32>,
    pub nr_feature: usize,
    /// Negative when the model has no bias term
    pub bias: f64,
    pub cost: f64,
    /// One row per weight vector
    pub weights: Vec<Vec<f64>>,
    pub metadata: ModelMetadata,
}

/// Model metadata for tracking and validation
#[derive(Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    /// Creation timestamp
    pub created_at: String,
    /// Sweeps used per weight vector, if the model came straight from training
    pub iterations: Option<Vec<usize>>,
    pub converged: Option<bool>,
}

impl SerializableModel {
    pub fn from_model(model: &Model) -> Self {
        let summary = model.summary();
        Self {
            solver_type: model.solver_type().name().to_string(),
            labels: model.labels().to_vec(),
            nr_feature: model.n_features(),
            bias: model.bias().unwrap_or(-1.0),
            cost: model.cost(),
            weights: model.weights().to_vec(),
            metadata: ModelMetadata {
                library_version: env!("CARGO_PKG_VERSION").to_string(),
                created_at: chrono::Utc::now().to_rfc3339(),
                iterations: summary.map(|s| s.iterations.clone()),
                converged: summary.map(|s| s.converged),
            },
        }
    }

    pub fn to_model(&self) -> Result<Model> {
        let solver_type = self.solver_type.parse::<SolverType>()?;
        let bias = if self.bias >= 0.0 { Some(self.bias) } else { None };
        Model::new(
            solver_type,
            self.labels.clone(),
            self.nr_feature,
            bias,
            self.cost,
            self.weights.clone(),
        )
        .map_err(|e| SVMError::SerializationError(e.to_string()))
    }

    /// Save model to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        Ok(())
    }

    /// Load model from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let model = serde_json::from_reader(reader)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        Ok(model)
    }
}
