// ============================================================
// Layer 4 — Dataset Loaders
// ============================================================
// Reads the tabular datasets used by the workflows from local
// files. Downloading them is left to the user.
//
//   LabelledCsvLoader   - class label in the first column, then
//                         features (Fashion-MNIST CSV: 1 + 784)
//   RegressionCsvLoader - headered CSV with a named target
//                         column (radon: floor, county,
//                         log_uranium_ppm, pcterr → radon)
//   BostonLoader        - the StatLib "boston" text file, where
//                         each record is wrapped over two lines
//   IdxLoader           - gzip'd IDX image + label files
//                         (train-images-idx3-ubyte.gz etc.)
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use std::{
    fs::{self, File},
    io::{Cursor, Read},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use byteorder::{BigEndian, ReadBytesExt};
use csv::ReaderBuilder;
use flate2::read::GzDecoder;

use crate::domain::dataset::Dataset;

/// Any component that can produce a dataset with targets of type `T`.
pub trait DatasetSource<T> {
    fn load(&self) -> Result<Dataset<T>>;
}

fn parse_number(field: &str, line: usize, path: &Path) -> Result<f64> {
    field.trim().parse::<f64>().with_context(|| {
        format!("'{}' line {}: '{}' is not a number", path.display(), line, field)
    })
}

// ─── LabelledCsvLoader ────────────────────────────────────────────────────────
pub struct LabelledCsvLoader {
    path:        PathBuf,
    has_headers: bool,
}

impl LabelledCsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), has_headers: true }
    }

    pub fn has_headers(mut self, yes: bool) -> Self {
        self.has_headers = yes;
        self
    }
}

impl DatasetSource<usize> for LabelledCsvLoader {
    fn load(&self) -> Result<Dataset<usize>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open '{}'", self.path.display()))?;
        let mut rdr = ReaderBuilder::new()
            .has_headers(self.has_headers)
            .from_reader(file);

        let mut features = Vec::new();
        let mut labels   = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record.with_context(|| format!("CSV parse error in '{}'", self.path.display()))?;
            let line   = i + 1 + usize::from(self.has_headers);

            let mut fields = record.iter();
            let label = fields
                .next()
                .ok_or_else(|| anyhow!("'{}' line {}: empty record", self.path.display(), line))?;
            let label: usize = label.trim().parse().with_context(|| {
                format!("'{}' line {}: bad class label '{}'", self.path.display(), line, label)
            })?;

            let row = fields
                .map(|f| parse_number(f, line, &self.path))
                .collect::<Result<Vec<f64>>>()?;
            features.push(row);
            labels.push(label);
        }

        tracing::info!("Loaded {} labelled records from '{}'", labels.len(), self.path.display());
        Ok(Dataset::new(features, labels)?)
    }
}

// ─── RegressionCsvLoader ──────────────────────────────────────────────────────
pub struct RegressionCsvLoader {
    path:   PathBuf,
    target: String,
}

impl RegressionCsvLoader {
    pub fn new(path: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self { path: path.into(), target: target.into() }
    }
}

impl DatasetSource<f64> for RegressionCsvLoader {
    fn load(&self) -> Result<Dataset<f64>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open '{}'", self.path.display()))?;
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(file);

        let headers = rdr.headers()?.clone();
        let target_col = headers
            .iter()
            .position(|h| h.trim() == self.target)
            .ok_or_else(|| {
                anyhow!("'{}' has no column named '{}'", self.path.display(), self.target)
            })?;

        let mut features = Vec::new();
        let mut targets  = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            let line   = i + 2;
            let mut row = Vec::with_capacity(record.len().saturating_sub(1));
            for (col, field) in record.iter().enumerate() {
                let value = parse_number(field, line, &self.path)?;
                if col == target_col {
                    targets.push(value);
                } else {
                    row.push(value);
                }
            }
            features.push(row);
        }

        let feature_names: Vec<&str> = headers
            .iter()
            .enumerate()
            .filter(|(col, _)| *col != target_col)
            .map(|(_, h)| h)
            .collect();
        tracing::info!(
            "Loaded {} records from '{}' (features: {})",
            targets.len(),
            self.path.display(),
            feature_names.join(", ")
        );
        Ok(Dataset::with_feature_count(feature_names.len(), features, targets)?)
    }
}

// ─── BostonLoader ─────────────────────────────────────────────────────────────
// The StatLib file starts with a 22-line description, then wraps
// every record over two whitespace-separated lines:
//   line A: CRIM ZN INDUS CHAS NOX RM AGE DIS RAD TAX PTRATIO
//   line B: B LSTAT MEDV
// The 13 features are A + the first two values of B; MEDV is the target.
const BOSTON_PREAMBLE_LINES: usize = 22;
const BOSTON_FIRST_LINE_VALUES: usize = 11;
const BOSTON_SECOND_LINE_VALUES: usize = 3;

pub struct BostonLoader {
    path: PathBuf,
}

impl BostonLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse(&self, text: &str) -> Result<Dataset<f64>> {
        let lines: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .skip(BOSTON_PREAMBLE_LINES)
            .filter(|(_, l)| !l.trim().is_empty())
            .map(|(i, l)| (i + 1, l))
            .collect();

        if lines.len() % 2 != 0 {
            bail!(
                "'{}': odd number of data lines ({}); records span two lines",
                self.path.display(),
                lines.len()
            );
        }

        let mut features = Vec::with_capacity(lines.len() / 2);
        let mut targets  = Vec::with_capacity(lines.len() / 2);
        for pair in lines.chunks(2) {
            let (line_a, a) = pair[0];
            let (line_b, b) = pair[1];
            let a = a
                .split_whitespace()
                .map(|f| parse_number(f, line_a, &self.path))
                .collect::<Result<Vec<f64>>>()?;
            let b = b
                .split_whitespace()
                .map(|f| parse_number(f, line_b, &self.path))
                .collect::<Result<Vec<f64>>>()?;
            if a.len() != BOSTON_FIRST_LINE_VALUES || b.len() != BOSTON_SECOND_LINE_VALUES {
                bail!(
                    "'{}' lines {}-{}: expected {}+{} values, found {}+{}",
                    self.path.display(),
                    line_a,
                    line_b,
                    BOSTON_FIRST_LINE_VALUES,
                    BOSTON_SECOND_LINE_VALUES,
                    a.len(),
                    b.len()
                );
            }
            let mut row = a;
            row.extend_from_slice(&b[..2]);
            features.push(row);
            targets.push(b[2]);
        }

        Ok(Dataset::with_feature_count(
            BOSTON_FIRST_LINE_VALUES + 2,
            features,
            targets,
        )?)
    }
}

impl DatasetSource<f64> for BostonLoader {
    fn load(&self) -> Result<Dataset<f64>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read '{}'", self.path.display()))?;
        let ds = self.parse(&text)?;
        tracing::info!(
            "The dataset has {} samples and {} features",
            ds.record_count(),
            ds.feature_count()
        );
        Ok(ds)
    }
}

// ─── IdxLoader ────────────────────────────────────────────────────────────────
const IDX_LABELS_MAGIC: u32 = 2049;
const IDX_IMAGES_MAGIC: u32 = 2051;

pub struct IdxLoader {
    images: PathBuf,
    labels: PathBuf,
}

impl IdxLoader {
    pub fn new(images: impl Into<PathBuf>, labels: impl Into<PathBuf>) -> Self {
        Self { images: images.into(), labels: labels.into() }
    }
}

fn read_gz(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).with_context(|| format!("Cannot open '{}'", path.display()))?;
    let mut bytes = Vec::new();
    GzDecoder::new(file)
        .read_to_end(&mut bytes)
        .with_context(|| format!("Gzip read error in '{}'", path.display()))?;
    Ok(bytes)
}

fn read_header(r: &mut Cursor<&[u8]>, expected_magic: u32, path: &Path) -> Result<usize> {
    let magic = r.read_u32::<BigEndian>()?;
    if magic != expected_magic {
        bail!("'{}': bad IDX magic {} (expected {})", path.display(), magic, expected_magic);
    }
    read_dim(r)
}

fn read_dim(r: &mut Cursor<&[u8]>) -> Result<usize> {
    Ok(usize::try_from(r.read_u32::<BigEndian>()?)?)
}

/// Decode an IDX label file (magic 2049)
pub fn parse_idx_labels(bytes: &[u8], path: &Path) -> Result<Vec<usize>> {
    let mut r = Cursor::new(bytes);
    let count = read_header(&mut r, IDX_LABELS_MAGIC, path)?;
    let body  = &bytes[r.position() as usize..];
    if body.len() < count {
        bail!("'{}': {} labels declared, {} present", path.display(), count, body.len());
    }
    Ok(body[..count].iter().map(|&b| b as usize).collect())
}

/// Decode an IDX image file (magic 2051) into flattened rows
pub fn parse_idx_images(bytes: &[u8], path: &Path) -> Result<Vec<Vec<f64>>> {
    let mut r = Cursor::new(bytes);
    let count = read_header(&mut r, IDX_IMAGES_MAGIC, path)?;
    let rows  = read_dim(&mut r)?;
    let cols  = read_dim(&mut r)?;
    if rows == 0 || cols == 0 {
        bail!("'{}': image dimensions {}x{} must be positive", path.display(), rows, cols);
    }
    let Some(total) = rows.checked_mul(cols).and_then(|pixels| pixels.checked_mul(count)) else {
        bail!("'{}': {} images of {}x{} overflow the address space", path.display(), count, rows, cols);
    };
    let pixels = rows * cols;

    let body = &bytes[r.position() as usize..];
    if body.len() < total {
        bail!(
            "'{}': {} images of {}x{} declared, only {} bytes present",
            path.display(),
            count,
            rows,
            cols,
            body.len()
        );
    }
    Ok(body[..total]
        .chunks(pixels)
        .map(|img| img.iter().map(|&p| p as f64).collect())
        .collect())
}

impl DatasetSource<usize> for IdxLoader {
    fn load(&self) -> Result<Dataset<usize>> {
        let images = parse_idx_images(&read_gz(&self.images)?, &self.images)?;
        let labels = parse_idx_labels(&read_gz(&self.labels)?, &self.labels)?;
        if images.len() != labels.len() {
            bail!(
                "{} images in '{}' but {} labels in '{}'",
                images.len(),
                self.images.display(),
                labels.len(),
                self.labels.display()
            );
        }
        tracing::info!(
            "Dimensions of the dataset: {} x {}",
            images.len(),
            images.first().map_or(0, Vec::len)
        );
        Ok(Dataset::new(images, labels)?)
    }
}
