use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use engine_logging::engine_info;
use harvester_core::{Field, Record};
use tempfile::NamedTempFile;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("output directory {path} is unusable: {reason}")]
    OutputDir { path: PathBuf, reason: String },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub record_count: usize,
    pub output_path: PathBuf,
}

/// Header row from the export column names, then one line per record.
fn write_csv<W: Write>(out: W, records: &[Record]) -> Result<W, ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(Field::ALL.iter().map(|field| field.column_header()))?;
    for record in records {
        writer.write_record(record.values())?;
    }
    writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))
}

/// The CSV text [`CsvExporter`] would write for `records`.
pub fn render_csv(records: &[Record]) -> Result<Vec<u8>, ExportError> {
    write_csv(Vec::new(), records)
}

/// Writes harvested records to `{dir}/{filename}`.
///
/// The CSV is streamed into a temp file next to the target, which then
/// replaces the target in one rename; a failed export leaves any earlier
/// file untouched.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    dir: PathBuf,
}

impl CsvExporter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn unusable_dir(&self, reason: impl ToString) -> ExportError {
        ExportError::OutputDir {
            path: self.dir.clone(),
            reason: reason.to_string(),
        }
    }

    /// Creates the output directory on first use.
    fn prepare_dir(&self) -> Result<(), ExportError> {
        match fs::metadata(&self.dir) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(self.unusable_dir("not a directory")),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(&self.dir).map_err(|err| self.unusable_dir(err))
            }
            Err(err) => Err(self.unusable_dir(err)),
        }
    }

    pub fn export(&self, filename: &str, records: &[Record]) -> Result<ExportSummary, ExportError> {
        self.prepare_dir()?;
        let target = self.dir.join(filename);

        let staged = write_csv(NamedTempFile::new_in(&self.dir)?, records)?;
        staged.as_file().sync_all()?;
        staged
            .persist(&target)
            .map_err(|err| ExportError::Io(err.error))?;

        engine_info!(
            "Saved records count={} path={}",
            records.len(),
            target.display()
        );
        Ok(ExportSummary {
            record_count: records.len(),
            output_path: target,
        })
    }
}
