use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::report::pdf::render_pdf;
use crate::report::{Report, ReportArtifacts, ReportError};

/// Writes `<stem>_report.json` and `<stem>_report.pdf` into one directory.
/// A second report for the same name overwrites the first.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn write(&self, report: Report) -> Result<ReportArtifacts, ReportError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ReportError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let stem = report.file_stem();
        let json_path = self.dir.join(format!("{stem}_report.json"));
        let pdf_path = self.dir.join(format!("{stem}_report.pdf"));

        let json = serde_json::to_vec_pretty(&report)?;
        write_file(&json_path, &json).await?;

        let (report, pdf) = tokio::task::spawn_blocking(move || {
            let pdf = render_pdf(&report);
            (report, pdf)
        })
        .await?;
        let pdf = pdf?;
        write_file(&pdf_path, &pdf).await?;

        Ok(ReportArtifacts {
            report,
            json_path,
            pdf_path,
            pdf: Bytes::from(pdf),
        })
    }
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<(), ReportError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
}
