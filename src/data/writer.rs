use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use tempfile::NamedTempFile;

use super::model::Table;

/// A fully written CSV waiting in a temporary file next to its destination.
/// Dropping it without [`StagedCsv::commit`] removes the temporary file.
#[derive(Debug)]
pub struct StagedCsv {
    file: NamedTempFile,
    path: PathBuf,
    rows: usize,
}

impl StagedCsv {
    /// Move the staged file over its destination.
    pub fn commit(self) -> Result<()> {
        self.file
            .persist(&self.path)
            .with_context(|| format!("moving output into {}", self.path.display()))?;
        info!("wrote {} rows to {}", self.rows, self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Write a table as CSV into a temporary file in the destination directory.
/// Output depends only on the table contents, so identical tables produce
/// identical bytes.
pub fn stage_csv(table: &Table, path: &Path) -> Result<StagedCsv> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
            parent
        }
        None => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temporary file in {}", dir.display()))?;
    write_csv_to(table, &mut file).with_context(|| format!("writing {}", path.display()))?;
    Ok(StagedCsv {
        file,
        path: path.to_path_buf(),
        rows: table.len(),
    })
}

pub fn write_csv_to<W: Write>(table: &Table, sink: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|v| v.render()))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Value;

    #[test]
    fn renders_cells() {
        let table = Table::from_rows(
            "out",
            vec!["zip".into(), "rate".into(), "income".into()],
            vec![
                vec![Value::text("02139"), Value::Float(0.65), Value::Float(f64::INFINITY)],
                vec![Value::Missing, Value::Float(0.0), Value::Float(70000.0)],
            ],
        )
        .unwrap();
        let mut buf = Vec::new();
        write_csv_to(&table, &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "zip,rate,income\n02139,0.65,inf\n,0.0,70000.0\n"
        );
    }

    #[test]
    fn staged_file_appears_only_on_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("table.csv");
        let table = Table::from_rows("out", vec!["zip".into()], vec![vec![Value::text("02139")]])
            .unwrap();

        let staged = stage_csv(&table, &path).unwrap();
        assert_eq!(staged.path(), path.as_path());
        assert!(!path.exists());
        staged.commit().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "zip\n02139\n");
        assert_eq!(std::fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn dropped_stage_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        let table = Table::from_rows("out", vec!["zip".into()], vec![]).unwrap();

        drop(stage_csv(&table, &path).unwrap());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
