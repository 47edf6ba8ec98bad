use super::artifacts::ArtifactError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One ranked row of `summary.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub rank: usize,
    pub site_index: usize,
    pub site_type: String,
    pub adsorption_energy: f64,
    pub min_separation: f64,
    pub method: String,
    /// Rotation angle in degrees.
    pub optimal_angle: f64,
    /// Rotation axis as `"x y z"`; empty for rotations about the site normal.
    pub optimal_axis: Option<String>,
    pub surrogate_energy: f64,
    pub evaluations: usize,
}

pub fn write_summary_to<W: Write>(writer: W, rows: &[SummaryRow]) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_summary<P: AsRef<Path>>(path: P, rows: &[SummaryRow]) -> Result<(), ArtifactError> {
    let path = path.as_ref();
    let display = path.to_string_lossy().to_string();
    let file = File::create(path).map_err(|e| ArtifactError::Io {
        path: display.clone(),
        source: e,
    })?;
    write_summary_to(BufWriter::new(file), rows).map_err(|e| ArtifactError::Csv {
        path: display,
        source: e,
    })
}

pub fn read_summary<P: AsRef<Path>>(path: P) -> Result<Vec<SummaryRow>, ArtifactError> {
    let path = path.as_ref();
    let to_error = |e: csv::Error| ArtifactError::Csv {
        path: path.to_string_lossy().to_string(),
        source: e,
    };
    let mut reader = csv::Reader::from_path(path).map_err(to_error)?;
    reader
        .deserialize::<SummaryRow>()
        .map(|row| row.map_err(to_error))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(rank: usize, axis: Option<&str>) -> SummaryRow {
        SummaryRow {
            rank,
            site_index: rank + 4,
            site_type: "Hollow".into(),
            adsorption_energy: -0.5 * rank as f64,
            min_separation: 2.1,
            method: "sphere".into(),
            optimal_angle: 90.0,
            optimal_axis: axis.map(str::to_string),
            surrogate_energy: -0.1,
            evaluations: 40,
        }
    }

    #[test]
    fn header_lists_columns_in_order() {
        let mut buffer = Vec::new();
        write_summary_to(&mut buffer, &[row(1, None)]).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(
            header,
            "rank,site_index,site_type,adsorption_energy,min_separation,method,optimal_angle,optimal_axis,surrogate_energy,evaluations"
        );
    }

    #[test]
    fn summary_file_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        let rows = vec![row(1, Some("0 0 1")), row(2, None)];
        write_summary(&path, &rows).unwrap();
        assert_eq!(read_summary(&path).unwrap(), rows);
    }
}
