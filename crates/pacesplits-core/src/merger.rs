use crate::normalizer::YearTable;
use crate::record::{canonical_order, CheckpointRecord};

/// All years' canonical records in one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalDataset {
    pub records: Vec<CheckpointRecord>,
}

impl CanonicalDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn valid_records(&self) -> impl Iterator<Item = &CheckpointRecord> {
        self.records.iter().filter(|r| r.valid)
    }

    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.records.iter().map(|r| r.year).collect();
        years.dedup();
        years
    }
}

/// Concatenates per-year tables and puts them in canonical order. Nothing is
/// deduplicated or rewritten across years.
pub fn merge(tables: &[YearTable]) -> CanonicalDataset {
    let mut records: Vec<CheckpointRecord> = tables
        .iter()
        .flat_map(|table| table.records.iter().cloned())
        .collect();
    records.sort_by(canonical_order);
    CanonicalDataset { records }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLog;
    use pacesplits_parser::SourceFormat;

    fn table(year: i32, bibs: &[&str], format: SourceFormat) -> YearTable {
        let records = bibs
            .iter()
            .map(|bib| CheckpointRecord {
                year,
                bib: bib.to_string(),
                station_id: "AS1".into(),
                station_order: Some(1),
                check_in: None,
                check_out: None,
                source_format: format,
                valid: *bib != "9",
                invalid_reason: None,
                is_outlier: false,
            })
            .collect();
        YearTable {
            year,
            format,
            raw_rows: bibs.len(),
            records,
            audit: AuditLog::default(),
            rejected: 0,
            superseded: 0,
            filled: 0,
        }
    }

    #[test]
    fn merge_keeps_every_row_in_year_then_bib_order() {
        let tables = vec![
            table(2021, &["10", "9"], SourceFormat::FullSplit),
            table(2016, &["2"], SourceFormat::TimeInOnly),
        ];

        let merged = merge(&tables);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.years(), vec![2016, 2021]);
        assert_eq!(merged.records[0].source_format, SourceFormat::TimeInOnly);
        assert_eq!(merged.records[1].bib, "9");
        assert_eq!(merged.valid_records().count(), 2);
    }
}
