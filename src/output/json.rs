use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::io::{BufWriter, Write};

use super::{OutputSink, Report};
use crate::error::{Result, StoreError};

/// Pretty-printed JSON, one document per report.
pub struct JsonSink {
    writer: BufWriter<Box<dyn Write>>,
}

impl JsonSink {
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    fn write_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, value).map_err(StoreError::Serialize)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl OutputSink for JsonSink {
    fn emit(&mut self, report: &Report<'_>) -> Result<()> {
        match report {
            Report::Status { units, expiry, window } => self.write_value(&json!({
                "units": units.len(),
                "items": units.values().map(|u| u.contents.len()).sum::<usize>(),
                "window_days": window,
                "expired": expiry.expired,
                "expiring": expiry.expiring,
            })),
            Report::Units(units) => {
                let rows: Vec<_> = units
                    .iter()
                    .map(|(name, unit)| {
                        json!({
                            "name": name,
                            "type": unit.kind,
                            "items": unit.contents.len(),
                            "is_example": unit.is_example,
                        })
                    })
                    .collect();
                self.write_value(&rows)
            }
            Report::Items { units, .. } => {
                let map: BTreeMap<&str, _> = units.iter().map(|(n, u)| (*n, &u.contents)).collect();
                self.write_value(&map)
            }
            Report::KnownItems(names) => self.write_value(names),
            Report::History(entries) => self.write_value(entries),
            Report::Stats(stats) => self.write_value(stats),
            Report::Users(users) => {
                let rows: Vec<_> = users
                    .iter()
                    .map(|(name, role)| json!({ "name": name, "role": role }))
                    .collect();
                self.write_value(&rows)
            }
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{StorageUnit, StorageUnits, StoredItem};
    use crate::output::Capture;

    #[test]
    fn test_units_as_json_rows() {
        let mut units = StorageUnits::new();
        let mut kyl = StorageUnit::new("🧊 Kylskåp");
        kyl.contents.insert(
            "Mjölk".into(),
            StoredItem {
                quantity: 2,
                category: "🥛 Mejeri".into(),
                date_added: "2024-03-01".into(),
                expiration_date: "2024-03-25".into(),
            },
        );
        units.insert("Kyl".into(), kyl);

        let capture = Capture::default();
        let mut sink = JsonSink::new(Box::new(capture.clone()));
        sink.emit(&Report::Units(&units)).unwrap();
        sink.flush().unwrap();

        let value: serde_json::Value = serde_json::from_str(&capture.text()).unwrap();
        assert_eq!(value[0]["name"], "Kyl");
        assert_eq!(value[0]["type"], "🧊 Kylskåp");
        assert_eq!(value[0]["items"], 1);
    }

    #[test]
    fn test_empty_stats_is_null() {
        let capture = Capture::default();
        let mut sink = JsonSink::new(Box::new(capture.clone()));
        sink.emit(&Report::Stats(None)).unwrap();
        sink.flush().unwrap();
        assert_eq!(capture.text().trim(), "null");
    }
}
