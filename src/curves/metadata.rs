//! Persisted edge geometry
//!
//! Hand-edited curve shapes and generator parameters are stored beside the
//! network description as a JSON document of [`EdgeMetaRecord`]s, keyed by
//! `(source, destination, source_port, destination_port)`. Several edges
//! may share a key, so loading consumes records: each lookup returns the
//! first unconsumed match and marks it used.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::EdgePath;
use crate::error::{Result, SpikeVizError};
use crate::geometry::BezierCurve;

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetaPoint {
    pub x: f32,
    pub y: f32,
}

impl From<Vec2> for MetaPoint {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<MetaPoint> for Vec2 {
    fn from(p: MetaPoint) -> Self {
        Vec2::new(p.x, p.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetaCurve {
    pub c1: MetaPoint,
    pub c2: MetaPoint,
    pub end: MetaPoint,
}

/// Geometry and generator parameters of one edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeMetaRecord {
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub source_port: String,
    #[serde(default)]
    pub destination_port: String,
    pub start: MetaPoint,
    pub curves: Vec<MetaCurve>,
    /// Generator parameters of an explicit connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<serde_json::Value>,
    #[serde(skip)]
    consumed: bool,
}

impl EdgeMetaRecord {
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        source_port: impl Into<String>,
        destination_port: impl Into<String>,
        path: &EdgePath,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            source_port: source_port.into(),
            destination_port: destination_port.into(),
            start: path.start.into(),
            curves: path
                .curves
                .iter()
                .map(|c| MetaCurve {
                    c1: c.c1.into(),
                    c2: c.c2.into(),
                    end: c.end.into(),
                })
                .collect(),
            connection: None,
            consumed: false,
        }
    }

    pub fn with_connection(mut self, connection: serde_json::Value) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Stored geometry, `None` when the record has no segments
    pub fn path(&self) -> Option<EdgePath> {
        if self.curves.is_empty() {
            return None;
        }
        Some(EdgePath {
            start: self.start.into(),
            curves: self
                .curves
                .iter()
                .map(|c| BezierCurve::new(c.c1.into(), c.c2.into(), c.end.into()))
                .collect(),
        })
    }

    fn matches(&self, source: &str, destination: &str, source_port: &str, destination_port: &str) -> bool {
        !self.consumed
            && self.source == source
            && self.destination == destination
            && self.source_port == source_port
            && self.destination_port == destination_port
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaDocument {
    version: u32,
    records: Vec<EdgeMetaRecord>,
}

impl Default for MetaDocument {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            records: Vec::new(),
        }
    }
}

impl MetaDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: EdgeMetaRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[EdgeMetaRecord] {
        &self.records
    }

    /// Records not yet claimed by [`MetaDocument::take_match`]
    pub fn remaining(&self) -> usize {
        self.records.iter().filter(|r| !r.consumed).count()
    }

    /// First unconsumed record with this key, marked consumed
    pub fn take_match(
        &mut self,
        source: &str,
        destination: &str,
        source_port: &str,
        destination_port: &str,
    ) -> Option<EdgeMetaRecord> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.matches(source, destination, source_port, destination_port))?;
        record.consumed = true;
        Some(record.clone())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SpikeVizError::Metadata(format!("failed to serialize edge metadata: {}", e)))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let doc: MetaDocument = serde_json::from_str(text)
            .map_err(|e| SpikeVizError::Metadata(format!("failed to parse edge metadata: {}", e)))?;
        if doc.version > FORMAT_VERSION {
            return Err(SpikeVizError::Metadata(format!(
                "edge metadata version {} is newer than supported version {}",
                doc.version, FORMAT_VERSION
            )));
        }
        Ok(doc)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        tracing::info!("Saved {} edge records to {:?}", self.records.len(), path);
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let doc = Self::from_json(&text)?;
        tracing::info!("Loaded {} edge records from {:?}", doc.records.len(), path);
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(offset: f32) -> EdgePath {
        EdgePath::straight(Vec2::new(offset, 0.0), Vec2::new(offset + 4.0, 1.0))
    }

    #[test]
    fn test_take_match_consumes_in_order() {
        let mut doc = MetaDocument::new();
        doc.push(EdgeMetaRecord::new("A", "B", "out", "in", &path(0.0)));
        doc.push(EdgeMetaRecord::new("A", "B", "out", "in", &path(10.0)));
        doc.push(EdgeMetaRecord::new("A", "C", "out", "in", &path(20.0)));

        let first = doc.take_match("A", "B", "out", "in").expect("first");
        assert_eq!(first.path(), Some(path(0.0)));
        let second = doc.take_match("A", "B", "out", "in").expect("second");
        assert_eq!(second.path(), Some(path(10.0)));
        assert!(doc.take_match("A", "B", "out", "in").is_none());
        assert_eq!(doc.remaining(), 1);
    }

    #[test]
    fn test_ports_are_part_of_the_key() {
        let mut doc = MetaDocument::new();
        doc.push(EdgeMetaRecord::new("A", "B", "spike", "in", &path(0.0)));
        assert!(doc.take_match("A", "B", "out", "in").is_none());
        assert!(doc.take_match("A", "B", "spike", "in").is_some());
    }

    #[test]
    fn test_json_roundtrip_resets_consumed() {
        let mut doc = MetaDocument::new();
        doc.push(
            EdgeMetaRecord::new("A", "B", "", "", &path(1.0))
                .with_connection(serde_json::json!({ "type": "kernel" })),
        );
        doc.take_match("A", "B", "", "");
        let json = doc.to_json().expect("serializes");
        assert!(json.contains("\"source_port\": \"\""));

        let mut back = MetaDocument::from_json(&json).expect("parses");
        assert_eq!(back.remaining(), 1);
        let rec = back.take_match("A", "B", "", "").expect("match");
        assert_eq!(rec.connection, Some(serde_json::json!({ "type": "kernel" })));
    }

    #[test]
    fn test_rejects_newer_version() {
        let json = r#"{ "version": 99, "records": [] }"#;
        assert!(MetaDocument::from_json(json).is_err());
        assert!(MetaDocument::from_json("not json").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("edges.json");
        let mut doc = MetaDocument::new();
        doc.push(EdgeMetaRecord::new("A", "A", "", "", &path(0.0)));
        doc.save(&file).expect("saves");
        let loaded = MetaDocument::load(&file).expect("loads");
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_empty_record_has_no_path() {
        let mut rec = EdgeMetaRecord::new("A", "B", "", "", &path(0.0));
        rec.curves.clear();
        assert!(rec.path().is_none());
    }
}
