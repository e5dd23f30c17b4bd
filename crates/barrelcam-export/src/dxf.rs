//! DXF export of unrolled cam profiles.
//!
//! Each profile is drawn as one lightweight polyline on its own layer, with
//! the arc length along the drum on X and the displacement on Y.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use barrelcam_math::Point2;

/// ACI 0 means BYBLOCK and is not a valid layer colour.
const BLACK_LAYER_COLOR: u8 = 7;

/// A named layer with an AutoCAD Color Index colour.
#[derive(Debug, Clone, PartialEq)]
pub struct DxfLayer {
    /// Layer name.
    pub name: String,
    /// ACI colour.
    pub color: u8,
}

/// Polyline entity.
#[derive(Debug, Clone)]
pub struct DxfPolyline {
    /// Layer the entity is drawn on.
    pub layer: String,
    /// Vertices.
    pub points: Vec<Point2>,
    /// Whether the last vertex connects back to the first.
    pub closed: bool,
}

/// DXF document builder.
///
/// Accumulates layers and polylines and writes them as DXF text.
#[derive(Debug, Clone, Default)]
pub struct DxfDocument {
    layers: Vec<DxfLayer>,
    polylines: Vec<DxfPolyline>,
}

impl DxfDocument {
    /// Create a new empty DXF document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer, or recolour it if the name already exists.
    pub fn add_layer(&mut self, name: impl Into<String>, color: u8) {
        let name = name.into();
        let color = if color == 0 { BLACK_LAYER_COLOR } else { color };
        match self.layers.iter_mut().find(|l| l.name == name) {
            Some(layer) => layer.color = color,
            None => self.layers.push(DxfLayer { name, color }),
        }
    }

    /// Whether a layer named `name` has been declared.
    pub fn has_layer(&self, name: &str) -> bool {
        self.layers.iter().any(|l| l.name == name)
    }

    /// Add a polyline on `layer`.
    pub fn add_polyline(&mut self, layer: impl Into<String>, points: Vec<Point2>, closed: bool) {
        self.polylines.push(DxfPolyline {
            layer: layer.into(),
            points,
            closed,
        });
    }

    /// Declared layers.
    pub fn layers(&self) -> &[DxfLayer] {
        &self.layers
    }

    /// Polylines in insertion order.
    pub fn polylines(&self) -> &[DxfPolyline] {
        &self.polylines
    }

    /// Export to a DXF file.
    pub fn export(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        self.export_to_writer(writer)
    }

    /// Export to a writer.
    pub fn export_to_writer(&self, mut writer: impl Write) -> std::io::Result<()> {
        self.write_header(&mut writer)?;
        self.write_tables(&mut writer)?;
        self.write_entities(&mut writer)?;

        writeln!(writer, "0")?;
        writeln!(writer, "EOF")?;
        writer.flush()
    }

    fn write_header(&self, writer: &mut impl Write) -> std::io::Result<()> {
        writeln!(writer, "0")?;
        writeln!(writer, "SECTION")?;
        writeln!(writer, "2")?;
        writeln!(writer, "HEADER")?;

        // LWPOLYLINE needs R2000
        writeln!(writer, "9")?;
        writeln!(writer, "$ACADVER")?;
        writeln!(writer, "1")?;
        writeln!(writer, "AC1015")?;

        // Units = millimeters
        writeln!(writer, "9")?;
        writeln!(writer, "$INSUNITS")?;
        writeln!(writer, "70")?;
        writeln!(writer, "4")?;

        writeln!(writer, "0")?;
        writeln!(writer, "ENDSEC")?;

        Ok(())
    }

    fn write_tables(&self, writer: &mut impl Write) -> std::io::Result<()> {
        writeln!(writer, "0")?;
        writeln!(writer, "SECTION")?;
        writeln!(writer, "2")?;
        writeln!(writer, "TABLES")?;

        self.write_ltype_table(writer)?;
        self.write_layer_table(writer)?;

        writeln!(writer, "0")?;
        writeln!(writer, "ENDSEC")?;

        Ok(())
    }

    fn write_ltype_table(&self, writer: &mut impl Write) -> std::io::Result<()> {
        writeln!(writer, "0")?;
        writeln!(writer, "TABLE")?;
        writeln!(writer, "2")?;
        writeln!(writer, "LTYPE")?;
        writeln!(writer, "70")?;
        writeln!(writer, "1")?;

        writeln!(writer, "0")?;
        writeln!(writer, "LTYPE")?;
        writeln!(writer, "2")?;
        writeln!(writer, "CONTINUOUS")?;
        writeln!(writer, "70")?;
        writeln!(writer, "0")?;
        writeln!(writer, "3")?;
        writeln!(writer, "Solid line")?;
        writeln!(writer, "72")?;
        writeln!(writer, "65")?;
        writeln!(writer, "73")?;
        writeln!(writer, "0")?;
        writeln!(writer, "40")?;
        writeln!(writer, "0.0")?;

        writeln!(writer, "0")?;
        writeln!(writer, "ENDTAB")?;

        Ok(())
    }

    fn write_layer_table(&self, writer: &mut impl Write) -> std::io::Result<()> {
        writeln!(writer, "0")?;
        writeln!(writer, "TABLE")?;
        writeln!(writer, "2")?;
        writeln!(writer, "LAYER")?;
        writeln!(writer, "70")?;
        writeln!(writer, "{}", self.layers.len())?;

        for layer in &self.layers {
            writeln!(writer, "0")?;
            writeln!(writer, "LAYER")?;
            writeln!(writer, "2")?;
            writeln!(writer, "{}", layer.name)?;
            writeln!(writer, "70")?;
            writeln!(writer, "0")?;
            writeln!(writer, "62")?;
            writeln!(writer, "{}", layer.color)?;
            writeln!(writer, "6")?;
            writeln!(writer, "CONTINUOUS")?;
        }

        writeln!(writer, "0")?;
        writeln!(writer, "ENDTAB")?;

        Ok(())
    }

    fn write_entities(&self, writer: &mut impl Write) -> std::io::Result<()> {
        writeln!(writer, "0")?;
        writeln!(writer, "SECTION")?;
        writeln!(writer, "2")?;
        writeln!(writer, "ENTITIES")?;

        for polyline in &self.polylines {
            writeln!(writer, "0")?;
            writeln!(writer, "LWPOLYLINE")?;
            writeln!(writer, "8")?;
            writeln!(writer, "{}", polyline.layer)?;
            writeln!(writer, "90")?;
            writeln!(writer, "{}", polyline.points.len())?;
            writeln!(writer, "70")?;
            writeln!(writer, "{}", u8::from(polyline.closed))?;
            for p in &polyline.points {
                writeln!(writer, "10")?;
                writeln!(writer, "{:.6}", p.x)?;
                writeln!(writer, "20")?;
                writeln!(writer, "{:.6}", p.y)?;
            }
        }

        writeln!(writer, "0")?;
        writeln!(writer, "ENDSEC")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_dxf_layers_and_polyline() {
        let mut doc = DxfDocument::new();
        doc.add_layer("Cam 1", 1);
        doc.add_polyline(
            "Cam 1",
            vec![Point2::new(0.0, 0.0), Point2::new(10.0, 2.5)],
            false,
        );

        let mut buf = Vec::new();
        doc.export_to_writer(&mut buf).unwrap();
        let content = String::from_utf8(buf).unwrap();

        assert!(content.contains("TABLES"));
        assert!(content.contains("LAYER\n2\nCam 1\n70\n0\n62\n1\n"));
        assert!(content.contains("LWPOLYLINE\n8\nCam 1\n90\n2\n70\n0\n"));
        assert!(content.contains("10\n10.000000\n20\n2.500000\n"));
        assert!(content.ends_with("0\nEOF\n"));
    }

    #[test]
    fn test_black_layer_color() {
        let mut doc = DxfDocument::new();
        doc.add_layer("A", 0);
        doc.add_layer("A", 0);
        assert_eq!(doc.layers(), &[DxfLayer { name: "A".into(), color: 7 }]);
        assert!(doc.has_layer("A"));
        assert!(!doc.has_layer("B"));
    }

    #[test]
    fn test_dxf_export_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.dxf");
        let mut doc = DxfDocument::new();
        doc.add_layer("0", 7);
        doc.add_polyline("0", vec![Point2::new(1.0, 1.0)], true);
        doc.export(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("LWPOLYLINE"));
        assert!(content.contains("AC1015"));
        assert!(content.contains("EOF"));
    }
}
