//! Schema text generation.
//!
//! [`SchemaWriter`] renders a [`FieldDescriptorTree`] as one message
//! definition plus its `<Name>_ARRAY` wrapper. The output is kept as a list
//! of lines so the fingerprint can be taken over exactly what is written.
use crate::common::Fingerprint;
use crate::header::{FieldDescriptorTree, RepeatedElement, ScalarField, StructField};

use super::config::{Dialect, SchemaOptions};

const INDENT: &str = "  ";

/// A rendered schema file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSchema {
    lines: Vec<String>,
    hash: Fingerprint,
}

impl RenderedSchema {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// SHA-256 over the file bytes.
    pub fn hash(&self) -> &Fingerprint {
        &self.hash
    }

    /// The file content: every line followed by `\n`.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Renders field trees as schema text.
#[derive(Debug, Clone, Default)]
pub struct SchemaWriter {
    options: SchemaOptions,
}

impl SchemaWriter {
    pub fn new(options: SchemaOptions) -> Self {
        Self { options }
    }

    /// Render `tree`: scalars first, then structs, then repeats, each group in
    /// definition order.
    pub fn render(&self, tree: &FieldDescriptorTree) -> RenderedSchema {
        let mut out = Lines::new(self.options.dialect);
        out.line(format!("syntax = \"{}\";", self.options.dialect.syntax()));
        out.line(format!("package {};", self.options.package));
        out.blank();

        out.open(tree.name());
        for field in tree.scalars() {
            out.scalar(field, field.number, None);
        }
        for st in tree.structs() {
            out.nested(st);
            let label = match self.options.dialect {
                Dialect::Legacy => "optional ",
                Dialect::Modern => "",
            };
            out.comment(&st.comment);
            out.line(format!(
                "{}{} {} = {};",
                label,
                st.name,
                lower_first(&st.name),
                st.number
            ));
        }
        for rep in tree.repeats() {
            match &rep.element {
                RepeatedElement::Struct(st) => {
                    out.nested(st);
                    out.comment(&st.comment);
                    out.line(format!(
                        "repeated {} {}s = {};",
                        st.name,
                        lower_first(&st.name),
                        rep.number
                    ));
                },
                RepeatedElement::Scalar(field) => out.scalar(field, rep.number, Some("repeated")),
            }
        }
        out.close();

        out.blank();
        out.open(&format!("{}_ARRAY", tree.name()));
        out.line(format!("repeated {} items = 1;", tree.name()));
        out.close();

        let hash = Fingerprint::of_lines(&out.lines);
        RenderedSchema {
            lines: out.lines,
            hash,
        }
    }
}

/// Line buffer with indentation tracking.
struct Lines {
    dialect: Dialect,
    lines: Vec<String>,
    depth: usize,
}

impl Lines {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            lines: Vec::with_capacity(64),
            depth: 0,
        }
    }

    fn line(&mut self, text: String) {
        let mut line = INDENT.repeat(self.depth);
        line.push_str(&text);
        self.lines.push(line);
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }

    fn open(&mut self, name: &str) {
        self.line(format!("message {} {{", name));
        self.depth += 1;
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("}".to_string());
    }

    fn comment(&mut self, comment: &str) {
        if !comment.is_empty() {
            self.line(format!("/* {} */", sanitize_comment(comment)));
        }
    }

    /// A nested message holding the children of `st`.
    fn nested(&mut self, st: &StructField) {
        self.blank();
        self.open(&st.name);
        for child in &st.fields {
            self.scalar(child, child.number, None);
        }
        self.close();
    }

    /// A scalar declaration. `label` overrides the field's own label.
    fn scalar(&mut self, field: &ScalarField, number: u32, label: Option<&str>) {
        self.comment(&field.comment);
        let ty = field.ty.schema_name();
        let text = match (self.dialect, label) {
            (_, Some(label)) => format!("{} {} {} = {};", label, ty, field.name, number),
            (Dialect::Modern, None) => format!("{} {} = {};", ty, field.name, number),
            (Dialect::Legacy, None) => format!(
                "{} {} {} = {} [default = {}];",
                field.kind.label(),
                ty,
                field.name,
                number,
                default_literal(field)
            ),
        };
        self.line(text);
    }
}

fn default_literal(field: &ScalarField) -> String {
    if field.ty.is_numeric() {
        let literal = field.default.trim();
        if literal.is_empty() || field.ty.validate(literal).is_err() {
            field.ty.zero_default().to_string()
        } else {
            literal.to_string()
        }
    } else {
        let escaped = field.default.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{}\"", escaped)
    }
}

fn sanitize_comment(comment: &str) -> String {
    comment
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .replace("*/", "* /")
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::header::classify;

    fn sample_tree() -> FieldDescriptorTree {
        let grid = Grid::from_rows(
            "Sample",
            [
                vec!["required", "optional", "repeated", "optional_struct", "optional", "optional", "optional_struct", "optional", "optional"],
                vec!["uint64", "string", "2", "2", "int32", "float", "2", "int32", "float"],
                vec!["SampleID", "Title=none", "", "Reward", "Id", "Rate", "Reward", "Id", "Rate"],
                vec!["sample id", "", "", "rewards", "", "drop rate", "", "", ""],
            ],
        );
        classify(&grid, None).expect("classify")
    }

    #[test]
    fn test_legacy_layout() {
        let schema = SchemaWriter::new(SchemaOptions::new().with_package("Game")).render(&sample_tree());
        let expected = "\
syntax = \"proto2\";
package Game;

message Sample {
  /* sample id */
  required uint64 SampleID = 1 [default = 0];
  optional string Title = 2 [default = \"none\"];

  message Reward {
    optional int32 Id = 1 [default = 0];
    /* drop rate */
    optional float Rate = 2 [default = 0];
  }
  /* rewards */
  repeated Reward rewards = 3;
}

message Sample_ARRAY {
  repeated Sample items = 1;
}
";
        assert_eq!(schema.text(), expected);
        assert_eq!(schema.hash(), &Fingerprint::of(expected.as_bytes()));
    }

    #[test]
    fn test_modern_layout() {
        let options = SchemaOptions::new().with_dialect(Dialect::Modern);
        let schema = SchemaWriter::new(options).render(&sample_tree());
        let lines = schema.lines();
        assert_eq!(lines[0], "syntax = \"proto3\";");
        assert_eq!(lines[1], "package ProtobufGen;");
        assert!(lines.contains(&"  uint64 SampleID = 1;".to_string()));
        assert!(lines.contains(&"    int32 Id = 1;".to_string()));
        assert!(lines.contains(&"  repeated Reward rewards = 3;".to_string()));
        assert!(lines.iter().all(|l| !l.contains("default")));
    }

    #[test]
    fn test_scalar_repeat_and_struct_lines() {
        let grid = Grid::from_rows(
            "Bag",
            [
                vec!["repeated", "optional", "optional"],
                vec!["2", "double", "double"],
                vec!["", "Weight", "Weight"],
                vec!["", "", ""],
            ],
        );
        let mut tree = classify(&grid, None).expect("classify");
        tree.insert_struct(StructField::new("Pos", 1).with_field(ScalarField::new(
            "x",
            crate::codec::ScalarType::Sint32,
            crate::header::FieldKind::Required,
        )));
        let schema = SchemaWriter::default().render(&tree);
        let lines = schema.lines();
        assert!(lines.contains(&"  repeated double Weight = 1;".to_string()));
        assert!(lines.contains(&"    required sint32 x = 1 [default = 0];".to_string()));
        assert!(lines.contains(&"  optional Pos pos = 2;".to_string()));
        // Structs render before repeats.
        let pos = lines.iter().position(|l| l == "  optional Pos pos = 2;");
        let weight = lines.iter().position(|l| l == "  repeated double Weight = 1;");
        assert!(pos < weight);
    }

    #[test]
    fn test_hash_tracks_header_changes() {
        let base = SchemaWriter::default().render(&sample_tree());
        let again = SchemaWriter::default().render(&sample_tree());
        assert_eq!(base.hash(), again.hash());

        let mut recommented = sample_tree();
        let mut changed = recommented.clone();
        changed.insert_scalar(
            ScalarField::new("SampleID", crate::codec::ScalarType::Uint32, crate::header::FieldKind::Required)
                .with_comment("sample id"),
        );
        recommented.insert_scalar(
            ScalarField::new("SampleID", crate::codec::ScalarType::Uint64, crate::header::FieldKind::Required)
                .with_comment("the sample id"),
        );
        assert_ne!(SchemaWriter::default().render(&changed).hash(), base.hash());
        assert_ne!(SchemaWriter::default().render(&recommented).hash(), base.hash());
    }

    #[test]
    fn test_comment_cannot_escape() {
        assert_eq!(sanitize_comment("a */ b\nc"), "a * / b c");
        assert_eq!(lower_first("Reward"), "reward");
        assert_eq!(lower_first(""), "");
    }

    #[test]
    fn test_invalid_numeric_default_renders_zero() {
        use crate::codec::ScalarType;
        use crate::header::FieldKind;

        let mut tree = FieldDescriptorTree::new("T");
        tree.insert_scalar(ScalarField::new("Count", ScalarType::Int32, FieldKind::Optional).with_default("abc"));
        tree.insert_scalar(ScalarField::new("Rate", ScalarType::Float64, FieldKind::Optional).with_default("0.5"));
        let lines = SchemaWriter::default().render(&tree).lines().to_vec();
        assert!(lines.contains(&"  optional int32 Count = 1 [default = 0];".to_string()));
        assert!(lines.contains(&"  optional double Rate = 2 [default = 0.5];".to_string()));
    }
}
