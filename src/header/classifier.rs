//! Header classification.
//!
//! A pass walks the attribute row left to right. The attribute of each
//! column either defines a scalar, opens a repeated group, or opens a struct
//! block. Open groups close themselves once their declared number of child
//! columns has been consumed, and whatever is still open at the end of the
//! row is closed implicitly.

use std::collections::HashSet;
use std::mem;

use tracing::{debug, warn};

use super::tree::FieldDescriptorTree;
use super::types::{
    Diagnostic, FieldKind, RepeatedElement, RepeatedField, ScalarField, StructField,
};
use crate::codec::ScalarType;
use crate::common::{Error, Result};
use crate::grid::{Cell, Grid};

/// Row holding `required`, `repeated`, `optional_struct`, ...
pub const ROW_ATTRIBUTE: usize = 0;
/// Row holding the scalar type, or the count/width of a group.
pub const ROW_TYPE: usize = 1;
/// Row holding `name` or `name=default`.
pub const ROW_IDENTIFIER: usize = 2;
/// Row holding free-text comments.
pub const ROW_COMMENT: usize = 3;
/// First data row.
pub const ROW_DATA: usize = 4;

const ATTR_REPEATED: &str = "repeated";
const ATTR_STRUCT: &str = "optional_struct";

/// Options of a classification pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyOptions {
    /// Register an `optional_struct` outside a repeated group as a top-level
    /// struct field instead of ignoring it.
    pub standalone_structs: bool,
}

impl ClassifyOptions {
    pub fn with_standalone_structs(mut self, enabled: bool) -> Self {
        self.standalone_structs = enabled;
        self
    }
}

/// Runs classification passes with fixed options.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    options: ClassifyOptions,
}

impl Classifier {
    pub fn new(options: ClassifyOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ClassifyOptions {
        self.options
    }

    /// Classify the header of `grid` into `tree`.
    ///
    /// Column positions in `tree` are reset first and re-derived from this
    /// sheet; field numbers already allocated are kept. Recoverable problems
    /// are returned (and logged); a duplicate name within this sheet is an
    /// error.
    pub fn classify(&self, grid: &Grid, tree: &mut FieldDescriptorTree) -> Result<Vec<Diagnostic>> {
        tree.reset_columns();
        let mut pass = Pass {
            tree,
            grid,
            options: self.options,
            seen: HashSet::new(),
            scope: Scope::Idle,
            diagnostics: Vec::new(),
        };
        for column in 0..grid.column_count() {
            pass.column(column)?;
        }
        pass.finish()
    }
}

/// Classify `grid` with default options, extending `existing` when given.
pub fn classify(grid: &Grid, existing: Option<FieldDescriptorTree>) -> Result<FieldDescriptorTree> {
    let mut tree = existing.unwrap_or_else(|| FieldDescriptorTree::new(grid.name().trim()));
    Classifier::default().classify(grid, &mut tree)?;
    Ok(tree)
}

struct PendingRepeat {
    column: usize,
    max_count: usize,
    /// Child columns (scalar) or blocks (struct) still expected.
    remaining: usize,
    element: Option<RepeatedElement>,
}

struct PendingStruct {
    column: usize,
    name: String,
    comment: String,
    width: usize,
    remaining: usize,
    fields: Vec<ScalarField>,
}

impl PendingStruct {
    fn push(&mut self, field: Option<ScalarField>) {
        if let Some(mut field) = field {
            field.number = self.fields.len() as u32 + 1;
            self.fields.push(field);
        }
        self.remaining = self.remaining.saturating_sub(1);
    }
}

enum Scope {
    Idle,
    InRepeat(PendingRepeat),
    InStruct(PendingStruct),
    InStructWithinRepeat(PendingRepeat, PendingStruct),
}

struct Pass<'a> {
    tree: &'a mut FieldDescriptorTree,
    grid: &'a Grid,
    options: ClassifyOptions,
    seen: HashSet<String>,
    scope: Scope,
    diagnostics: Vec<Diagnostic>,
}

impl Pass<'_> {
    fn column(&mut self, column: usize) -> Result<()> {
        let attr = self.grid.text(ROW_ATTRIBUTE, column).trim();
        if attr.is_empty() {
            return Ok(());
        }
        if let Some(kind) = FieldKind::parse(attr) {
            return self.scalar_column(column, kind);
        }
        match attr {
            ATTR_REPEATED => self.open_repeat(column),
            ATTR_STRUCT => self.open_struct(column),
            other => {
                debug!(sheet = self.grid.name(), column, attribute = other, "ignoring column");
                Ok(())
            },
        }
    }

    fn scalar_column(&mut self, column: usize, kind: FieldKind) -> Result<()> {
        let field = self.read_scalar(column, kind);
        match mem::replace(&mut self.scope, Scope::Idle) {
            Scope::Idle => {
                if let Some(field) = field {
                    self.define_scalar(field)?;
                }
            },
            Scope::InRepeat(mut rep) => {
                if let Some(RepeatedElement::Struct(template)) = &rep.element {
                    let name = template.name.clone();
                    self.report(Diagnostic::StructureMismatch {
                        field: name,
                        reason: format!("scalar column {} inside a struct repeat", column),
                    });
                    self.close_repeat(rep)?;
                    if let Some(field) = field {
                        self.define_scalar(field)?;
                    }
                    return Ok(());
                }
                if rep.element.is_none() {
                    rep.element = field.map(RepeatedElement::Scalar);
                }
                rep.remaining = rep.remaining.saturating_sub(1);
                self.resume_repeat(rep)?;
            },
            Scope::InStruct(mut st) => {
                st.push(field);
                if st.remaining == 0 {
                    self.close_standalone(st)?;
                } else {
                    self.scope = Scope::InStruct(st);
                }
            },
            Scope::InStructWithinRepeat(mut rep, mut st) => {
                st.push(field);
                if st.remaining == 0 {
                    self.finish_block(&mut rep, st)?;
                    self.resume_repeat(rep)?;
                } else {
                    self.scope = Scope::InStructWithinRepeat(rep, st);
                }
            },
        }
        Ok(())
    }

    fn open_repeat(&mut self, column: usize) -> Result<()> {
        self.close_all()?;
        let Some(max_count) = self.group_size(column) else {
            return Ok(());
        };
        if max_count == 0 {
            self.report(Diagnostic::EmptyRepeat { column });
            return Ok(());
        }
        self.scope = Scope::InRepeat(PendingRepeat {
            column,
            max_count,
            remaining: max_count,
            element: None,
        });
        Ok(())
    }

    fn open_struct(&mut self, column: usize) -> Result<()> {
        let Some(width) = self.group_size(column) else {
            return self.close_all();
        };
        let st = PendingStruct {
            column,
            name: self.grid.text(ROW_IDENTIFIER, column).trim().to_string(),
            comment: self.grid.text(ROW_COMMENT, column).trim().to_string(),
            width,
            remaining: width,
            fields: Vec::new(),
        };

        // Whatever struct was open ends here.
        match mem::replace(&mut self.scope, Scope::Idle) {
            Scope::InStruct(prev) => self.close_standalone(prev)?,
            Scope::InStructWithinRepeat(mut rep, prev) => {
                self.finish_block(&mut rep, prev)?;
                self.resume_repeat(rep)?;
            },
            other => self.scope = other,
        }

        match mem::replace(&mut self.scope, Scope::Idle) {
            Scope::InRepeat(rep) if matches!(rep.element, Some(RepeatedElement::Scalar(_))) => {
                self.report(Diagnostic::StructureMismatch {
                    field: rep.element.as_ref().map(|e| e.name().to_string()).unwrap_or_default(),
                    reason: format!("struct column {} inside a scalar repeat", column),
                });
                self.close_repeat(rep)?;
                self.open_standalone(st)
            },
            Scope::InRepeat(mut rep) => {
                if width == 0 {
                    self.finish_block(&mut rep, st)?;
                    self.resume_repeat(rep)
                } else {
                    self.scope = Scope::InStructWithinRepeat(rep, st);
                    Ok(())
                }
            },
            _ => self.open_standalone(st),
        }
    }

    fn open_standalone(&mut self, st: PendingStruct) -> Result<()> {
        if !self.options.standalone_structs {
            self.report(Diagnostic::StandaloneStruct {
                column: st.column,
                name: st.name.clone(),
            });
        }
        if st.remaining == 0 {
            self.close_standalone(st)
        } else {
            self.scope = Scope::InStruct(st);
            Ok(())
        }
    }

    /// Put `rep` back as the open scope, or close it when it is complete.
    fn resume_repeat(&mut self, rep: PendingRepeat) -> Result<()> {
        if rep.remaining == 0 {
            self.close_repeat(rep)
        } else {
            self.scope = Scope::InRepeat(rep);
            Ok(())
        }
    }

    /// Account for one struct block of a repeat. The first block becomes the
    /// element template.
    fn finish_block(&mut self, rep: &mut PendingRepeat, st: PendingStruct) -> Result<()> {
        rep.remaining = rep.remaining.saturating_sub(1);
        let Some(element) = &rep.element else {
            let template = self.build_struct(st)?;
            rep.element = Some(RepeatedElement::Struct(template));
            return Ok(());
        };
        if let RepeatedElement::Struct(template) = element {
            if template.width != st.width {
                self.report(Diagnostic::StructureMismatch {
                    field: template.name.clone(),
                    reason: format!(
                        "block at column {} has width {} instead of {}",
                        st.column, st.width, template.width
                    ),
                });
            }
        }
        Ok(())
    }

    fn build_struct(&self, st: PendingStruct) -> Result<StructField> {
        let mut names = HashSet::new();
        for child in &st.fields {
            if !names.insert(child.name.as_str()) {
                return Err(Error::DuplicateFieldName {
                    artifact: self.tree.name().to_string(),
                    name: format!("{}.{}", st.name, child.name),
                    column: child.column.unwrap_or(st.column),
                });
            }
        }
        Ok(StructField {
            name: st.name,
            comment: st.comment,
            width: st.width,
            fields: st.fields,
            column: Some(st.column),
            number: 0,
        })
    }

    fn close_repeat(&mut self, rep: PendingRepeat) -> Result<()> {
        let Some(element) = rep.element else {
            self.report(Diagnostic::EmptyRepeat { column: rep.column });
            return Ok(());
        };
        if element.name().is_empty() {
            self.report(Diagnostic::UnnamedField { column: rep.column });
            return Ok(());
        }
        self.check_duplicate(element.name(), rep.column)?;
        let field = RepeatedField::new(rep.max_count, element).at(rep.column);
        if let Some(diagnostic) = self.tree.insert_repeated(field) {
            self.report(diagnostic);
        }
        Ok(())
    }

    fn close_standalone(&mut self, st: PendingStruct) -> Result<()> {
        if !self.options.standalone_structs {
            return Ok(());
        }
        if st.name.is_empty() {
            self.report(Diagnostic::UnnamedField { column: st.column });
            return Ok(());
        }
        let column = st.column;
        let field = self.build_struct(st)?;
        self.check_duplicate(&field.name, column)?;
        if let Some(diagnostic) = self.tree.insert_struct(field) {
            self.report(diagnostic);
        }
        Ok(())
    }

    fn close_all(&mut self) -> Result<()> {
        match mem::replace(&mut self.scope, Scope::Idle) {
            Scope::Idle => Ok(()),
            Scope::InRepeat(rep) => self.close_repeat(rep),
            Scope::InStruct(st) => self.close_standalone(st),
            Scope::InStructWithinRepeat(mut rep, st) => {
                self.finish_block(&mut rep, st)?;
                self.close_repeat(rep)
            },
        }
    }

    fn define_scalar(&mut self, field: ScalarField) -> Result<()> {
        let column = field.column.unwrap_or_default();
        self.check_duplicate(&field.name, column)?;
        if let Some(diagnostic) = self.tree.insert_scalar(field) {
            self.report(diagnostic);
        }
        Ok(())
    }

    fn check_duplicate(&mut self, name: &str, column: usize) -> Result<()> {
        if self.seen.insert(name.to_string()) {
            Ok(())
        } else {
            Err(Error::DuplicateFieldName {
                artifact: self.tree.name().to_string(),
                name: name.to_string(),
                column,
            })
        }
    }

    fn read_scalar(&mut self, column: usize, kind: FieldKind) -> Option<ScalarField> {
        let grid = self.grid;
        let declared = grid.text(ROW_TYPE, column).trim();
        let Some(ty) = ScalarType::parse(declared) else {
            let declared = declared.to_string();
            self.report(Diagnostic::UnknownType { column, declared });
            return None;
        };

        let identifier = grid.text(ROW_IDENTIFIER, column);
        let (name, default) = match identifier.split_once('=') {
            Some((name, default)) => (name.trim(), Some(unquote(default.trim()))),
            None => (identifier.trim(), None),
        };
        if name.is_empty() {
            self.report(Diagnostic::UnnamedField { column });
            return None;
        }

        let mut field = ScalarField::new(name, ty, kind)
            .at(column)
            .with_comment(grid.text(ROW_COMMENT, column).trim());
        if let Some(default) = default {
            if default.is_empty() || ty.validate(default).is_ok() {
                field.default = default.to_string();
            } else {
                self.report(Diagnostic::InvalidDefault {
                    field: name.to_string(),
                    ty,
                    default: default.to_string(),
                });
            }
        }
        Some(field)
    }

    /// Integer in the type row of a group column; anything else is zero.
    fn count_at(&self, column: usize) -> usize {
        self.grid
            .cell(ROW_TYPE, column)
            .and_then(Cell::to_int)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0)
    }

    /// Size of the group opened at `column`. A size larger than the columns
    /// left in the sheet is reported and the group is dropped.
    fn group_size(&mut self, column: usize) -> Option<usize> {
        let size = self.count_at(column);
        let available = self.grid.column_count().saturating_sub(column + 1);
        if size <= available {
            return Some(size);
        }
        let field = self.grid.text(ROW_IDENTIFIER, column).trim().to_string();
        self.report(Diagnostic::StructureMismatch {
            field,
            reason: format!(
                "column {} declares {} columns but only {} follow",
                column, size, available
            ),
        });
        None
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        warn!(artifact = self.tree.name(), sheet = self.grid.name(), "{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    fn finish(mut self) -> Result<Vec<Diagnostic>> {
        self.close_all()?;
        Ok(self.diagnostics)
    }
}

/// Strip one pair of surrounding double quotes.
fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::types::FieldDescriptor;

    fn header(name: &str, rows: [&[&str]; 4]) -> Grid {
        Grid::from_rows(name, rows.iter().map(|r| r.iter().copied()))
    }

    fn sample_grid() -> Grid {
        header(
            "Sample",
            [
                &["required", "repeated", "optional_struct", "optional", "optional", "optional", "optional_struct", "optional", "optional", "optional", "optional_struct", "optional", "optional", "optional"],
                &["uint64", "3", "3", "int32", "string", "float", "3", "int32", "string", "float", "3", "int32", "string", "float"],
                &["SampleID", "", "Reward", "Id", "Name", "Rate", "Reward", "Id", "Name", "Rate", "Reward", "Id", "Name", "Rate"],
                &["sample id", "", "reward", "", "", "", "", "", "", "", "", "", "", ""],
            ],
        )
    }

    #[test]
    fn test_scalar_and_struct_repeat() {
        let tree = classify(&sample_grid(), None).expect("classify");
        assert_eq!(tree.name(), "Sample");
        assert_eq!(tree.len(), 2);

        let id = tree.scalars().next().expect("scalar");
        assert_eq!(id.name, "SampleID");
        assert_eq!(id.ty, ScalarType::Uint64);
        assert_eq!(id.kind, FieldKind::Required);
        assert_eq!(id.number, 1);
        assert_eq!(id.column, Some(0));
        assert_eq!(id.default, "0");
        assert_eq!(id.comment, "sample id");

        let rep = tree.repeats().next().expect("repeat");
        assert_eq!(rep.number, 2);
        assert_eq!(rep.max_count, 3);
        assert_eq!(rep.column, Some(1));
        assert_eq!(rep.name(), "Reward");
        match &rep.element {
            RepeatedElement::Struct(s) => {
                assert_eq!(s.width, 3);
                assert_eq!(s.column, Some(2));
                let children: Vec<_> = s
                    .fields
                    .iter()
                    .map(|f| (f.name.as_str(), f.number, f.column))
                    .collect();
                assert_eq!(
                    children,
                    vec![("Id", 1, Some(3)), ("Name", 2, Some(4)), ("Rate", 3, Some(5))]
                );
            },
            other => panic!("expected struct element, got {:?}", other),
        }
    }

    #[test]
    fn test_default_literal_and_zero_defaults() {
        let grid = header(
            "T",
            [
                &["optional", "optional", "unique"],
                &["int32", "string", "string"],
                &["Level=5", "Title=\"none\"", "Key"],
                &["", "", ""],
            ],
        );
        let tree = classify(&grid, None).expect("classify");
        let defaults: Vec<_> = tree.scalars().map(|f| (f.name.as_str(), f.default.as_str())).collect();
        assert_eq!(defaults, vec![("Level", "5"), ("Title", "none"), ("Key", "")]);
        assert!(tree.scalars().nth(2).is_some_and(ScalarField::is_unique));
    }

    #[test]
    fn test_scalar_repeat() {
        let grid = header(
            "T",
            [
                &["repeated", "optional", "optional", "required"],
                &["2", "int32", "int32", "string"],
                &["", "Score", "Score", "Tail"],
                &["", "scores", "", ""],
            ],
        );
        let tree = classify(&grid, None).expect("classify");
        let rep = tree.repeats().next().expect("repeat");
        assert_eq!((rep.number, rep.max_count, rep.column), (1, 2, Some(0)));
        match &rep.element {
            RepeatedElement::Scalar(s) => {
                assert_eq!(s.name, "Score");
                assert_eq!(s.number, 1);
                assert_eq!(s.column, Some(1));
            },
            other => panic!("expected scalar element, got {:?}", other),
        }
        let tail = tree.scalars().next().expect("tail");
        assert_eq!((tail.name.as_str(), tail.number, tail.column), ("Tail", 2, Some(3)));
    }

    #[test]
    fn test_duplicate_name_is_fatal() {
        let grid = header(
            "Dup",
            [&["optional", "optional"], &["int32", "int32"], &["A", "A"], &["", ""]],
        );
        match classify(&grid, None) {
            Err(Error::DuplicateFieldName { artifact, name, column }) => {
                assert_eq!((artifact.as_str(), name.as_str(), column), ("Dup", "A", 1));
            },
            other => panic!("expected duplicate error, got {:?}", other),
        }
    }

    #[test]
    fn test_numbers_survive_shifted_columns() {
        let first = header(
            "Merged",
            [&["optional", "optional"], &["int32", "string"], &["A", "B"], &["", ""]],
        );
        let second = header(
            "Merged",
            [
                &["optional", "optional", "optional"],
                &["string", "int32", "int32"],
                &["B", "C", "A"],
                &["", "", ""],
            ],
        );
        let tree = classify(&first, None).expect("first");
        let tree = classify(&second, Some(tree)).expect("second");

        let fields: Vec<_> = tree
            .scalars()
            .map(|f| (f.name.as_str(), f.number, f.column))
            .collect();
        assert_eq!(fields, vec![("A", 1, Some(2)), ("B", 2, Some(0)), ("C", 3, Some(1))]);
    }

    #[test]
    fn test_field_missing_from_later_sheet() {
        let first = header(
            "Merged",
            [&["optional", "optional"], &["int32", "int32"], &["A", "B"], &["", ""]],
        );
        let second = header("Merged", [&["optional"], &["int32"], &["B"], &[""]]);
        let tree = classify(&first, None).expect("first");
        let tree = classify(&second, Some(tree)).expect("second");

        match tree.get("A") {
            Some(FieldDescriptor::Scalar(a)) => assert_eq!((a.number, a.column), (1, None)),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(tree.next_number(), 3);
    }

    #[test]
    fn test_blank_attribute_keeps_scope() {
        let grid = header(
            "T",
            [
                &["repeated", "", "optional", "optional", "optional"],
                &["2", "", "int32", "int32", "int32"],
                &["", "note", "V", "V", "After"],
                &["", "", "", "", ""],
            ],
        );
        let tree = classify(&grid, None).expect("classify");
        assert_eq!(tree.repeats().next().map(|r| r.name().to_string()), Some("V".into()));
        assert_eq!(tree.scalars().map(|s| s.name.as_str()).collect::<Vec<_>>(), vec!["After"]);
    }

    #[test]
    fn test_unterminated_repeat_closes_at_end() {
        let grid = header(
            "T",
            [
                &["repeated", "optional_struct", "optional"],
                &["2", "1", "int32"],
                &["", "P", "x"],
                &["", "", ""],
            ],
        );
        let tree = classify(&grid, None).expect("classify");
        assert_eq!(tree.repeats().next().map(|r| (r.max_count, r.name())), Some((2, "P")));
    }

    #[test]
    fn test_merged_sheet_cannot_widen_structs() {
        let classifier = Classifier::new(ClassifyOptions::default().with_standalone_structs(true));
        let mut tree = FieldDescriptorTree::new("T");
        let first = header(
            "T",
            [
                &["optional_struct", "optional", "repeated", "optional_struct", "optional"],
                &["1", "int32", "1", "1", "int32"],
                &["Pos", "x", "", "Reward", "Id"],
                &["", "", "", "", ""],
            ],
        );
        assert!(classifier.classify(&first, &mut tree).expect("first").is_empty());

        let second = header(
            "T",
            [
                &["optional_struct", "optional", "optional", "repeated", "optional_struct", "optional", "optional"],
                &["2", "int32", "int32", "1", "2", "int32", "int32"],
                &["Pos", "x", "y", "", "Reward", "Id", "Count"],
                &["", "", "", "", "", "", ""],
            ],
        );
        let diagnostics = classifier.classify(&second, &mut tree).expect("second");
        let rejected: Vec<_> = diagnostics
            .iter()
            .map(|d| match d {
                Diagnostic::StructureMismatch { field, .. } => field.as_str(),
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(rejected, vec!["Pos", "Reward"]);
        assert_eq!(tree.structs().next().map(|s| s.width), Some(1));
        assert_eq!(tree.repeats().next().and_then(RepeatedField::struct_width), Some(1));
    }

    #[test]
    fn test_oversized_struct_width_is_rejected() {
        let grid = header(
            "T",
            [
                &["required", "optional_struct", "optional"],
                &["uint64", "99999999999999999", "int32"],
                &["Id", "Huge", "x"],
                &["", "", ""],
            ],
        );
        let mut tree = FieldDescriptorTree::new("T");
        let diagnostics = Classifier::default().classify(&grid, &mut tree).expect("classify");
        match diagnostics.as_slice() {
            [Diagnostic::StructureMismatch { field, reason }] => {
                assert_eq!(field, "Huge");
                assert!(reason.contains("only 1 follow"), "{}", reason);
            },
            other => panic!("unexpected diagnostics {:?}", other),
        }
        assert_eq!(tree.structs().count(), 0);
        let names: Vec<_> = tree.scalars().map(|s| (s.name.as_str(), s.number)).collect();
        assert_eq!(names, vec![("Id", 1), ("x", 2)]);
    }

    #[test]
    fn test_oversized_repeat_count_is_rejected() {
        let grid = header(
            "T",
            [&["repeated", "optional"], &["5", "int32"], &["", "V"], &["", ""]],
        );
        let mut tree = FieldDescriptorTree::new("T");
        let diagnostics = Classifier::default().classify(&grid, &mut tree).expect("classify");
        assert!(matches!(diagnostics.as_slice(), [Diagnostic::StructureMismatch { .. }]));
        assert_eq!(tree.repeats().count(), 0);
        assert_eq!(tree.scalars().next().map(|s| s.name.as_str()), Some("V"));
    }

    #[test]
    fn test_invalid_numeric_default_is_dropped() {
        let grid = header(
            "T",
            [&["optional", "optional"], &["int32", "string"], &["Count=abc", "Tag=abc"], &["", ""]],
        );
        let mut tree = FieldDescriptorTree::new("T");
        let diagnostics = Classifier::default().classify(&grid, &mut tree).expect("classify");
        assert_eq!(
            diagnostics,
            vec![Diagnostic::InvalidDefault {
                field: "Count".into(),
                ty: ScalarType::Int32,
                default: "abc".into(),
            }]
        );
        let defaults: Vec<_> = tree.scalars().map(|f| (f.name.as_str(), f.default.as_str())).collect();
        assert_eq!(defaults, vec![("Count", "0"), ("Tag", "abc")]);
    }

    #[test]
    fn test_non_numeric_repeat_count() {
        let grid = header(
            "T",
            [&["repeated", "optional"], &["many", "int32"], &["", "V"], &["", ""]],
        );
        let mut tree = FieldDescriptorTree::new("T");
        let diagnostics = Classifier::default().classify(&grid, &mut tree).expect("classify");
        assert_eq!(diagnostics, vec![Diagnostic::EmptyRepeat { column: 0 }]);
        assert_eq!(tree.repeats().count(), 0);
        assert_eq!(tree.scalars().next().map(|s| s.number), Some(1));
    }

    #[test]
    fn test_standalone_struct() {
        let grid = header(
            "T",
            [
                &["optional_struct", "optional", "optional", "optional"],
                &["2", "int32", "int32", "int32"],
                &["Pos", "x", "y", "Z"],
                &["", "", "", ""],
            ],
        );

        let mut ignored = FieldDescriptorTree::new("T");
        let diagnostics = Classifier::default().classify(&grid, &mut ignored).expect("classify");
        assert_eq!(
            diagnostics,
            vec![Diagnostic::StandaloneStruct { column: 0, name: "Pos".into() }]
        );
        assert_eq!(ignored.structs().count(), 0);
        assert_eq!(ignored.scalars().map(|s| s.name.as_str()).collect::<Vec<_>>(), vec!["Z"]);

        let mut kept = FieldDescriptorTree::new("T");
        let classifier = Classifier::new(ClassifyOptions::default().with_standalone_structs(true));
        let diagnostics = classifier.classify(&grid, &mut kept).expect("classify");
        assert!(diagnostics.is_empty());
        let pos = kept.structs().next().expect("struct");
        assert_eq!((pos.number, pos.width, pos.fields.len()), (1, 2, 2));
        assert_eq!(kept.scalars().next().map(|s| s.number), Some(2));
    }

    #[test]
    fn test_unknown_type_and_unnamed_columns() {
        let grid = header(
            "T",
            [
                &["optional", "optional", "optional"],
                &["bool", "int32", "int32"],
                &["Flag", "", "Ok"],
                &["", "", ""],
            ],
        );
        let mut tree = FieldDescriptorTree::new("T");
        let diagnostics = Classifier::default().classify(&grid, &mut tree).expect("classify");
        assert_eq!(
            diagnostics,
            vec![
                Diagnostic::UnknownType { column: 0, declared: "bool".into() },
                Diagnostic::UnnamedField { column: 1 },
            ]
        );
        assert_eq!(tree.scalars().map(|s| (s.name.as_str(), s.number)).collect::<Vec<_>>(), vec![("Ok", 1)]);
    }

    #[test]
    fn test_scalar_inside_struct_repeat_closes_scope() {
        let grid = header(
            "T",
            [
                &["repeated", "optional_struct", "optional", "optional"],
                &["2", "1", "int32", "string"],
                &["", "P", "x", "Tail"],
                &["", "", "", ""],
            ],
        );
        let mut tree = FieldDescriptorTree::new("T");
        let diagnostics = Classifier::default().classify(&grid, &mut tree).expect("classify");
        assert!(matches!(diagnostics.as_slice(), [Diagnostic::StructureMismatch { .. }]));
        assert_eq!(tree.repeats().next().map(|r| r.number), Some(1));
        assert_eq!(tree.scalars().next().map(|s| (s.name.as_str(), s.number)), Some(("Tail", 2)));
    }
}
