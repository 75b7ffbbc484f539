//! The per-artifact field table.

use std::collections::HashMap;

use super::types::{
    Diagnostic, FieldDescriptor, RepeatedElement, RepeatedField, ScalarField, StructField,
};

/// Ordered field definitions of one artifact.
///
/// Field numbers are allocated once, starting at 1, and survive every later
/// classification pass over sheets merged into the same artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptorTree {
    name: String,
    fields: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
    next_number: u32,
}

impl FieldDescriptorTree {
    /// Create an empty tree for the artifact `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            index: HashMap::new(),
            next_number: 1,
        }
    }

    /// The artifact (message) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All fields in definition order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a top-level field by name.
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// The number the next new field would receive.
    pub fn next_number(&self) -> u32 {
        self.next_number
    }

    /// Scalar fields in definition order.
    pub fn scalars(&self) -> impl Iterator<Item = &ScalarField> {
        self.fields.iter().filter_map(|f| match f {
            FieldDescriptor::Scalar(s) => Some(s),
            _ => None,
        })
    }

    /// Struct fields in definition order.
    pub fn structs(&self) -> impl Iterator<Item = &StructField> {
        self.fields.iter().filter_map(|f| match f {
            FieldDescriptor::Struct(s) => Some(s),
            _ => None,
        })
    }

    /// Repeated fields in definition order.
    pub fn repeats(&self) -> impl Iterator<Item = &RepeatedField> {
        self.fields.iter().filter_map(|f| match f {
            FieldDescriptor::Repeated(r) => Some(r),
            _ => None,
        })
    }

    /// Mark every field as absent from the current sheet.
    pub fn reset_columns(&mut self) {
        for field in &mut self.fields {
            match field {
                FieldDescriptor::Scalar(s) => s.column = None,
                FieldDescriptor::Struct(s) => reset_struct(s),
                FieldDescriptor::Repeated(r) => {
                    r.column = None;
                    match &mut r.element {
                        RepeatedElement::Scalar(s) => s.column = None,
                        RepeatedElement::Struct(s) => reset_struct(s),
                    }
                },
            }
        }
    }

    /// Define or update a scalar field. The field's `number` is assigned
    /// here and any value passed in is ignored.
    pub fn insert_scalar(&mut self, mut field: ScalarField) -> Option<Diagnostic> {
        let Some(&i) = self.index.get(&field.name) else {
            field.number = self.allocate();
            self.push(FieldDescriptor::Scalar(field));
            return None;
        };
        match &mut self.fields[i] {
            FieldDescriptor::Scalar(existing) => {
                let diagnostic = (existing.default != field.default).then(|| {
                    Diagnostic::DefaultMismatch {
                        field: field.name.clone(),
                        previous: existing.default.clone(),
                        current: field.default.clone(),
                    }
                });
                field.number = existing.number;
                *existing = field;
                diagnostic
            },
            other => Some(kind_changed(other, &field.name, "scalar")),
        }
    }

    /// Define or update a top-level struct field.
    pub fn insert_struct(&mut self, mut field: StructField) -> Option<Diagnostic> {
        let Some(&i) = self.index.get(&field.name) else {
            field.number = self.allocate();
            self.push(FieldDescriptor::Struct(field));
            return None;
        };
        match &mut self.fields[i] {
            FieldDescriptor::Struct(existing) => {
                if existing.width != field.width {
                    return Some(Diagnostic::StructureMismatch {
                        field: field.name,
                        reason: format!(
                            "struct width {} differs from earlier width {}",
                            field.width, existing.width
                        ),
                    });
                }
                field.number = existing.number;
                *existing = field;
                None
            },
            other => Some(kind_changed(other, &field.name, "struct")),
        }
    }

    /// Define or update a repeated field. A scalar element template takes
    /// the repeated field's number.
    pub fn insert_repeated(&mut self, mut field: RepeatedField) -> Option<Diagnostic> {
        let name = field.name().to_string();
        let Some(&i) = self.index.get(&name) else {
            field.number = self.allocate();
            number_element(&mut field);
            self.push(FieldDescriptor::Repeated(field));
            return None;
        };
        match &mut self.fields[i] {
            FieldDescriptor::Repeated(existing) => {
                if let Some(reason) = repeat_shape_change(existing, &field) {
                    return Some(Diagnostic::StructureMismatch { field: name, reason });
                }
                field.number = existing.number;
                number_element(&mut field);
                *existing = field;
                None
            },
            other => Some(kind_changed(other, &name, "repeated")),
        }
    }

    fn allocate(&mut self) -> u32 {
        let number = self.next_number;
        self.next_number += 1;
        number
    }

    fn push(&mut self, field: FieldDescriptor) {
        self.index.insert(field.name().to_string(), self.fields.len());
        self.fields.push(field);
    }
}

fn reset_struct(s: &mut StructField) {
    s.column = None;
    for child in &mut s.fields {
        child.column = None;
    }
}

fn number_element(field: &mut RepeatedField) {
    if let RepeatedElement::Scalar(s) = &mut field.element {
        s.number = field.number;
    }
}

fn kind_changed(existing: &FieldDescriptor, name: &str, requested: &str) -> Diagnostic {
    Diagnostic::StructureMismatch {
        field: name.to_string(),
        reason: format!(
            "redeclared as {} but already defined as {}",
            requested,
            existing.kind_label()
        ),
    }
}

fn repeat_shape_change(existing: &RepeatedField, field: &RepeatedField) -> Option<String> {
    if existing.max_count != field.max_count {
        return Some(format!(
            "repeat count {} differs from earlier count {}",
            field.max_count, existing.max_count
        ));
    }
    match (existing.struct_width(), field.struct_width()) {
        (None, None) => None,
        (Some(before), Some(now)) if before == now => None,
        (Some(before), Some(now)) => Some(format!(
            "struct width {} differs from earlier width {}",
            now, before
        )),
        _ => Some("element changed between scalar and struct".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ScalarType;
    use crate::header::types::FieldKind;

    fn scalar(name: &str) -> ScalarField {
        ScalarField::new(name, ScalarType::Int32, FieldKind::Optional)
    }

    #[test]
    fn test_numbers_allocated_in_order() {
        let mut tree = FieldDescriptorTree::new("Item");
        assert!(tree.insert_scalar(scalar("A").at(0)).is_none());
        assert!(tree.insert_struct(StructField::new("S", 0)).is_none());
        let rep = RepeatedField::new(2, RepeatedElement::Scalar(scalar("R")));
        assert!(tree.insert_repeated(rep).is_none());

        let numbers: Vec<_> = tree.fields().iter().map(|f| f.number()).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(tree.next_number(), 4);
        assert_eq!(tree.scalars().count(), 1);
        assert_eq!(tree.structs().count(), 1);
        match &tree.repeats().next().map(|r| &r.element) {
            Some(RepeatedElement::Scalar(s)) => assert_eq!(s.number, 3),
            other => panic!("unexpected element {:?}", other),
        }
    }

    #[test]
    fn test_redefinition_keeps_number() {
        let mut tree = FieldDescriptorTree::new("Item");
        tree.insert_scalar(scalar("A").at(0));
        tree.insert_scalar(scalar("B").at(1));

        let updated = ScalarField::new("A", ScalarType::Int64, FieldKind::Required)
            .at(5)
            .with_comment("moved");
        assert!(tree.insert_scalar(updated).is_none());

        match tree.get("A") {
            Some(FieldDescriptor::Scalar(s)) => {
                assert_eq!(s.number, 1);
                assert_eq!(s.column, Some(5));
                assert_eq!(s.ty, ScalarType::Int64);
                assert_eq!(s.comment, "moved");
            },
            other => panic!("unexpected field {:?}", other),
        }
        assert_eq!(tree.next_number(), 3);
    }

    #[test]
    fn test_default_mismatch_is_reported() {
        let mut tree = FieldDescriptorTree::new("Item");
        tree.insert_scalar(scalar("A").with_default("1"));
        let diagnostic = tree.insert_scalar(scalar("A").with_default("2"));
        assert_eq!(
            diagnostic,
            Some(Diagnostic::DefaultMismatch {
                field: "A".into(),
                previous: "1".into(),
                current: "2".into(),
            })
        );
    }

    #[test]
    fn test_kind_change_is_rejected() {
        let mut tree = FieldDescriptorTree::new("Item");
        tree.insert_scalar(scalar("A").at(0));
        let diagnostic = tree.insert_struct(StructField::new("A", 2));
        assert!(matches!(diagnostic, Some(Diagnostic::StructureMismatch { .. })));
        assert!(matches!(tree.get("A"), Some(FieldDescriptor::Scalar(_))));
    }

    #[test]
    fn test_repeat_count_change_is_rejected() {
        let mut tree = FieldDescriptorTree::new("Item");
        let first = RepeatedField::new(3, RepeatedElement::Scalar(scalar("R"))).at(0);
        tree.insert_repeated(first);
        let second = RepeatedField::new(4, RepeatedElement::Scalar(scalar("R"))).at(7);
        assert!(matches!(
            tree.insert_repeated(second),
            Some(Diagnostic::StructureMismatch { .. })
        ));
        let kept = tree.repeats().next().map(|r| (r.max_count, r.column));
        assert_eq!(kept, Some((3, Some(0))));
    }

    #[test]
    fn test_struct_width_fixed_at_first_definition() {
        let mut tree = FieldDescriptorTree::new("Item");
        let pos = StructField::new("Pos", 2).with_field(scalar("x")).with_field(scalar("y"));
        assert!(tree.insert_struct(pos).is_none());

        let wider = StructField::new("Pos", 3)
            .with_field(scalar("x"))
            .with_field(scalar("y"))
            .with_field(scalar("z"));
        match tree.insert_struct(wider) {
            Some(Diagnostic::StructureMismatch { field, reason }) => {
                assert_eq!(field, "Pos");
                assert!(reason.contains("width 3"), "{}", reason);
            },
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(tree.structs().next().map(|s| (s.width, s.fields.len())), Some((2, 2)));
    }

    #[test]
    fn test_repeated_struct_width_fixed_at_first_definition() {
        let mut tree = FieldDescriptorTree::new("Item");
        let template = StructField::new("Reward", 1).with_field(scalar("Id"));
        assert!(tree.insert_repeated(RepeatedField::new(2, RepeatedElement::Struct(template))).is_none());

        let wider = StructField::new("Reward", 2).with_field(scalar("Id")).with_field(scalar("Count"));
        assert!(matches!(
            tree.insert_repeated(RepeatedField::new(2, RepeatedElement::Struct(wider))),
            Some(Diagnostic::StructureMismatch { .. })
        ));
        assert_eq!(tree.repeats().next().and_then(RepeatedField::struct_width), Some(1));
    }

    #[test]
    fn test_reset_columns() {
        let mut tree = FieldDescriptorTree::new("Item");
        tree.insert_scalar(scalar("A").at(0));
        let mut s = StructField::new("P", 1).with_field(scalar("x").at(3));
        s.column = Some(2);
        tree.insert_repeated(RepeatedField::new(1, RepeatedElement::Struct(s)).at(1));

        tree.reset_columns();
        assert!(tree.scalars().all(|s| s.column.is_none()));
        let rep = tree.repeats().next().map(|r| (r.column, r.element.clone()));
        match rep {
            Some((None, RepeatedElement::Struct(s))) => {
                assert!(s.column.is_none());
                assert!(s.fields.iter().all(|c| c.column.is_none()));
            },
            other => panic!("unexpected repeat {:?}", other),
        }
    }
}
