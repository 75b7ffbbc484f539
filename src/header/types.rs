//! Field descriptors produced by header classification.

use std::fmt;

use crate::codec::ScalarType;

/// Attribute of a scalar column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Required,
    Optional,
    /// Optional on the wire, but every non-blank value must be distinct.
    Unique,
}

impl FieldKind {
    /// Parse the attribute row text of a scalar column.
    pub fn parse(attr: &str) -> Option<Self> {
        match attr {
            "required" => Some(FieldKind::Required),
            "optional" => Some(FieldKind::Optional),
            "unique" => Some(FieldKind::Unique),
            _ => None,
        }
    }

    /// Label keyword in legacy schema text.
    pub fn label(self) -> &'static str {
        match self {
            FieldKind::Required => "required",
            FieldKind::Optional | FieldKind::Unique => "optional",
        }
    }
}

/// A single typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    pub name: String,
    pub ty: ScalarType,
    pub kind: FieldKind,
    /// Source column in the current sheet, `None` when absent.
    pub column: Option<usize>,
    /// Default literal without schema quoting.
    pub default: String,
    pub comment: String,
    pub number: u32,
}

impl ScalarField {
    /// Create an unnumbered field with the type's zero default.
    pub fn new(name: impl Into<String>, ty: ScalarType, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            ty,
            kind,
            column: None,
            default: ty.zero_default().to_string(),
            comment: String::new(),
            number: 0,
        }
    }

    /// Builder: set the source column.
    pub fn at(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }

    /// Builder: set the comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Builder: set the default literal.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }

    /// Whether values of this field must be unique across an artifact.
    #[inline]
    pub fn is_unique(&self) -> bool {
        self.kind == FieldKind::Unique
    }
}

/// An embedded sub-message with a fixed number of scalar children.
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: String,
    pub comment: String,
    /// Declared field count.
    pub width: usize,
    /// Children, numbered 1..=n inside the struct.
    pub fields: Vec<ScalarField>,
    /// Column of the `optional_struct` marker, `None` when absent.
    pub column: Option<usize>,
    pub number: u32,
}

impl StructField {
    /// Create an empty, unnumbered struct.
    pub fn new(name: impl Into<String>, width: usize) -> Self {
        Self {
            name: name.into(),
            comment: String::new(),
            width,
            fields: Vec::new(),
            column: None,
            number: 0,
        }
    }

    /// Builder: append a child, numbering it after the existing ones.
    pub fn with_field(mut self, mut field: ScalarField) -> Self {
        field.number = self.fields.len() as u32 + 1;
        self.fields.push(field);
        self
    }
}

/// Element template of a repeated group.
#[derive(Debug, Clone, PartialEq)]
pub enum RepeatedElement {
    Scalar(ScalarField),
    Struct(StructField),
}

impl RepeatedElement {
    pub fn name(&self) -> &str {
        match self {
            RepeatedElement::Scalar(f) => &f.name,
            RepeatedElement::Struct(s) => &s.name,
        }
    }

    pub fn comment(&self) -> &str {
        match self {
            RepeatedElement::Scalar(f) => &f.comment,
            RepeatedElement::Struct(s) => &s.comment,
        }
    }
}

/// A fixed-count array of scalars or structs.
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatedField {
    /// Declared maximum number of replicas.
    pub max_count: usize,
    /// Column holding the per-row replica count, `None` when absent.
    pub column: Option<usize>,
    pub element: RepeatedElement,
    pub number: u32,
}

impl RepeatedField {
    pub fn new(max_count: usize, element: RepeatedElement) -> Self {
        Self {
            max_count,
            column: None,
            element,
            number: 0,
        }
    }

    /// Builder: set the count column.
    pub fn at(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }

    pub fn name(&self) -> &str {
        self.element.name()
    }

    pub fn comment(&self) -> &str {
        self.element.comment()
    }

    /// Width of the struct template, `None` for scalar repeats.
    pub fn struct_width(&self) -> Option<usize> {
        match &self.element {
            RepeatedElement::Scalar(_) => None,
            RepeatedElement::Struct(s) => Some(s.width),
        }
    }
}

/// One top-level field of a table message.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDescriptor {
    Scalar(ScalarField),
    Struct(StructField),
    Repeated(RepeatedField),
}

impl FieldDescriptor {
    pub fn name(&self) -> &str {
        match self {
            FieldDescriptor::Scalar(f) => &f.name,
            FieldDescriptor::Struct(s) => &s.name,
            FieldDescriptor::Repeated(r) => r.name(),
        }
    }

    pub fn number(&self) -> u32 {
        match self {
            FieldDescriptor::Scalar(f) => f.number,
            FieldDescriptor::Struct(s) => s.number,
            FieldDescriptor::Repeated(r) => r.number,
        }
    }

    /// Short kind label used in diagnostics.
    pub fn kind_label(&self) -> &'static str {
        match self {
            FieldDescriptor::Scalar(_) => "scalar",
            FieldDescriptor::Struct(_) => "struct",
            FieldDescriptor::Repeated(_) => "repeated",
        }
    }
}

/// A recoverable condition found while classifying a header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A field was redeclared with an incompatible shape; the new
    /// definition was skipped.
    StructureMismatch { field: String, reason: String },
    /// A merged sheet gives a field a different default literal.
    DefaultMismatch {
        field: String,
        previous: String,
        current: String,
    },
    /// A default literal that is not a value of the field's type; the zero
    /// default is used instead.
    InvalidDefault {
        field: String,
        ty: ScalarType,
        default: String,
    },
    /// A column has an attribute but no identifier.
    UnnamedField { column: usize },
    /// A column declares a type outside the supported set.
    UnknownType { column: usize, declared: String },
    /// A repeated group declared no replicas or no element.
    EmptyRepeat { column: usize },
    /// An `optional_struct` outside any repeated group.
    StandaloneStruct { column: usize, name: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::StructureMismatch { field, reason } => {
                write!(f, "field {} rejected: {}", field, reason)
            },
            Diagnostic::DefaultMismatch {
                field,
                previous,
                current,
            } => write!(
                f,
                "field {} default value {:?} differs from others {:?}",
                field, current, previous
            ),
            Diagnostic::InvalidDefault { field, ty, default } => write!(
                f,
                "field {} default {:?} is not a valid {}, using {:?}",
                field,
                default,
                ty,
                ty.zero_default()
            ),
            Diagnostic::UnnamedField { column } => write!(f, "column {} has no name", column),
            Diagnostic::UnknownType { column, declared } => {
                write!(f, "column {} has unknown type {:?}", column, declared)
            },
            Diagnostic::EmptyRepeat { column } => {
                write!(f, "repeated group at column {} is empty", column)
            },
            Diagnostic::StandaloneStruct { column, name } => write!(
                f,
                "optional_struct {} at column {} is not inside a repeated group",
                name, column
            ),
        }
    }
}
