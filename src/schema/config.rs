/// Configuration for schema rendering.
///
/// # Examples
///
/// ```rust
/// use sheet2pb::schema::{Dialect, SchemaOptions};
///
/// let options = SchemaOptions::new()
///     .with_package("Game")
///     .with_dialect(Dialect::Modern);
/// assert_eq!(options.dialect.syntax(), "proto3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaOptions {
    /// Package declared at the top of every schema file
    pub package: String,
    /// Syntax flavour of the generated text
    pub dialect: Dialect,
}

/// Schema syntax flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// `proto2`: field labels and `[default = ...]` annotations
    #[default]
    Legacy,
    /// `proto3`: no labels on scalars, no defaults
    Modern,
}

impl Dialect {
    /// Pick the dialect from a "use proto3" switch.
    pub fn from_proto3(proto3: bool) -> Self {
        if proto3 { Dialect::Modern } else { Dialect::Legacy }
    }

    /// Value of the `syntax` statement.
    pub fn syntax(self) -> &'static str {
        match self {
            Dialect::Legacy => "proto2",
            Dialect::Modern => "proto3",
        }
    }
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            package: "ProtobufGen".to_string(),
            dialect: Dialect::Legacy,
        }
    }
}

impl SchemaOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the package name.
    #[inline]
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    /// Set the syntax flavour.
    #[inline]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }
}
