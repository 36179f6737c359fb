//! Built-in value types: the dynamic type tag, the operator table, and the
//! member sets that composite values carry from construction.

pub mod binop_registry;
pub mod color;
pub mod list;
pub mod vector2;

/// Dynamic type of an Item, as determined by its State.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Undefined,
    Integer,
    Real,
    Boolean,
    String,
    List,
    Object,
    Function,
    Reference,
    Color,
    Vector2,
    Host,
}

impl TypeTag {
    pub const ALL: [TypeTag; 12] = [
        TypeTag::Undefined,
        TypeTag::Integer,
        TypeTag::Real,
        TypeTag::Boolean,
        TypeTag::String,
        TypeTag::List,
        TypeTag::Object,
        TypeTag::Function,
        TypeTag::Reference,
        TypeTag::Color,
        TypeTag::Vector2,
        TypeTag::Host,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Undefined => "undefined",
            TypeTag::Integer   => "integer",
            TypeTag::Real      => "real",
            TypeTag::Boolean   => "boolean",
            TypeTag::String    => "string",
            TypeTag::List      => "list",
            TypeTag::Object    => "object",
            TypeTag::Function  => "function",
            TypeTag::Reference => "reference",
            TypeTag::Color     => "color",
            TypeTag::Vector2   => "vector2",
            TypeTag::Host      => "host",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, TypeTag::Integer | TypeTag::Real)
    }

    /// Values of these types are aliased, never copied, when assigned or
    /// passed as arguments.
    pub fn has_reference_semantics(self) -> bool {
        matches!(self, TypeTag::List | TypeTag::Object | TypeTag::Host)
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
