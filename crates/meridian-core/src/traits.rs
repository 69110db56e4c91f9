//! Core traits shared across layers.

/// A type that carries a stable, fully-qualified type identifier.
///
/// The identifier is written next to every cached payload so that a value
/// read back from a generically typed store can be rebuilt as its original
/// concrete type. Identifiers must be unique across the process and must not
/// change once values have been persisted under them.
pub trait TypeTagged {
    /// Fully-qualified type identifier, e.g. `meridian.domain.Employee`.
    const TYPE_TAG: &'static str;
}

impl TypeTagged for String {
    const TYPE_TAG: &'static str = "std.String";
}

impl TypeTagged for i32 {
    const TYPE_TAG: &'static str = "std.i32";
}

impl TypeTagged for i64 {
    const TYPE_TAG: &'static str = "std.i64";
}

impl TypeTagged for bool {
    const TYPE_TAG: &'static str = "std.bool";
}
