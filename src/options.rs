//! Configuration shared by the builder, parser and dumper.

/// What to do with the gap left when a compound header turns out narrower
/// than the space reserved for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaddingBehavior {
    /// Shift the payload whenever a gap exists.
    Flexible,
    /// Always shift the payload; never emit padding bytes.
    NoPadding,
    /// Keep the reserved header size and zero-fill the gap wherever the
    /// layout tolerates it.
    #[default]
    UsePadding,
}

/// What the JSON dumper does with value types that have no JSON form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnsupportedTypeBehavior {
    /// Fail with `NoJsonEquivalent`.
    #[default]
    FailOnUnsupported,
    /// Emit `null` in place of the value.
    NullifyUnsupported,
    /// Emit a best-effort substitute (dates as integers, otherwise a
    /// string naming the type).
    ConvertUnsupported,
}

/// Options recognised by the core.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Sort object index tables by raw key bytes.
    pub sort_attribute_names: bool,

    /// Reject duplicate object keys when a compound is closed.
    pub check_attribute_uniqueness: bool,

    /// Emit arrays without an index table when all members have the same
    /// byte size.
    pub build_unindexed_arrays: bool,

    /// Emit objects in the compact, unsorted, unindexed form.
    pub build_unindexed_objects: bool,

    /// Leave the outermost compound open after parsing so callers can
    /// append to it.
    pub keep_top_level_open: bool,

    /// Header gap handling, see [`PaddingBehavior`].
    pub padding_behavior: PaddingBehavior,

    /// Emit `\uXXXX` escapes instead of raw UTF-8 when dumping.
    pub escape_unicode: bool,

    /// Emit `\/` for forward slashes when dumping.
    pub escape_forward_slashes: bool,

    /// Dump behavior for types without a JSON equivalent.
    pub unsupported_type_behavior: UnsupportedTypeBehavior,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            sort_attribute_names: true,
            check_attribute_uniqueness: false,
            build_unindexed_arrays: false,
            build_unindexed_objects: false,
            keep_top_level_open: false,
            padding_behavior: PaddingBehavior::default(),
            escape_unicode: false,
            escape_forward_slashes: false,
            unsupported_type_behavior: UnsupportedTypeBehavior::default(),
        }
    }
}
