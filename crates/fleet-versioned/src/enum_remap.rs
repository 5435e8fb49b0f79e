use std::fmt::Display;

use snafu::{OptionExt as _, Snafu, ensure};
use strum::VariantArray;

/// The direction of a conversion between an older and a newer version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    /// Older to newer.
    Upgrade,

    /// Newer to older.
    Downgrade,
}

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum EnumRemapError {
    #[snafu(display(
        "{enum_name} value {value:?} has no counterpart when converting in the {direction} direction"
    ))]
    Unmappable {
        enum_name: &'static str,
        value: String,
        direction: Direction,
    },
}

/// Violations of the contract an [`EnumRemap::TABLE`] must uphold.
#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum RemapTableError {
    #[snafu(display("older {enum_name} value {value:?} has no image in the newer version"))]
    MissingImage {
        enum_name: &'static str,
        value: String,
    },

    #[snafu(display("older {enum_name} value {value:?} is listed {count} times"))]
    AmbiguousImage {
        enum_name: &'static str,
        value: String,
        count: usize,
    },

    #[snafu(display("newer {enum_name} value {value:?} is the image of {count} older values"))]
    AmbiguousPreimage {
        enum_name: &'static str,
        value: String,
        count: usize,
    },
}

/// A fixed, explicit bidirectional table between the value spaces of one enum in an older
/// version (`Self`) and a newer version ([`EnumRemap::Newer`]).
///
/// The newer value space is a superset of the older one: every older value has exactly one image.
/// Newer values without an entry cannot be expressed in the older schema and fail to
/// [downgrade](EnumRemap::downgrade) instead of being coerced into some default.
///
/// ```
/// # use fleet_versioned::{EnumRemap, EnumRemapError};
/// #[derive(Clone, Copy, Debug, PartialEq, strum::Display)]
/// enum OldPolicy { Always, Never }
///
/// #[derive(Clone, Copy, Debug, PartialEq, strum::Display)]
/// enum NewPolicy { Always, Never, OnFailure }
///
/// impl EnumRemap for OldPolicy {
///     type Newer = NewPolicy;
///
///     const ENUM_NAME: &'static str = "Policy";
///     const TABLE: &'static [(Self, Self::Newer)] = &[
///         (OldPolicy::Always, NewPolicy::Always),
///         (OldPolicy::Never, NewPolicy::Never),
///     ];
/// }
///
/// assert_eq!(OldPolicy::Never.upgrade(), Ok(NewPolicy::Never));
/// assert!(matches!(
///     OldPolicy::downgrade(NewPolicy::OnFailure),
///     Err(EnumRemapError::Unmappable { .. })
/// ));
/// ```
pub trait EnumRemap: Copy + PartialEq + Display + 'static {
    type Newer: Copy + PartialEq + Display + 'static;

    /// The name used in error messages, usually the (version-less) type name.
    const ENUM_NAME: &'static str;

    /// Pairs of `(older, newer)` values.
    const TABLE: &'static [(Self, Self::Newer)];

    fn upgrade(self) -> Result<Self::Newer, EnumRemapError> {
        Self::TABLE
            .iter()
            .find(|(older, _)| *older == self)
            .map(|(_, newer)| *newer)
            .with_context(|| UnmappableSnafu {
                enum_name: Self::ENUM_NAME,
                value: self.to_string(),
                direction: Direction::Upgrade,
            })
    }

    fn downgrade(newer: Self::Newer) -> Result<Self, EnumRemapError> {
        Self::TABLE
            .iter()
            .find(|(_, candidate)| *candidate == newer)
            .map(|(older, _)| *older)
            .with_context(|| UnmappableSnafu {
                enum_name: Self::ENUM_NAME,
                value: newer.to_string(),
                direction: Direction::Downgrade,
            })
    }
}

/// Checks that the [`EnumRemap::TABLE`] of `T` maps every older value to exactly one newer
/// value, and that no newer value is the image of more than one older value.
///
/// An [`EnumRemap`] which passes this check can always [upgrade](EnumRemap::upgrade).
pub fn validate_remap_table<T>() -> Result<(), RemapTableError>
where
    T: EnumRemap + VariantArray,
    T::Newer: VariantArray,
{
    for older in T::VARIANTS {
        let count = T::TABLE.iter().filter(|(o, _)| o == older).count();

        ensure!(count != 0, MissingImageSnafu {
            enum_name: T::ENUM_NAME,
            value: older.to_string(),
        });
        ensure!(count == 1, AmbiguousImageSnafu {
            enum_name: T::ENUM_NAME,
            value: older.to_string(),
            count,
        });
    }

    for newer in T::Newer::VARIANTS {
        let count = T::TABLE.iter().filter(|(_, n)| n == newer).count();

        ensure!(count <= 1, AmbiguousPreimageSnafu {
            enum_name: T::ENUM_NAME,
            value: newer.to_string(),
            count,
        });
    }

    Ok(())
}
