/// Conversion contract between a spoke version (`Self`) and the hub version `H`.
///
/// The hub is the storage version of a resource. Every spoke converts into the hub and back, so
/// a conversion between two spokes is always `from_hub(to_hub(object))`. Adding a version only
/// requires one new implementation of this trait.
pub trait Convertible<H>: Sized {
    /// Parameters which influence the conversion, like precedence rules.
    type Options: ?Sized;
    type Error;

    fn to_hub(self, options: &Self::Options) -> Result<H, Self::Error>;

    fn from_hub(hub: H, options: &Self::Options) -> Result<Self, Self::Error>;
}
