//! Domain model construction from raw responses.

/// Carrier for fetched data, in both placeholder and populated form.
///
/// A model starts empty (the placeholder emitted while a request is
/// pending) and is populated from one raw response fragment. Single and
/// collection results use the same capability: a collection is each
/// fragment run through its own fresh instance.
///
/// # Example
///
/// ```
/// use storefetch_core::Model;
///
/// struct RawUser {
///     name: String,
/// }
///
/// #[derive(Default)]
/// struct User {
///     name: String,
/// }
///
/// impl Model for User {
///     type Raw = RawUser;
///
///     fn empty() -> Self {
///         Self::default()
///     }
///
///     fn fill(mut self, raw: RawUser) -> Self {
///         self.name = raw.name;
///         self
///     }
/// }
///
/// let user = User::empty().fill(RawUser { name: "ada".into() });
/// assert_eq!(user.name, "ada");
/// ```
pub trait Model: Sized {
    /// Raw response fragment this model is populated from.
    type Raw;

    /// Fresh instance with placeholder contents.
    fn empty() -> Self;

    /// Populates this instance from `raw`, yielding the populated model.
    #[must_use]
    fn fill(self, raw: Self::Raw) -> Self;
}
