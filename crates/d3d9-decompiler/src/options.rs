/// Options fixed for the lifetime of a [`RegisterState`](crate::RegisterState).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Matrix constants are laid out one register per column.
    ///
    /// Column-major references to a multi-register constant render as `transpose(M)[col]`;
    /// row-major references render as `M[row]`.
    pub column_major: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self { column_major: true }
    }
}
