/// A key and the payload handle stored under it.
///
/// The payload is an opaque, non-owning handle: a tree copies it in and out but never
/// looks behind it, so any `Copy` type works (a shared reference, an index, an id).
///
/// # Examples
///
/// ```
/// use balanced_maps::KeyValueRef;
///
/// let names = ["zero", "one", "two"];
/// let entry = KeyValueRef::new(2, &names[2]);
/// assert_eq!(entry.key, 2);
/// assert_eq!(*entry.payload, "two");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct KeyValueRef<P> {
    /// The key the entry is ordered by.
    pub key: u32,
    /// The handle returned by lookups of `key`.
    pub payload: P,
}

impl<P> KeyValueRef<P> {
    /// Pairs `key` with `payload`.
    #[must_use]
    pub const fn new(key: u32, payload: P) -> Self {
        Self { key, payload }
    }
}

impl<P> From<(u32, P)> for KeyValueRef<P> {
    fn from((key, payload): (u32, P)) -> Self {
        Self { key, payload }
    }
}
