/// Stored outcome of one memoized call.
///
/// A cache holds either the value the callable returned or, when failure
/// caching is enabled, the failure it raised. Both are handed back verbatim
/// on every hit until the entry is evicted.
///
/// # Type Parameters
///
/// * `T` - The success value type
/// * `E` - The failure type
///
/// # Examples
///
/// ```
/// use memoria_core::CacheEntry;
///
/// let entry: CacheEntry<i32, String> = CacheEntry::from_result(&Ok(42));
/// assert!(!entry.is_failure());
/// assert_eq!(entry.to_result(), Ok(42));
///
/// let entry: CacheEntry<i32, String> = CacheEntry::from_result(&Err("boom".to_string()));
/// assert!(entry.is_failure());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheEntry<T, E> {
    Success(T),
    Failure(E),
}

impl<T: Clone, E: Clone> CacheEntry<T, E> {
    /// Captures a call's outcome.
    pub fn from_result(result: &Result<T, E>) -> Self {
        match result {
            Ok(value) => CacheEntry::Success(value.clone()),
            Err(failure) => CacheEntry::Failure(failure.clone()),
        }
    }

    /// Replays the stored outcome.
    pub fn to_result(&self) -> Result<T, E> {
        match self {
            CacheEntry::Success(value) => Ok(value.clone()),
            CacheEntry::Failure(failure) => Err(failure.clone()),
        }
    }
}

impl<T, E> CacheEntry<T, E> {
    pub fn is_failure(&self) -> bool {
        matches!(self, CacheEntry::Failure(_))
    }
}
