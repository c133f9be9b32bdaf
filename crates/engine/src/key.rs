use std::fmt;

/// Stable identity of one open document for the lifetime of a session.
///
/// Identity equality, not path equality: renaming or moving the underlying
/// file must not change the key. The host allocates keys when a file opens
/// and retires them when it closes; the pipeline never derives keys from
/// paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileKey(pub u64);

impl fmt::Display for FileKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "doc#{}", self.0)
	}
}
