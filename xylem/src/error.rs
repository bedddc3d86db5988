use thiserror::Error;

/// Failures reported by [`SerialRuntimeRef`](`crate::runtime::SerialRuntimeRef`) methods.
///
/// Neither is a data error: Both indicate how the runtime was used (or torn down).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[non_exhaustive]
pub enum SerialError {
	/// A blocking call was made from inside a job running on the same runtime.
	///
	/// Waiting for the queue there would deadlock, so the call is rejected instead.
	#[error("called a blocking method from inside a job of the same serial runtime")]
	Reentrant,
	/// The job was dropped before it returned a result.
	///
	/// This happens when the runtime is dropped while the job is still queued, or when the job panics.
	#[error("the job was dropped before it completed")]
	Dropped,
}
