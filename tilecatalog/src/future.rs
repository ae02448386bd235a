//! Callback-or-future result delivery for async operations.
//!
//! Every public async operation returns a [`PendingRequest`]: a handle
//! carrying the operation's cancellation token and a future for the
//! result. A single completion path feeds both the optional callback
//! and the future, so the result is delivered exactly once — if
//! cancellation wins the race the result is `Cancelled`, and if a
//! response wins, cancelling afterwards is a no-op.

use crate::error::ApiError;
use std::future::Future;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Callback invoked with the operation result.
pub type ResponseCallback<T> = Box<dyn FnOnce(Result<T, ApiError>) + Send + 'static>;

/// Handle to an in-flight operation.
pub struct PendingRequest<T> {
    token: CancellationToken,
    receiver: oneshot::Receiver<Result<T, ApiError>>,
}

impl<T> PendingRequest<T> {
    /// Requests cancellation of the operation.
    ///
    /// In-flight network requests abort at their next suspension point
    /// and the result resolves to a cancellation error, unless the
    /// operation already completed.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns the operation's cancellation token.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Waits for the operation result.
    pub async fn wait(self) -> Result<T, ApiError> {
        self.receiver
            .await
            .unwrap_or_else(|_| Err(ApiError::cancelled()))
    }
}

/// Spawns an operation and wires its single completion path.
///
/// `make` receives the child cancellation token to thread through the
/// operation's suspension points.
pub(crate) fn spawn_operation<T, F, Fut>(
    callback: Option<ResponseCallback<T>>,
    make: F,
) -> PendingRequest<T>
where
    T: Clone + Send + 'static,
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
{
    let token = CancellationToken::new();
    let (sender, receiver) = oneshot::channel();
    let future = make(token.clone());
    let task_token = token.clone();
    tokio::spawn(async move {
        let result = tokio::select! {
            _ = task_token.cancelled() => Err(ApiError::cancelled()),
            result = future => result,
        };
        if let Some(callback) = callback {
            callback(result.clone());
        }
        let _ = sender.send(result);
    });
    PendingRequest { token, receiver }
}
