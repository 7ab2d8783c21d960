use tokio::select;
use tokio_util::sync::CancellationToken;

/// Trips the token when the process receives Ctrl-C, so an interrupt unwinds
/// the session wait loop instead of killing the process. Run this alongside a
/// session and drop it once the session is over.
pub async fn cancel_on_ctrl_c(cancellation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancellation.cancel();
        },
    };
}
