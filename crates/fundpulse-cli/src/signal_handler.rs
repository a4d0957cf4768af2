//! Ctrl+C handling

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Cancel `token` on the first Ctrl+C. The task ends with the token.
pub fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => {
                    info!("Interrupted, cancelling stream");
                    token.cancel();
                }
                Err(e) => warn!(error = %e, "Could not listen for Ctrl+C"),
            },
        }
    });
}
