//! # Wordpress Operator
//!
//! Entry point: initialize the runtime, then run the watch loop until shutdown.

use anyhow::Result;
use wordpress_operator::runtime::{initialize, run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;

    run_watch_loop(
        init.client,
        init.reconciler,
        init.server_state,
        init.controller_config,
    )
    .await
}
