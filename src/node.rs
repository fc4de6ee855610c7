use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;
use tracing::info;

/// A controller process driven by the simulator's step loop.
#[async_trait]
pub trait Node: Send {
    fn name(&self) -> &str;

    async fn init(&mut self) -> Result<()>;

    /// Steps the world until it shuts down or the drop signal arrives.
    async fn run(&mut self) -> Result<()>;
}

/// True once a drop signal was broadcast. A closed channel is not a signal.
pub fn drop_requested(drop_rx: &mut Receiver<()>) -> bool {
    match drop_rx.try_recv() {
        Ok(()) | Err(TryRecvError::Lagged(_)) => true,
        Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => false,
    }
}

pub async fn execute_node(node: &mut dyn Node) -> Result<()> {
    info!(node = node.name(), "Initializing");
    node.init().await?;

    info!(node = node.name(), "Running");
    node.run().await?;

    info!(node = node.name(), "Stopped");
    Ok(())
}
