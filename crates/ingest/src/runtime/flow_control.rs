use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::IngestError;
use crate::types::RuntimeConfig;

#[derive(Debug, Clone)]
pub struct FlowControlConfig {
    pub channel_capacity: usize,
    pub max_in_flight: usize,
}

impl Default for FlowControlConfig {
    fn default() -> Self {
        Self::from(&RuntimeConfig::default())
    }
}

impl From<&RuntimeConfig> for FlowControlConfig {
    fn from(value: &RuntimeConfig) -> Self {
        Self {
            channel_capacity: value.kernel_channel_capacity,
            max_in_flight: value.max_in_flight,
        }
    }
}

#[derive(Clone)]
pub struct FlowController {
    in_flight: Arc<Semaphore>,
    max_in_flight: usize,
    channel_capacity: usize,
}

impl FlowController {
    pub fn new(config: &FlowControlConfig) -> Self {
        let max_in_flight = config.max_in_flight.max(1);
        Self {
            in_flight: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
            channel_capacity: config.channel_capacity.max(1),
        }
    }

    pub async fn acquire_in_flight(&self) -> Result<OwnedSemaphorePermit, IngestError> {
        self.in_flight
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| IngestError::Execution("in-flight flow controller closed".to_string()))
    }

    pub fn in_flight(&self) -> usize {
        self.max_in_flight - self.in_flight.available_permits()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn permits_are_returned_on_drop() {
        let flow = FlowController::new(&FlowControlConfig {
            channel_capacity: 1,
            max_in_flight: 2,
        });

        let first = flow.acquire_in_flight().await.expect("permit");
        let _second = flow.acquire_in_flight().await.expect("permit");
        assert_eq!(flow.in_flight(), 2);

        drop(first);
        assert_eq!(flow.in_flight(), 1);
    }

    #[test]
    fn zero_limits_are_clamped() {
        let flow = FlowController::new(&FlowControlConfig {
            channel_capacity: 0,
            max_in_flight: 0,
        });
        assert_eq!(flow.max_in_flight(), 1);
        assert_eq!(flow.channel_capacity(), 1);
    }
}
