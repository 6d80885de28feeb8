//! Service container for dependency injection
//!
//! Wires settings and one live queue session together.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::application::services::dispatcher::dispatch;
use crate::application::ApplicationError;
use crate::config::Settings;
use crate::domain::{CommandRequest, CommandResult};
use crate::infrastructure::connection::{connect, Address};
use crate::infrastructure::traits::QueueClient;
use crate::infrastructure::InfraResult;

/// Container holding the settings and the session for one invocation.
///
/// Owns the queue session; dropping the container closes it exactly once.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Queue client capability
    client: Box<dyn QueueClient>,
}

impl ServiceContainer {
    /// Connect to the configured address with the real beanstalkd client.
    pub fn connect(settings: Settings) -> InfraResult<Self> {
        let address = Address::parse(&settings.address)?;
        let timeout = match settings.connect_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let client = connect(&address, timeout)?;
        Ok(Self::with_client(settings, Box::new(client)))
    }

    /// Create a container around an existing client (for testing).
    pub fn with_client(settings: Settings, client: Box<dyn QueueClient>) -> Self {
        Self {
            settings: Arc::new(settings),
            client,
        }
    }

    /// Run one command against the session.
    ///
    /// Nothing is retried. A transport failure during a mutating command
    /// leaves its outcome unknown, which is logged before the error returns.
    pub fn execute(&mut self, request: CommandRequest) -> InfraResult<CommandResult> {
        let name = request.name();
        let mutating = request.is_mutating();
        debug!("execute: {}", name);
        match dispatch(request, self.client.as_mut()) {
            Err(e @ ApplicationError::Transport { .. }) if mutating => {
                warn!("{name} may or may not have been applied: {e}");
                Err(e.into())
            }
            result => Ok(result?),
        }
    }
}
