//! Shared preconditions: tube selection and reservation confirmation

use tracing::{debug, instrument};

use crate::application::error_ext::classify_error;
use crate::application::{ApplicationError, ApplicationResult, ClientResultExt};
use crate::domain::{Job, JobId, JobState, TubeName, TubeSelector};
use crate::infrastructure::traits::{ClientError, QueueClient};

/// Switch the session to `tube`. `None` keeps the current tube.
pub fn select_tube(client: &mut dyn QueueClient, tube: Option<&TubeName>) -> ApplicationResult<()> {
    match tube {
        Some(tube) => client.use_tube(tube).classify(&format!("tube {tube}")),
        None => Ok(()),
    }
}

/// Watch exactly the selected tubes. The default selector leaves the
/// session's watch list alone.
pub fn watch_tubes(client: &mut dyn QueueClient, tubes: &TubeSelector) -> ApplicationResult<()> {
    if tubes.is_default() {
        return Ok(());
    }
    client.watch_only(tubes.tubes()).classify("watch tubes")
}

/// Make sure this session holds the reservation on `id` before mutating it.
///
/// Reserves the job by id. When the server refuses, one read-only
/// `stats-job` tells a job held elsewhere (`NotReserved`) from a missing one
/// (`NotFound`). Advisory only: another session may act between this check
/// and the mutating call.
#[instrument(skip(client))]
pub fn confirm_reservation(client: &mut dyn QueueClient, id: JobId) -> ApplicationResult<Job> {
    match client.reserve_job(id) {
        Ok(job) => Ok(job),
        Err(ClientError::NotFound) => Err(attribute_refusal(client, id)),
        Err(e) => Err(classify_error(e, &format!("job {id}"))),
    }
}

fn attribute_refusal(client: &mut dyn QueueClient, id: JobId) -> ApplicationError {
    match client.stats_job(id) {
        Ok(stats) => {
            let state = stats.get("state").and_then(|s| s.parse::<JobState>().ok());
            debug!("job {} exists in state {:?} but cannot be reserved", id, state);
            ApplicationError::NotReserved(id)
        }
        Err(ClientError::NotFound) => ApplicationError::NotFound(format!("job {id}")),
        Err(e) => classify_error(e, &format!("job {id}")),
    }
}
