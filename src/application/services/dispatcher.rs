//! Dispatcher: routes a request through its preconditions to its handler

use tracing::info;

use crate::application::services::mapper::CommandMapper;
use crate::application::services::preconditions::{confirm_reservation, select_tube, watch_tubes};
use crate::application::ApplicationResult;
use crate::domain::{CommandRequest, CommandResult};
use crate::infrastructure::traits::QueueClient;

/// Run one request against the session and return the handler's outcome unchanged.
pub fn dispatch(
    request: CommandRequest,
    client: &mut dyn QueueClient,
) -> ApplicationResult<CommandResult> {
    info!("dispatch: {}", request.name());
    match request {
        CommandRequest::Put(args) => {
            select_tube(client, args.tube.as_ref())?;
            CommandMapper::new(client).put(&args)
        }
        CommandRequest::Reserve(args) => {
            watch_tubes(client, &args.tubes)?;
            CommandMapper::new(client).reserve(&args)
        }
        CommandRequest::ReserveById { id } => CommandMapper::new(client).reserve_by_id(id),
        CommandRequest::Peek { id } => CommandMapper::new(client).peek(id),
        CommandRequest::PeekReady { tube } => {
            select_tube(client, tube.as_ref())?;
            CommandMapper::new(client).peek_ready(tube.as_ref())
        }
        CommandRequest::PeekDelayed { tube } => {
            select_tube(client, tube.as_ref())?;
            CommandMapper::new(client).peek_delayed(tube.as_ref())
        }
        CommandRequest::PeekBuried { tube } => {
            select_tube(client, tube.as_ref())?;
            CommandMapper::new(client).peek_buried(tube.as_ref())
        }
        CommandRequest::Release(args) => {
            let job = confirm_reservation(client, args.id)?;
            CommandMapper::new(client).release(job, &args)
        }
        CommandRequest::Bury(args) => {
            let job = confirm_reservation(client, args.id)?;
            CommandMapper::new(client).bury(job, &args)
        }
        CommandRequest::Touch { id } => {
            confirm_reservation(client, id)?;
            CommandMapper::new(client).touch(id)
        }
        CommandRequest::Kick { id } => CommandMapper::new(client).kick(id),
        CommandRequest::Delete { id } => CommandMapper::new(client).delete(id),
        CommandRequest::PauseTube(args) => CommandMapper::new(client).pause_tube(&args),
        CommandRequest::Stats => CommandMapper::new(client).stats(),
        CommandRequest::StatsJob { id } => CommandMapper::new(client).stats_job(id),
        CommandRequest::StatsTube { tube } => CommandMapper::new(client).stats_tube(&tube),
        CommandRequest::ListTubes => CommandMapper::new(client).list_tubes(),
    }
}
