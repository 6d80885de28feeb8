//! In-memory fake queue server for tests
//!
//! Models the job lifecycle with multiple sessions and a manual clock, so
//! lifecycle commands can be exercised without a running beanstalkd.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tubectl::domain::{Job, JobId, JobState, Priority, TubeName, DEFAULT_TUBE};
use tubectl::infrastructure::traits::{ClientError, ClientResult, QueueClient};

#[derive(Debug, Clone)]
pub struct FakeJob {
    pub id: u64,
    pub tube: String,
    pub body: Vec<u8>,
    pub priority: u32,
    pub state: JobState,
    pub ready_at: u64,
    pub ttr: u64,
    pub reserved_by: Option<usize>,
    pub reserves: u64,
    pub releases: u64,
    pub buries: u64,
    pub kicks: u64,
}

#[derive(Debug, Default)]
struct SessionState {
    used: String,
    watched: Vec<String>,
}

#[derive(Debug, Default)]
struct FakeServer {
    now: u64,
    next_id: u64,
    next_session: usize,
    broken: bool,
    jobs: BTreeMap<u64, FakeJob>,
    paused_until: BTreeMap<String, u64>,
    sessions: BTreeMap<usize, SessionState>,
    calls: Vec<String>,
}

impl FakeServer {
    fn promote_delayed(&mut self) {
        let now = self.now;
        for job in self.jobs.values_mut() {
            if job.state == JobState::Delayed && job.ready_at <= now {
                job.state = JobState::Ready;
            }
        }
    }

    fn tube_exists(&self, tube: &str) -> bool {
        tube == DEFAULT_TUBE
            || self.jobs.values().any(|j| j.tube == tube)
            || self
                .sessions
                .values()
                .any(|s| s.used == tube || s.watched.iter().any(|w| w == tube))
    }

    fn is_paused(&self, tube: &str) -> bool {
        self.paused_until
            .get(tube)
            .is_some_and(|until| *until > self.now)
    }

    fn tube_names(&self) -> Vec<String> {
        let mut names: Vec<String> = vec![DEFAULT_TUBE.to_string()];
        names.extend(self.jobs.values().map(|j| j.tube.clone()));
        for s in self.sessions.values() {
            names.push(s.used.clone());
            names.extend(s.watched.iter().cloned());
        }
        names.sort();
        names.dedup();
        names
    }

    fn count(&self, tube: Option<&str>, state: JobState) -> usize {
        self.jobs
            .values()
            .filter(|j| j.state == state && tube.map_or(true, |t| j.tube == t))
            .count()
    }
}

/// Shared fake server; hand out one [`FakeSession`] per simulated connection.
#[derive(Clone, Default)]
pub struct FakeQueue {
    server: Arc<Mutex<FakeServer>>,
}

impl FakeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeServer> {
        self.server.lock().expect("fake server lock")
    }

    /// Open a new session using and watching the default tube.
    pub fn session(&self) -> FakeSession {
        let mut server = self.lock();
        server.next_session += 1;
        let id = server.next_session;
        server.sessions.insert(
            id,
            SessionState {
                used: DEFAULT_TUBE.to_string(),
                watched: vec![DEFAULT_TUBE.to_string()],
            },
        );
        FakeSession {
            id,
            server: Arc::clone(&self.server),
        }
    }

    /// Advance the clock; delayed jobs whose time has come become ready.
    pub fn advance(&self, secs: u64) {
        let mut server = self.lock();
        server.now += secs;
        server.promote_delayed();
    }

    pub fn state_of(&self, id: JobId) -> Option<JobState> {
        self.lock().jobs.get(&id.0).map(|j| j.state)
    }

    pub fn job(&self, id: JobId) -> Option<FakeJob> {
        self.lock().jobs.get(&id.0).cloned()
    }

    /// Every request received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Make every following request fail with a broken pipe.
    pub fn break_connection(&self) {
        self.lock().broken = true;
    }
}

/// One simulated connection. Dropping it releases its reservations.
pub struct FakeSession {
    id: usize,
    server: Arc<Mutex<FakeServer>>,
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        if let Ok(mut server) = self.server.lock() {
            let id = self.id;
            for job in server.jobs.values_mut() {
                if job.reserved_by == Some(id) {
                    job.reserved_by = None;
                    job.state = JobState::Ready;
                }
            }
            server.sessions.remove(&id);
        }
    }
}

impl FakeSession {
    /// Record the call and hand back the server, or fail if the link is broken.
    fn begin(&self, call: String) -> ClientResult<MutexGuard<'_, FakeServer>> {
        let mut server = self.server.lock().expect("fake server lock");
        server.calls.push(call);
        if server.broken {
            return Err(ClientError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "connection reset",
            )));
        }
        server.promote_delayed();
        Ok(server)
    }

    fn job_of(job: &FakeJob) -> Job {
        Job::new(job.id, job.body.clone())
    }

    fn peek_in_used(&self, call: &str, state: JobState) -> ClientResult<Job> {
        let server = self.begin(call.to_string())?;
        let used = server.sessions[&self.id].used.clone();
        server
            .jobs
            .values()
            .filter(|j| j.tube == used && j.state == state)
            .min_by_key(|j| match state {
                JobState::Ready => (u64::from(j.priority), j.id),
                JobState::Delayed => (j.ready_at, j.id),
                _ => (0, j.id),
            })
            .map(Self::job_of)
            .ok_or(ClientError::NotFound)
    }

    fn owned_mut<'a>(
        server: &'a mut FakeServer,
        session: usize,
        id: JobId,
    ) -> ClientResult<&'a mut FakeJob> {
        match server.jobs.get_mut(&id.0) {
            Some(job) if job.state == JobState::Reserved && job.reserved_by == Some(session) => {
                Ok(job)
            }
            _ => Err(ClientError::NotFound),
        }
    }
}

fn stats_of(job: &FakeJob, now: u64) -> BTreeMap<String, String> {
    let mut stats = BTreeMap::new();
    stats.insert("id".to_string(), job.id.to_string());
    stats.insert("tube".to_string(), job.tube.clone());
    stats.insert("state".to_string(), job.state.to_string());
    stats.insert("pri".to_string(), job.priority.to_string());
    stats.insert(
        "time-left".to_string(),
        job.ready_at.saturating_sub(now).to_string(),
    );
    stats.insert("ttr".to_string(), job.ttr.to_string());
    stats.insert("reserves".to_string(), job.reserves.to_string());
    stats.insert("releases".to_string(), job.releases.to_string());
    stats.insert("buries".to_string(), job.buries.to_string());
    stats.insert("kicks".to_string(), job.kicks.to_string());
    stats
}

impl QueueClient for FakeSession {
    fn use_tube(&mut self, tube: &TubeName) -> ClientResult<()> {
        let mut server = self.begin(format!("use {tube}"))?;
        server
            .sessions
            .get_mut(&self.id)
            .expect("live session")
            .used = tube.to_string();
        Ok(())
    }

    fn watch_only(&mut self, tubes: &[TubeName]) -> ClientResult<()> {
        let names: Vec<String> = tubes.iter().map(ToString::to_string).collect();
        let mut server = self.begin(format!("watch-only {}", names.join(",")))?;
        server
            .sessions
            .get_mut(&self.id)
            .expect("live session")
            .watched = names;
        Ok(())
    }

    fn put(
        &mut self,
        body: &[u8],
        priority: Priority,
        delay: Duration,
        ttr: Duration,
    ) -> ClientResult<JobId> {
        let mut server = self.begin("put".to_string())?;
        server.next_id += 1;
        let id = server.next_id;
        let tube = server.sessions[&self.id].used.clone();
        let delay = delay.as_secs();
        let job = FakeJob {
            id,
            tube,
            body: body.to_vec(),
            priority: priority.0,
            state: if delay > 0 {
                JobState::Delayed
            } else {
                JobState::Ready
            },
            ready_at: server.now + delay,
            ttr: ttr.as_secs().max(1),
            reserved_by: None,
            reserves: 0,
            releases: 0,
            buries: 0,
            kicks: 0,
        };
        server.jobs.insert(id, job);
        Ok(JobId(id))
    }

    fn reserve(&mut self, timeout: Option<Duration>) -> ClientResult<Job> {
        let mut server = self.begin(format!("reserve {timeout:?}"))?;
        let watched = server.sessions[&self.id].watched.clone();
        let candidate = server
            .jobs
            .values()
            .filter(|j| j.state == JobState::Ready)
            .filter(|j| watched.contains(&j.tube) && !server.is_paused(&j.tube))
            .min_by_key(|j| (j.priority, j.id))
            .map(|j| j.id);
        match candidate {
            Some(id) => {
                let session = self.id;
                let job = server.jobs.get_mut(&id).expect("candidate exists");
                job.state = JobState::Reserved;
                job.reserved_by = Some(session);
                job.reserves += 1;
                Ok(Self::job_of(job))
            }
            None if timeout.is_some() => Err(ClientError::TimedOut),
            None => Err(ClientError::Io(io::Error::new(
                io::ErrorKind::WouldBlock,
                "fake queue would block forever",
            ))),
        }
    }

    fn reserve_job(&mut self, id: JobId) -> ClientResult<Job> {
        let mut server = self.begin(format!("reserve-job {id}"))?;
        let session = self.id;
        match server.jobs.get_mut(&id.0) {
            Some(job) if job.state != JobState::Reserved => {
                job.state = JobState::Reserved;
                job.reserved_by = Some(session);
                job.reserves += 1;
                Ok(Self::job_of(job))
            }
            _ => Err(ClientError::NotFound),
        }
    }

    fn peek(&mut self, id: JobId) -> ClientResult<Job> {
        let server = self.begin(format!("peek {id}"))?;
        server
            .jobs
            .get(&id.0)
            .map(Self::job_of)
            .ok_or(ClientError::NotFound)
    }

    fn peek_ready(&mut self) -> ClientResult<Job> {
        self.peek_in_used("peek-ready", JobState::Ready)
    }

    fn peek_delayed(&mut self) -> ClientResult<Job> {
        self.peek_in_used("peek-delayed", JobState::Delayed)
    }

    fn peek_buried(&mut self) -> ClientResult<Job> {
        self.peek_in_used("peek-buried", JobState::Buried)
    }

    fn release(&mut self, id: JobId, priority: Priority, delay: Duration) -> ClientResult<()> {
        let mut server = self.begin(format!("release {id}"))?;
        let now = server.now;
        let job = Self::owned_mut(&mut server, self.id, id)?;
        let delay = delay.as_secs();
        job.priority = priority.0;
        job.reserved_by = None;
        job.releases += 1;
        job.ready_at = now + delay;
        job.state = if delay > 0 {
            JobState::Delayed
        } else {
            JobState::Ready
        };
        Ok(())
    }

    fn bury(&mut self, id: JobId, priority: Priority) -> ClientResult<()> {
        let mut server = self.begin(format!("bury {id}"))?;
        let job = Self::owned_mut(&mut server, self.id, id)?;
        job.priority = priority.0;
        job.reserved_by = None;
        job.buries += 1;
        job.state = JobState::Buried;
        Ok(())
    }

    fn delete(&mut self, id: JobId) -> ClientResult<()> {
        let mut server = self.begin(format!("delete {id}"))?;
        let session = self.id;
        match server.jobs.get(&id.0) {
            Some(job) if job.reserved_by.map_or(true, |s| s == session) => {
                server.jobs.remove(&id.0);
                Ok(())
            }
            _ => Err(ClientError::NotFound),
        }
    }

    fn touch(&mut self, id: JobId) -> ClientResult<()> {
        let mut server = self.begin(format!("touch {id}"))?;
        Self::owned_mut(&mut server, self.id, id).map(|_| ())
    }

    fn kick_job(&mut self, id: JobId) -> ClientResult<()> {
        let mut server = self.begin(format!("kick-job {id}"))?;
        match server.jobs.get_mut(&id.0) {
            Some(job) if matches!(job.state, JobState::Buried | JobState::Delayed) => {
                job.state = JobState::Ready;
                job.kicks += 1;
                Ok(())
            }
            _ => Err(ClientError::NotFound),
        }
    }

    fn pause_tube(&mut self, tube: &TubeName, delay: Duration) -> ClientResult<()> {
        let mut server = self.begin(format!("pause-tube {tube}"))?;
        if !server.tube_exists(tube.as_str()) {
            return Err(ClientError::NotFound);
        }
        let until = server.now + delay.as_secs();
        server.paused_until.insert(tube.to_string(), until);
        Ok(())
    }

    fn list_tubes(&mut self) -> ClientResult<Vec<String>> {
        let server = self.begin("list-tubes".to_string())?;
        Ok(server.tube_names())
    }

    fn stats(&mut self) -> ClientResult<BTreeMap<String, String>> {
        let server = self.begin("stats".to_string())?;
        let mut stats = BTreeMap::new();
        for state in [
            JobState::Ready,
            JobState::Delayed,
            JobState::Reserved,
            JobState::Buried,
        ] {
            stats.insert(
                format!("current-jobs-{state}"),
                server.count(None, state).to_string(),
            );
        }
        stats.insert("total-jobs".to_string(), server.next_id.to_string());
        stats.insert(
            "current-tubes".to_string(),
            server.tube_names().len().to_string(),
        );
        Ok(stats)
    }

    fn stats_job(&mut self, id: JobId) -> ClientResult<BTreeMap<String, String>> {
        let server = self.begin(format!("stats-job {id}"))?;
        server
            .jobs
            .get(&id.0)
            .map(|j| stats_of(j, server.now))
            .ok_or(ClientError::NotFound)
    }

    fn stats_tube(&mut self, tube: &TubeName) -> ClientResult<BTreeMap<String, String>> {
        let server = self.begin(format!("stats-tube {tube}"))?;
        if !server.tube_exists(tube.as_str()) {
            return Err(ClientError::NotFound);
        }
        let name = tube.as_str();
        let mut stats = BTreeMap::new();
        stats.insert("name".to_string(), name.to_string());
        for state in [
            JobState::Ready,
            JobState::Delayed,
            JobState::Reserved,
            JobState::Buried,
        ] {
            stats.insert(
                format!("current-jobs-{state}"),
                server.count(Some(name), state).to_string(),
            );
        }
        let left = server
            .paused_until
            .get(name)
            .map_or(0, |until| until.saturating_sub(server.now));
        stats.insert("pause-time-left".to_string(), left.to_string());
        Ok(stats)
    }
}
