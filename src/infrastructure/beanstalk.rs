//! beanstalkd text-protocol client
//!
//! Requests are single CRLF-terminated lines, optionally followed by a body.
//! Replies start with a status word; job and YAML payloads follow as
//! `<bytes>\r\n` framed data.

use std::collections::BTreeMap;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::time::Duration;

use tracing::{debug, trace};

use crate::domain::{Job, JobId, Priority, TubeName, DEFAULT_TUBE};
use crate::infrastructure::traits::{ClientError, ClientResult, QueueClient};

/// Largest payload accepted from the server: beanstalkd's ceiling for
/// `max-job-size` plus headroom for YAML documents.
pub const MAX_PAYLOAD_LEN: usize = (1 << 30) + (1 << 20);

/// One parsed reply line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Reply {
    status: String,
    args: Vec<String>,
}

impl Reply {
    fn parse(line: &str) -> ClientResult<Self> {
        let mut words = line.split_ascii_whitespace();
        let status = words
            .next()
            .ok_or_else(|| ClientError::Protocol("empty reply".to_string()))?
            .to_string();
        Ok(Self {
            status,
            args: words.map(str::to_string).collect(),
        })
    }

    fn arg<T: std::str::FromStr>(&self, idx: usize) -> ClientResult<T> {
        self.args
            .get(idx)
            .and_then(|a| a.parse().ok())
            .ok_or_else(|| {
                ClientError::Protocol(format!(
                    "reply {} missing argument {}: {:?}",
                    self.status, idx, self.args
                ))
            })
    }

    /// Map a status that was not the expected one into a classified error.
    fn into_error(self) -> ClientError {
        match self.status.as_str() {
            "NOT_FOUND" => ClientError::NotFound,
            "TIMED_OUT" => ClientError::TimedOut,
            "DEADLINE_SOON" => ClientError::DeadlineSoon,
            "BAD_FORMAT" => ClientError::BadFormat,
            "JOB_TOO_BIG" => ClientError::JobTooBig,
            "EXPECTED_CRLF" => ClientError::ExpectedCrlf,
            "DRAINING" => ClientError::Draining,
            "OUT_OF_MEMORY" => ClientError::OutOfMemory,
            "INTERNAL_ERROR" => ClientError::InternalError,
            "UNKNOWN_COMMAND" => ClientError::UnknownCommand,
            _ => ClientError::Protocol(format!(
                "unexpected reply: {} {}",
                self.status,
                self.args.join(" ")
            )),
        }
    }
}

/// Session with a beanstalkd server over any byte stream.
///
/// Dropping the client sends `quit`; the underlying stream closes with it.
pub struct BeanstalkClient<S: Read + Write> {
    stream: BufReader<S>,
    watched: Vec<String>,
}

impl<S: Read + Write> BeanstalkClient<S> {
    /// Wrap a freshly opened stream. The server starts every session using
    /// and watching the default tube.
    pub fn new(stream: S) -> Self {
        Self {
            stream: BufReader::new(stream),
            watched: vec![DEFAULT_TUBE.to_string()],
        }
    }

    /// Tubes this session currently watches.
    pub fn watched(&self) -> &[String] {
        &self.watched
    }

    fn send(&mut self, line: &str, body: Option<&[u8]>) -> ClientResult<()> {
        debug!("send: {}", line);
        let mut frame = Vec::with_capacity(line.len() + 4 + body.map_or(0, <[u8]>::len));
        frame.extend_from_slice(line.as_bytes());
        frame.extend_from_slice(b"\r\n");
        if let Some(body) = body {
            frame.extend_from_slice(body);
            frame.extend_from_slice(b"\r\n");
        }
        let stream = self.stream.get_mut();
        stream.write_all(&frame)?;
        stream.flush()?;
        Ok(())
    }

    fn read_reply(&mut self) -> ClientResult<Reply> {
        let mut line = String::new();
        if self.stream.read_line(&mut line)? == 0 {
            return Err(ClientError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed by server",
            )));
        }
        let line = line.trim_end_matches(['\r', '\n']);
        debug!("recv: {}", line);
        Reply::parse(line)
    }

    fn read_payload(&mut self, len: usize) -> ClientResult<Vec<u8>> {
        let framed = len
            .checked_add(2)
            .filter(|_| len <= MAX_PAYLOAD_LEN)
            .ok_or_else(|| {
                ClientError::Protocol(format!(
                    "payload of {len} bytes exceeds limit of {MAX_PAYLOAD_LEN}"
                ))
            })?;
        let mut buf = vec![0u8; framed];
        self.stream.read_exact(&mut buf)?;
        if &buf[len..] != b"\r\n" {
            return Err(ClientError::Protocol(
                "payload not terminated by CRLF".to_string(),
            ));
        }
        buf.truncate(len);
        trace!("payload: {} bytes", len);
        Ok(buf)
    }

    /// Send a request and require the reply status to be `expected`.
    fn command(&mut self, line: &str, body: Option<&[u8]>, expected: &str) -> ClientResult<Reply> {
        self.send(line, body)?;
        let reply = self.read_reply()?;
        if reply.status == expected {
            Ok(reply)
        } else {
            Err(reply.into_error())
        }
    }

    /// Request answered by `<expected> <id> <bytes>` plus a job body.
    fn job_command(&mut self, line: &str, expected: &str) -> ClientResult<Job> {
        let reply = self.command(line, None, expected)?;
        let id: u64 = reply.arg(0)?;
        let len: usize = reply.arg(1)?;
        let body = self.read_payload(len)?;
        Ok(Job::new(id, body))
    }

    /// Request answered by `OK <bytes>` plus a YAML document.
    fn yaml_command(&mut self, line: &str) -> ClientResult<String> {
        let reply = self.command(line, None, "OK")?;
        let len: usize = reply.arg(0)?;
        let data = self.read_payload(len)?;
        String::from_utf8(data)
            .map_err(|e| ClientError::Protocol(format!("YAML payload not UTF-8: {e}")))
    }
}

impl<S: Read + Write> Drop for BeanstalkClient<S> {
    fn drop(&mut self) {
        debug!("closing session");
        // Best effort: the stream is closed on drop regardless.
        let _ = self.send("quit", None);
    }
}

/// Whole seconds, truncating.
fn secs(d: Duration) -> u64 {
    d.as_secs()
}

/// Whole seconds, rounding up so a sub-second wait never becomes zero.
fn secs_ceil(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

fn yaml_err(e: serde_yaml::Error) -> ClientError {
    ClientError::Protocol(format!("malformed YAML payload: {e}"))
}

/// Render a YAML scalar as plain text.
fn scalar_text(value: serde_yaml::Value) -> ClientResult<String> {
    match value {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Null => Ok(String::new()),
        other => Err(ClientError::Protocol(format!(
            "expected scalar in YAML payload, got {other:?}"
        ))),
    }
}

/// Parse a flat YAML mapping of scalars, as sent by the stats commands.
pub fn parse_yaml_map(doc: &str) -> ClientResult<BTreeMap<String, String>> {
    let raw: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_str(doc).map_err(yaml_err)?;
    raw.into_iter()
        .map(|(k, v)| Ok((k, scalar_text(v)?)))
        .collect()
}

/// Parse a YAML sequence of strings, as sent by `list-tubes`.
pub fn parse_yaml_list(doc: &str) -> ClientResult<Vec<String>> {
    serde_yaml::from_str(doc).map_err(yaml_err)
}

impl<S: Read + Write + Send> QueueClient for BeanstalkClient<S> {
    fn use_tube(&mut self, tube: &TubeName) -> ClientResult<()> {
        self.command(&format!("use {tube}"), None, "USING")?;
        Ok(())
    }

    fn watch_only(&mut self, tubes: &[TubeName]) -> ClientResult<()> {
        // Watch first: the server refuses to ignore the last watched tube.
        for tube in tubes {
            self.command(&format!("watch {tube}"), None, "WATCHING")?;
            if !self.watched.iter().any(|w| w == tube.as_str()) {
                self.watched.push(tube.to_string());
            }
        }
        let stale: Vec<String> = self
            .watched
            .iter()
            .filter(|w| !tubes.iter().any(|t| t.as_str() == w.as_str()))
            .cloned()
            .collect();
        for name in stale {
            self.command(&format!("ignore {name}"), None, "WATCHING")?;
            self.watched.retain(|w| w != &name);
        }
        Ok(())
    }

    fn put(
        &mut self,
        body: &[u8],
        priority: Priority,
        delay: Duration,
        ttr: Duration,
    ) -> ClientResult<JobId> {
        let line = format!(
            "put {} {} {} {}",
            priority,
            secs(delay),
            secs(ttr),
            body.len()
        );
        self.send(&line, Some(body))?;
        let reply = self.read_reply()?;
        match reply.status.as_str() {
            "INSERTED" => Ok(JobId(reply.arg(0)?)),
            "BURIED" => Err(ClientError::Buried(JobId(reply.arg(0)?))),
            _ => Err(reply.into_error()),
        }
    }

    fn reserve(&mut self, timeout: Option<Duration>) -> ClientResult<Job> {
        match timeout {
            None => self.job_command("reserve", "RESERVED"),
            Some(t) => self.job_command(
                &format!("reserve-with-timeout {}", secs_ceil(t)),
                "RESERVED",
            ),
        }
    }

    fn reserve_job(&mut self, id: JobId) -> ClientResult<Job> {
        self.job_command(&format!("reserve-job {id}"), "RESERVED")
    }

    fn peek(&mut self, id: JobId) -> ClientResult<Job> {
        self.job_command(&format!("peek {id}"), "FOUND")
    }

    fn peek_ready(&mut self) -> ClientResult<Job> {
        self.job_command("peek-ready", "FOUND")
    }

    fn peek_delayed(&mut self) -> ClientResult<Job> {
        self.job_command("peek-delayed", "FOUND")
    }

    fn peek_buried(&mut self) -> ClientResult<Job> {
        self.job_command("peek-buried", "FOUND")
    }

    fn release(&mut self, id: JobId, priority: Priority, delay: Duration) -> ClientResult<()> {
        self.send(&format!("release {} {} {}", id, priority, secs(delay)), None)?;
        let reply = self.read_reply()?;
        match reply.status.as_str() {
            "RELEASED" => Ok(()),
            "BURIED" => Err(ClientError::Buried(id)),
            _ => Err(reply.into_error()),
        }
    }

    fn bury(&mut self, id: JobId, priority: Priority) -> ClientResult<()> {
        self.command(&format!("bury {id} {priority}"), None, "BURIED")?;
        Ok(())
    }

    fn delete(&mut self, id: JobId) -> ClientResult<()> {
        self.command(&format!("delete {id}"), None, "DELETED")?;
        Ok(())
    }

    fn touch(&mut self, id: JobId) -> ClientResult<()> {
        self.command(&format!("touch {id}"), None, "TOUCHED")?;
        Ok(())
    }

    fn kick_job(&mut self, id: JobId) -> ClientResult<()> {
        self.command(&format!("kick-job {id}"), None, "KICKED")?;
        Ok(())
    }

    fn pause_tube(&mut self, tube: &TubeName, delay: Duration) -> ClientResult<()> {
        self.command(
            &format!("pause-tube {} {}", tube, secs_ceil(delay)),
            None,
            "PAUSED",
        )?;
        Ok(())
    }

    fn list_tubes(&mut self) -> ClientResult<Vec<String>> {
        let doc = self.yaml_command("list-tubes")?;
        parse_yaml_list(&doc)
    }

    fn stats(&mut self) -> ClientResult<BTreeMap<String, String>> {
        let doc = self.yaml_command("stats")?;
        parse_yaml_map(&doc)
    }

    fn stats_job(&mut self, id: JobId) -> ClientResult<BTreeMap<String, String>> {
        let doc = self.yaml_command(&format!("stats-job {id}"))?;
        parse_yaml_map(&doc)
    }

    fn stats_tube(&mut self, tube: &TubeName) -> ClientResult<BTreeMap<String, String>> {
        let doc = self.yaml_command(&format!("stats-tube {tube}"))?;
        parse_yaml_map(&doc)
    }
}
