//! Session lifecycle tests: loopback server, connection failures, container wiring

mod common;

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use common::FakeQueue;
use tubectl::application::ApplicationError;
use tubectl::cli::CliError;
use tubectl::config::Settings;
use tubectl::domain::{CommandRequest, JobId, Priority, PutArgs};
use tubectl::exitcode;
use tubectl::infrastructure::di::ServiceContainer;
use tubectl::infrastructure::InfraError;

fn settings_for(address: String) -> Settings {
    Settings {
        address,
        connect_timeout_secs: 2,
        ..Settings::default()
    }
}

fn put(body: &str) -> CommandRequest {
    CommandRequest::Put(PutArgs {
        body: body.as_bytes().to_vec(),
        tube: None,
        priority: Priority(0),
        delay: Duration::ZERO,
        ttr: Duration::from_secs(60),
    })
}

#[test]
fn given_loopback_server_when_putting_then_inserted_and_quit_on_close() {
    // Arrange
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut writer = stream;

        let mut command = String::new();
        reader.read_line(&mut command).unwrap();
        let mut body = String::new();
        reader.read_line(&mut body).unwrap();
        writer.write_all(b"INSERTED 7\r\n").unwrap();

        let mut rest = String::new();
        reader.read_to_string(&mut rest).unwrap();
        (command, body, rest)
    });

    // Act
    let mut container =
        ServiceContainer::connect(settings_for(format!("tcp://127.0.0.1:{port}"))).unwrap();
    let result = container.execute(put("hello")).unwrap();
    drop(container);

    // Assert
    assert_eq!(result.text("id"), Some("7"));
    let (command, body, rest) = server.join().unwrap();
    assert_eq!(command, "put 0 0 60 5\r\n");
    assert_eq!(body, "hello\r\n");
    assert_eq!(rest, "quit\r\n");
}

#[test]
fn given_loopback_server_when_delete_fails_then_quit_still_sent() {
    // Arrange
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut writer = stream;

        let mut command = String::new();
        reader.read_line(&mut command).unwrap();
        writer.write_all(b"NOT_FOUND\r\n").unwrap();

        let mut rest = String::new();
        reader.read_to_string(&mut rest).unwrap();
        (command, rest)
    });

    // Act
    let outcome = {
        let mut container =
            ServiceContainer::connect(settings_for(format!("tcp://127.0.0.1:{port}"))).unwrap();
        container.execute(CommandRequest::Delete { id: JobId(99) })
    };

    // Assert
    match outcome {
        Err(InfraError::Application(ApplicationError::NotFound(subject))) => {
            assert_eq!(subject, "job 99")
        }
        other => panic!("expected not found, got {other:?}"),
    }
    let (command, rest) = server.join().unwrap();
    assert_eq!(command, "delete 99\r\n");
    assert_eq!(rest, "quit\r\n");
}

#[test]
fn given_closed_port_when_connecting_then_connection_failed_with_own_exit_code() {
    // Arrange: grab a free port, then release it
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    // Act
    let err = ServiceContainer::connect(settings_for(format!("tcp://127.0.0.1:{port}")))
        .err()
        .expect("connect must fail");

    // Assert
    assert!(matches!(err, InfraError::ConnectionFailed { .. }), "got {err:?}");
    assert_eq!(CliError::from(err).exit_code(), exitcode::UNAVAILABLE);
}

#[test]
fn given_unknown_scheme_when_connecting_then_invalid_address() {
    let err = ServiceContainer::connect(settings_for("file:///tmp/q.sock".to_string()))
        .err()
        .expect("scheme must be rejected");

    assert!(matches!(err, InfraError::InvalidAddress { .. }));
    assert_eq!(CliError::from(err).exit_code(), exitcode::USAGE);
}

#[test]
fn given_fake_client_when_executing_through_container_then_dispatches() {
    let queue = FakeQueue::new();
    let mut container =
        ServiceContainer::with_client(Settings::default(), Box::new(queue.session()));

    let id: u64 = container
        .execute(put("job"))
        .unwrap()
        .text("id")
        .unwrap()
        .parse()
        .unwrap();
    container
        .execute(CommandRequest::Delete { id: JobId(id) })
        .unwrap();

    assert_eq!(queue.state_of(JobId(id)), None);
    assert_eq!(queue.calls(), vec!["put".to_string(), format!("delete {id}")]);
}

#[test]
fn given_broken_connection_when_putting_through_container_then_transport_error_without_retry() {
    let queue = FakeQueue::new();
    let mut container =
        ServiceContainer::with_client(Settings::default(), Box::new(queue.session()));
    queue.break_connection();

    let err = container.execute(put("job")).err().expect("put must fail");

    assert!(matches!(
        err,
        InfraError::Application(ApplicationError::Transport { .. })
    ));
    assert_eq!(queue.calls(), vec!["put".to_string()]);
    assert_eq!(CliError::from(err).exit_code(), exitcode::IOERR);
}
