//! End-to-end behaviour of unary sessions over the reference transports
// (c) 2026 The unirpc developers

use std::sync::Arc;

use assertables::{assert_contains, assert_starts_with};
use bytes::Bytes;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde::{Deserialize, Serialize};
use unirpc::{
    AppError, Configuration, Metadata, SessionContext, Status, StatusCode, UnarySession,
    executor::{InlineSubmitter, Task, TaskSubmitter, TokioSubmitter},
    protocol::common::ProtocolMessage,
    session::Provider,
    transport::{
        CallHandler,
        memory::{Faults, MemoryCall, SendFault, Transcript},
        stream::{StreamCall, invoke},
    },
};

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct HelloRequest {
    name: String,
}
impl ProtocolMessage for HelloRequest {}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct HelloReply {
    greeting: String,
}
impl ProtocolMessage for HelloReply {}

fn greet(req: HelloRequest, _ctx: &mut SessionContext) -> Result<HelloReply, AppError> {
    let mut greeting = req.name;
    if greeting.is_empty() {
        return Err(Status::from_code(StatusCode::InvalidArgument).into());
    }
    greeting.insert_str(0, "hi ");
    Ok(HelloReply { greeting })
}

fn request(name: &str) -> Vec<u8> {
    HelloRequest { name: name.into() }.to_vec().unwrap()
}

fn reply(greeting: &str) -> Bytes {
    Bytes::from(
        HelloReply {
            greeting: greeting.into(),
        }
        .to_vec()
        .unwrap(),
    )
}

/// Runs one call to completion on the current thread
fn run_call<P>(
    payload: Option<Vec<u8>>,
    faults: Faults,
    config: &Configuration,
    provider: P,
) -> Transcript
where
    P: Provider<HelloRequest, HelloReply>,
{
    let (call, peer) = MemoryCall::with_faults(Metadata::new().with("user", "test"), faults);
    UnarySession::new(call, provider)
        .with_config(config)
        .run(InlineSubmitter)
        .unwrap();
    match payload {
        Some(p) => peer.send_request(p),
        None => peer.half_close(),
    }
    peer.transcript()
}

fn run_simple<P>(payload: Option<Vec<u8>>, provider: P) -> Transcript
where
    P: Provider<HelloRequest, HelloReply>,
{
    run_call(
        payload,
        Faults::default(),
        Configuration::system_default(),
        provider,
    )
}

#[test]
fn success_sends_message_then_ok() {
    let t = run_simple(Some(request("x")), greet);
    assert!(t.is_well_formed());
    assert_eq!(t.messages(), vec![&reply("hi x")]);
    assert_eq!(t.status(), Some(&Status::ok()));
}

#[test]
fn absent_payload_is_no_request_data() {
    let t = run_simple(None, greet);
    assert!(t.is_well_formed());
    assert_eq!(t.message_attempts(), 0);
    assert_eq!(t.status(), Some(&Status::no_request_data()));
}

#[test]
fn empty_payload_is_still_a_payload() {
    // An empty payload is a (malformed) request, not an absent one
    let t = run_simple(Some(Vec::new()), greet);
    assert!(t.is_well_formed());
    let st = t.status().unwrap();
    assert_eq!(st.code(), StatusCode::Internal);
    assert_ne!(st, &Status::no_request_data());
}

#[test]
fn prebuilt_status_is_verbatim() {
    let t = run_simple(
        Some(request("x")),
        |_req: HelloRequest, _ctx: &mut SessionContext| -> Result<HelloReply, AppError> {
            Err(Status::new(StatusCode::NotFound, "missing").into())
        },
    );
    assert!(t.is_well_formed());
    assert_eq!(t.message_attempts(), 0);
    assert_eq!(
        t.status(),
        Some(&Status::new(StatusCode::NotFound, "missing"))
    );
}

#[test]
fn decode_failure_is_internal() {
    // claims a 9-byte name, but only has one byte
    let t = run_simple(Some(vec![9, b'x']), greet);
    assert!(t.is_well_formed());
    assert_eq!(t.message_attempts(), 0);
    let st = t.status().unwrap();
    assert_eq!(st.code(), StatusCode::Internal);
    let msg = st.message().unwrap();
    assert_starts_with!(msg, "server error: ");
    assert_contains!(msg, "decoding");
}

#[test]
fn generic_error_is_internal() {
    let t = run_simple(
        Some(request("x")),
        |_req: HelloRequest, _ctx: &mut SessionContext| -> Result<HelloReply, AppError> {
            Err(anyhow::anyhow!("database unavailable").into())
        },
    );
    assert_eq!(t.message_attempts(), 0);
    assert_eq!(
        t.status(),
        Some(&Status::new(
            StatusCode::Internal,
            "server error: database unavailable"
        ))
    );
}

#[test]
fn panic_is_internal() {
    let t = run_simple(
        Some(request("x")),
        |_req: HelloRequest, _ctx: &mut SessionContext| -> Result<HelloReply, AppError> {
            panic!("provider fell over")
        },
    );
    assert!(t.is_well_formed());
    assert_eq!(t.message_attempts(), 0);
    let st = t.status().unwrap();
    assert_eq!(st.code(), StatusCode::Internal);
    assert_contains!(st.message().unwrap(), "provider fell over");
}

#[test]
fn oversize_request_is_resource_exhausted() {
    let config = Configuration {
        max_request_size: 4,
        ..*Configuration::system_default()
    };
    let t = run_call(
        Some(request("a long name")),
        Faults::default(),
        &config,
        |_req: HelloRequest, _ctx: &mut SessionContext| -> Result<HelloReply, AppError> {
            unreachable!("provider must not see an oversize request")
        },
    );
    assert!(t.is_well_formed());
    assert_eq!(t.status().unwrap().code(), StatusCode::ResourceExhausted);
}

#[rstest]
#[case::success(true)]
#[case::failure(false)]
fn trailing_metadata_reaches_the_status(#[case] succeed: bool) {
    let t = run_simple(
        Some(request("x")),
        move |req: HelloRequest, ctx: &mut SessionContext| -> Result<HelloReply, AppError> {
            assert_eq!(ctx.request_metadata().get("user"), Some("test"));
            ctx.add_trailing_metadata("served-by", "scenarios");
            if succeed {
                greet(req, ctx)
            } else {
                Err(Status::new(StatusCode::PermissionDenied, "no").into())
            }
        },
    );
    let st = t.status().unwrap();
    assert_eq!(st.is_ok(), succeed);
    assert_eq!(st.trailing_metadata().get("served-by"), Some("scenarios"));
}

#[test]
fn closed_call_sends_nothing() {
    let faults = Faults {
        closed: true,
        ..Faults::default()
    };
    let (call, peer) = MemoryCall::with_faults(Metadata::new(), faults);
    let result = UnarySession::new(call, greet).run(InlineSubmitter);
    assert!(result.is_err());
    assert!(peer.transcript().events.is_empty());
}

/// Accepts tasks and throws them away
struct DiscardingSubmitter;

impl TaskSubmitter for DiscardingSubmitter {
    fn submit(&self, task: Task) {
        drop(task);
    }
}

#[test]
fn discarded_task_is_abandoned() {
    let (call, peer) = MemoryCall::new(Metadata::new());
    UnarySession::new(call, greet)
        .run(DiscardingSubmitter)
        .unwrap();
    peer.send_request(request("x"));
    let t = peer.transcript();
    assert!(t.is_well_formed());
    assert_eq!(t.message_attempts(), 0);
    assert_eq!(t.status_attempts().len(), 1);
    assert_eq!(t.status(), Some(&Status::abandoned()));
}

#[test]
fn request_after_runtime_shutdown_is_abandoned() {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let (call, peer) = MemoryCall::new(Metadata::new());
    UnarySession::new(call, greet)
        .run(TokioSubmitter::new(rt.handle().clone()))
        .unwrap();
    rt.shutdown_background();
    peer.send_request(request("late"));
    let t = peer.transcript();
    assert!(t.is_well_formed());
    assert_eq!(t.status_attempts().len(), 1);
    assert_eq!(t.status(), Some(&Status::abandoned()));
}

#[test]
fn trait_object_calls() {
    let (call, peer) = MemoryCall::new(Metadata::new());
    let call: Arc<dyn CallHandler> = call;
    UnarySession::new(call, greet)
        .with_initial_metadata(Metadata::new().with("server", "dyn"))
        .run(InlineSubmitter)
        .unwrap();
    peer.send_request(request("dyn"));
    let outcome = peer.transcript().outcome().unwrap();
    assert_eq!(outcome.initial_metadata.get("server"), Some("dyn"));
    assert_eq!(outcome.message, Some(reply("hi dyn")));
    assert!(outcome.status.is_ok());
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Respond,
    Fail,
    NoPayload,
}

/// Whatever goes wrong, exactly one status is attempted, and it comes last
#[rstest]
fn exactly_one_status(
    #[values(None, Some(SendFault::Immediate), Some(SendFault::Completion))]
    message_send: Option<SendFault>,
    #[values(false, true)] status_send: bool,
    #[values(Outcome::Respond, Outcome::Fail, Outcome::NoPayload)] outcome: Outcome,
) {
    let faults = Faults {
        closed: false,
        message_send,
        status_send,
    };
    let payload = match outcome {
        Outcome::NoPayload => None,
        Outcome::Respond | Outcome::Fail => Some(request("x")),
    };
    let t = run_call(
        payload,
        faults,
        Configuration::system_default(),
        move |req: HelloRequest, ctx: &mut SessionContext| -> Result<HelloReply, AppError> {
            match outcome {
                Outcome::Fail => Err(Status::from_code(StatusCode::Aborted).into()),
                _ => greet(req, ctx),
            }
        },
    );
    assert!(t.is_well_formed(), "{t:?}");
    let expected = match outcome {
        // A failed message send does not change the status
        Outcome::Respond => Status::ok(),
        Outcome::Fail => Status::from_code(StatusCode::Aborted),
        Outcome::NoPayload => Status::no_request_data(),
    };
    assert_eq!(t.status(), Some(&expected));
    let expected_messages = usize::from(matches!(outcome, Outcome::Respond));
    assert_eq!(t.message_attempts(), expected_messages);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_concurrent_sessions() {
    let submitter = Arc::new(TokioSubmitter::current().unwrap());
    let mut peers = Vec::new();
    for i in 0..100 {
        let (call, peer) = MemoryCall::new(Metadata::new());
        UnarySession::new(call, greet)
            .run(Arc::clone(&submitter))
            .unwrap();
        peers.push((i, peer));
    }
    let tasks = peers.into_iter().map(|(i, peer)| {
        tokio::spawn(async move {
            // Odd-numbered calls have no request
            if i % 2 == 0 {
                peer.send_request(request(&format!("caller {i}")));
            } else {
                peer.half_close();
            }
            (i, peer.finished().await)
        })
    });
    for task in tasks {
        let (i, t) = task.await.unwrap();
        assert!(t.is_well_formed());
        if i % 2 == 0 {
            assert_eq!(t.messages(), vec![&reply(&format!("hi caller {i}"))]);
            assert_eq!(t.status(), Some(&Status::ok()));
        } else {
            assert_eq!(t.message_attempts(), 0);
            assert_eq!(t.status(), Some(&Status::no_request_data()));
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn call_over_a_stream() {
    let (client, server) = tokio::io::duplex(4096);
    let (client_recv, client_send) = tokio::io::split(client);
    let (server_recv, server_send) = tokio::io::split(server);

    let client = tokio::spawn(invoke(
        client_send,
        client_recv,
        Metadata::new().with("user", "stream"),
        Some(Bytes::from(request("stream"))),
    ));

    let call = StreamCall::accept(server_send, server_recv).await.unwrap();
    UnarySession::new(
        call,
        |req: HelloRequest, ctx: &mut SessionContext| -> Result<HelloReply, AppError> {
            let user = ctx.request_metadata().get("user").unwrap_or_default().to_string();
            ctx.add_trailing_metadata("user-was", user);
            greet(req, ctx)
        },
    )
    .with_initial_metadata(Metadata::new().with("server", "scenarios"))
    .run(TokioSubmitter::current().unwrap())
    .unwrap();

    let outcome = client.await.unwrap().unwrap();
    assert_eq!(outcome.initial_metadata.get("server"), Some("scenarios"));
    assert_eq!(outcome.message, Some(reply("hi stream")));
    assert!(outcome.status.is_ok());
    assert_eq!(
        outcome.status.trailing_metadata().get("user-was"),
        Some("stream")
    );
}

#[tokio::test]
async fn stream_without_request() {
    let (client, server) = tokio::io::duplex(4096);
    let (client_recv, client_send) = tokio::io::split(client);
    let (server_recv, server_send) = tokio::io::split(server);

    let client = tokio::spawn(invoke(client_send, client_recv, Metadata::new(), None));
    let call = StreamCall::accept(server_send, server_recv).await.unwrap();
    UnarySession::new(call, greet).run(InlineSubmitter).unwrap();

    let outcome = client.await.unwrap().unwrap();
    assert_eq!(outcome.message, None);
    assert_eq!(outcome.status, Status::no_request_data());
}
