//! Command line interface
// (c) 2026 The unirpc developers

use std::{ffi::OsString, path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context as _, Result};
use bytes::Bytes;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use unirpc::{
    Configuration, Metadata, Status, StatusCode, UnarySession,
    config::Manager,
    executor::TokioSubmitter,
    protocol::common::{ProtocolMessage as _, ReceivingStream, SendingStream},
    transport::{CallOutcome, memory::MemoryCall, stream::StreamCall},
    util::{setup_tracing, trace_level, tracing_is_initialised},
};

use crate::greeter::{Greeter, HelloReply, HelloRequest};

/// Server initial metadata key identifying us
const SERVER_KEY: &str = "server";
const SERVER_NAME: &str = concat!("unirpct/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Enable detailed debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Only report errors
    #[arg(short, long, global = true, conflicts_with = "debug")]
    quiet: bool,

    /// Read configuration from this TOML file (in addition to the environment)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Runs one greeter call in-process and prints what the client saw
    Loopback(LoopbackArgs),
    /// Serves one greeter call over stdin and stdout, using the stream protocol
    Serve,
}

#[derive(Debug, Clone, Args)]
struct LoopbackArgs {
    /// Who to greet
    #[arg(long, default_value = "world")]
    name: String,

    /// Send no request at all
    #[arg(long, conflicts_with = "garbage")]
    no_request: bool,

    /// Send a request that cannot be decoded
    #[arg(long)]
    garbage: bool,

    /// Make the greeter fail with this status code (for example `not_found`)
    #[arg(long, value_name = "CODE")]
    fail: Option<StatusCode>,

    /// Status message to go with --fail
    #[arg(long, requires = "fail")]
    message: Option<String>,
}

impl LoopbackArgs {
    fn greeter(&self) -> Greeter {
        Greeter {
            fail: self.fail.map(|code| match &self.message {
                Some(m) => Status::new(code, m.as_str()),
                None => Status::from_code(code),
            }),
        }
    }

    fn payload(&self) -> Result<Option<Bytes>> {
        if self.no_request {
            return Ok(None);
        }
        if self.garbage {
            // a string length that runs off the end
            return Ok(Some(Bytes::from_static(&[0x7f, b'?'])));
        }
        let req = HelloRequest {
            name: self.name.clone(),
        };
        Ok(Some(Bytes::from(req.to_vec()?)))
    }
}

/// Main CLI entrypoint
///
/// Call this from `main`, passing the arguments to use.
/// Errors are reported to stderr.
#[must_use]
pub fn cli<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    run(args)
        .inspect_err(|e| {
            if tracing_is_initialised() {
                tracing::error!("{e:#}");
            } else {
                eprintln!("Error: {e:#}");
            }
        })
        .map_or(ExitCode::FAILURE, |success| {
            if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        })
}

/// Inner CLI logic
///
/// # Return
/// true indicates success. false indicates that the call finished with a non-ok status.
///
/// # Note
/// This function starts a tokio runtime and performs work in it.
pub fn run<I, T>(args: I) -> Result<bool>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    use clap::error::ErrorKind::{DisplayHelp, DisplayVersion};
    let args = match CliArgs::try_parse_from(args) {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), DisplayHelp | DisplayVersion) => {
            print!("{}", e.render());
            return Ok(true);
        }
        Err(e) => return Err(e.into()),
    };

    let config = Manager::standard(args.config.as_deref())
        .configuration()
        .context("reading configuration")?;
    setup_tracing(trace_level(args.debug, args.quiet), config.time_format)?;
    debug!("configuration: {config:?}");

    let runtime = runtime(&config)?;
    match args.mode {
        Mode::Loopback(opts) => {
            let outcome = runtime.block_on(loopback(&opts, &config))?;
            print_outcome(&outcome);
            Ok(outcome.status.is_ok())
        }
        Mode::Serve => {
            runtime.block_on(serve(tokio::io::stdout(), tokio::io::stdin(), &config))?;
            Ok(true)
        }
    }
}

fn runtime(config: &Configuration) -> Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    if config.worker_threads > 0 {
        let _ = builder.worker_threads(config.worker_threads);
    }
    builder.enable_all().build().context("starting runtime")
}

fn server_metadata() -> Metadata {
    Metadata::new().with(SERVER_KEY, SERVER_NAME)
}

/// Runs one call through an in-process transport
async fn loopback(opts: &LoopbackArgs, config: &Configuration) -> Result<CallOutcome> {
    let payload = opts.payload()?;
    let (call, peer) = MemoryCall::new(Metadata::new().with("user-agent", SERVER_NAME));
    UnarySession::new(call, opts.greeter().provider())
        .with_config(config)
        .with_initial_metadata(server_metadata())
        .run(TokioSubmitter::current()?)?;
    match payload {
        Some(p) => peer.send_request(p),
        None => peer.half_close(),
    }
    let transcript = peer.finished().await;
    transcript
        .outcome()
        .context("the call did not send a status")
}

/// Serves one call over a stream pair, returning once the status has been written
async fn serve<S, R>(send: S, recv: R, config: &Configuration) -> Result<()>
where
    S: SendingStream,
    R: ReceivingStream,
{
    let call = StreamCall::accept(send, recv)
        .await
        .context("accepting call")?;
    let session = UnarySession::new(Arc::clone(&call), Greeter::default().provider())
        .with_config(config)
        .with_initial_metadata(server_metadata());
    info!("serving call {}", session.call_id());
    session.run(TokioSubmitter::current()?)?;
    call.closed().await;
    Ok(())
}

fn print_outcome(outcome: &CallOutcome) {
    println!("initial metadata: {}", outcome.initial_metadata);
    if let Some(m) = &outcome.message {
        match HelloReply::from_slice(m) {
            Ok(reply) => println!("response: {}", reply.greeting),
            Err(e) => println!("response: ({} bytes, undecodable: {e})", m.len()),
        }
    }
    println!("status: {}", outcome.status);
    if !outcome.status.trailing_metadata().is_empty() {
        println!("trailing metadata: {}", outcome.status.trailing_metadata());
    }
}
