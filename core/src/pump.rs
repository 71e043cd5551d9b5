//! I/O pump between the host channel and the state machine
//!
//! The calling task reads requests and dispatches them into the machine.
//! A spawned outbound task drains the response queue into the sink. The
//! queue has one writer (the pump) and one reader (the outbound task), so
//! responses leave in exactly the order the machine produced them.

use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::error::{AgentError, Result};
use crate::machine::{CostAgent, Outcome};
use crate::protocol::Response;
use crate::transport::{RequestSource, ResponseSink};

pub const DEFAULT_QUEUE_CAPACITY: usize = 128;

/// Pump settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpConfig {
    /// Responses buffered before the pump waits on the outbound task
    pub queue_capacity: usize,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Why the pump returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The host sent a stop request
    Stopped,
    /// The host closed its side without stopping
    EndOfInput,
}

/// Counters for a finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpSummary {
    pub exit: Exit,
    pub requests: u64,
    pub responses: u64,
}

#[derive(Debug)]
enum Outbound {
    Response(Response),
    Finish,
}

/// Producer side of the response queue
pub struct ResponseQueue {
    tx: mpsc::Sender<Outbound>,
    finished: bool,
}

impl ResponseQueue {
    /// Queue a response, waiting for space if the outbound task lags
    pub async fn push(&mut self, response: Response) -> Result<()> {
        if self.finished {
            return Err(AgentError::QueueClosed);
        }
        self.tx
            .send(Outbound::Response(response))
            .await
            .map_err(|_| AgentError::QueueClosed)
    }

    /// Tell the outbound task no more responses follow
    pub async fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.tx
            .send(Outbound::Finish)
            .await
            .map_err(|_| AgentError::QueueClosed)
    }
}

fn response_queue(capacity: usize) -> (ResponseQueue, mpsc::Receiver<Outbound>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        ResponseQueue {
            tx,
            finished: false,
        },
        rx,
    )
}

async fn drain<K>(mut rx: mpsc::Receiver<Outbound>, mut sink: K) -> Result<u64>
where
    K: ResponseSink,
{
    let mut sent = 0u64;
    while let Some(message) = rx.recv().await {
        match message {
            Outbound::Response(response) => {
                sink.send(&response).await?;
                sent += 1;
            }
            Outbound::Finish => break,
        }
    }
    sink.close().await?;
    debug!("outbound channel closed after {} responses", sent);
    Ok(sent)
}

async fn pump_requests<S>(
    source: &mut S,
    agent: &mut CostAgent,
    queue: &mut ResponseQueue,
    requests: &mut u64,
) -> Result<Exit>
where
    S: RequestSource,
{
    while let Some(request) = source.next_request().await? {
        *requests += 1;
        match agent.handle(request) {
            Outcome::Respond(response) => queue.push(response).await?,
            Outcome::Shutdown => return Ok(Exit::Stopped),
        }
    }
    warn!("host closed its channel without a stop request");
    Ok(Exit::EndOfInput)
}

/// Serve one host connection until stop, end of input or a transport failure.
///
/// The response queue is always finished before returning, so the sink is
/// flushed and closed on every path.
pub async fn serve<S, K>(
    mut source: S,
    sink: K,
    agent: &mut CostAgent,
    config: PumpConfig,
) -> Result<PumpSummary>
where
    S: RequestSource,
    K: ResponseSink + 'static,
{
    let (mut queue, rx) = response_queue(config.queue_capacity);
    let outbound = tokio::spawn(drain(rx, sink));

    let mut requests = 0u64;
    let inbound = pump_requests(&mut source, agent, &mut queue, &mut requests).await;

    if let Err(err) = queue.finish().await {
        debug!("outbound task already gone: {}", err);
    }
    let sent = outbound.await.map_err(|err| AgentError::OutboundTask {
        message: err.to_string(),
    })?;

    // A dead sink surfaces inbound as QueueClosed; report the root cause
    let responses = sent?;
    let exit = inbound?;

    info!(
        "agent finished ({:?}): {} requests, {} responses",
        exit, requests, responses
    );
    Ok(PumpSummary {
        exit,
        requests,
        responses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Request;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    struct ScriptedSource {
        requests: VecDeque<Request>,
    }

    impl ScriptedSource {
        fn new(requests: Vec<Request>) -> Self {
            Self {
                requests: requests.into(),
            }
        }
    }

    #[async_trait]
    impl RequestSource for ScriptedSource {
        async fn next_request(&mut self) -> Result<Option<Request>> {
            Ok(self.requests.pop_front())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        sent: Arc<Mutex<Vec<Response>>>,
        closed: Arc<Mutex<bool>>,
        fail_after: Option<usize>,
    }

    #[async_trait]
    impl ResponseSink for RecordingSink {
        async fn send(&mut self, response: &Response) -> Result<()> {
            let mut sent = self.sent.lock().unwrap();
            if self.fail_after == Some(sent.len()) {
                return Err(AgentError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "host went away",
                )));
            }
            sent.push(response.clone());
            Ok(())
        }

        async fn close(&mut self) -> Result<()> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_stop_closes_outbound() {
        let sink = RecordingSink::default();
        let mut agent = CostAgent::new();

        let summary = serve(
            ScriptedSource::new(vec![Request::Info, Request::Snapshot, Request::Stop]),
            sink.clone(),
            &mut agent,
            PumpConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(summary.exit, Exit::Stopped);
        assert_eq!(summary.requests, 3);
        assert_eq!(summary.responses, 2);
        assert!(*sink.closed.lock().unwrap());
        assert_eq!(sink.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_requests_after_stop_are_not_read() {
        let sink = RecordingSink::default();
        let mut agent = CostAgent::new();
        let mut source = ScriptedSource::new(vec![Request::Stop, Request::Info]);

        let summary = serve(&mut source, sink.clone(), &mut agent, PumpConfig::default())
            .await
            .unwrap();

        assert_eq!(summary.requests, 1);
        assert_eq!(source.requests.len(), 1);
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_end_of_input_still_closes() {
        let sink = RecordingSink::default();
        let mut agent = CostAgent::new();

        let summary = serve(
            ScriptedSource::new(vec![Request::Keepalive { time: 1 }]),
            sink.clone(),
            &mut agent,
            PumpConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(summary.exit, Exit::EndOfInput);
        assert_eq!(summary.responses, 1);
        assert!(*sink.closed.lock().unwrap());
    }

    #[tokio::test]
    async fn test_sink_failure_is_fatal() {
        let sink = RecordingSink {
            fail_after: Some(1),
            ..RecordingSink::default()
        };
        let mut agent = CostAgent::new();
        let requests = (0..500).map(|time| Request::Keepalive { time }).collect();

        let err = serve(
            ScriptedSource::new(requests),
            sink.clone(),
            &mut agent,
            PumpConfig { queue_capacity: 4 },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AgentError::Io(_)));
        assert!(err.is_disconnect());
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_tiny_queue_preserves_order() {
        let sink = RecordingSink::default();
        let mut agent = CostAgent::new();
        let requests = (0..200).map(|time| Request::Keepalive { time }).collect();

        serve(
            ScriptedSource::new(requests),
            sink.clone(),
            &mut agent,
            PumpConfig { queue_capacity: 1 },
        )
        .await
        .unwrap();

        let times: Vec<i64> = sink
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(|response| match response {
                Response::Keepalive { time } => *time,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(times, (0..200).collect::<Vec<i64>>());
    }
}
