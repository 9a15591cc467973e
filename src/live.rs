//! Live aggregates over server-sent events.
//!
//! The server pushes one `aggregate` event with the current snapshot when the
//! stream opens and another after every vote on the dish. Dropping the
//! [`AggregateStream`] closes the connection, which also releases the
//! server's channel.

use std::collections::VecDeque;

use futures::{StreamExt, stream::BoxStream};
use reqwest::Response;

use crate::{error::ClientError, models::DishAggregate};

const AGGREGATE_EVENT: &str = "aggregate";

pub struct AggregateStream {
    chunks: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    decoder: EventDecoder,
    pending: VecDeque<String>,
}

impl AggregateStream {
    pub(crate) fn new(response: Response) -> Self {
        Self {
            chunks: response
                .bytes_stream()
                .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
                .boxed(),
            decoder: EventDecoder::default(),
            pending: VecDeque::new(),
        }
    }

    /// Next snapshot, `None` once the server closes the stream.
    pub async fn next(&mut self) -> Option<Result<DishAggregate, ClientError>> {
        loop {
            if let Some(data) = self.pending.pop_front() {
                return Some(serde_json::from_str(&data).map_err(ClientError::from));
            }

            match self.chunks.next().await? {
                Ok(chunk) => self.pending.extend(self.decoder.push(&chunk)),
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

/// Splits a byte stream into events. Frames can arrive cut at any byte.
#[derive(Default)]
struct EventDecoder {
    buffer: Vec<u8>,
}

impl EventDecoder {
    /// Data of every `aggregate` event completed by `chunk`.
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend(chunk.iter().filter(|byte| **byte != b'\r'));

        let mut events = Vec::new();
        while let Some(end) = self.buffer.windows(2).position(|pair| pair == b"\n\n") {
            let frame: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(data) = aggregate_data(&String::from_utf8_lossy(&frame)) {
                events.push(data);
            }
        }

        events
    }
}

fn aggregate_data(frame: &str) -> Option<String> {
    let mut event = "message";
    let mut data = Vec::new();

    for line in frame.lines() {
        if let Some(value) = line.strip_prefix("event:") {
            event = value.trim();
        } else if let Some(value) = line.strip_prefix("data:") {
            data.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }

    (event == AGGREGATE_EVENT && !data.is_empty()).then(|| data.join("\n"))
}
