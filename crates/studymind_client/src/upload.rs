use std::sync::Arc;

use bytes::Bytes;
use futures_util::{stream, StreamExt};

use crate::{ClientEvent, EventSink};

/// Rounded percentage of `sent` over `total`; an empty payload counts as complete.
pub fn upload_percent(sent: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let sent = sent.min(total) as u128;
    let total = total as u128;
    ((sent * 200 + total) / (total * 2)) as u8
}

/// Splits `bytes` into a streaming body that reports progress as each chunk is pulled.
pub(crate) fn progress_body(
    name: &str,
    bytes: Bytes,
    chunk_size: usize,
    sink: Arc<dyn EventSink>,
) -> reqwest::Body {
    let total = bytes.len();
    let chunks = split_chunks(bytes, chunk_size);
    let name = name.to_string();
    let mut sent = 0usize;
    let mut last_reported: Option<u8> = None;

    let body = stream::iter(chunks).map(move |chunk| {
        sent += chunk.len();
        let percent = upload_percent(sent, total);
        if last_reported != Some(percent) {
            last_reported = Some(percent);
            sink.emit(ClientEvent::UploadProgress {
                name: name.clone(),
                percent,
            });
        }
        Ok::<Bytes, std::io::Error>(chunk)
    });
    reqwest::Body::wrap_stream(body)
}

fn split_chunks(mut bytes: Bytes, chunk_size: usize) -> Vec<Bytes> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::with_capacity(bytes.len() / chunk_size + 1);
    while !bytes.is_empty() {
        let take = chunk_size.min(bytes.len());
        chunks.push(bytes.split_to(take));
    }
    chunks
}
