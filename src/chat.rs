// src/chat.rs

//! Streaming chat adapter.
//!
//! Bridges one user turn to the hosted Gemini `streamGenerateContent`
//! endpoint and hands the reply back as a lazy sequence of text deltas on an
//! mpsc channel. The sequence is finite and single-consumption; dropping the
//! receiver abandons the stream and the pump task winds down on its next
//! send. Any transport or upstream failure resolves to exactly one
//! [`ChatEvent::Fallback`] so the caller never sees a dangling reply.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::models::dto::TranscriptMessage;
use crate::scoring::ScoreTally;

/// Shown in place of the reply when the upstream call fails for any reason.
pub const FALLBACK_MESSAGE: &str = "عذراً، حدث خطأ أثناء الاتصال. يرجى المحاولة لاحقاً.";

/// One item of the reply sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// An incremental fragment of the reply text.
    Delta(String),
    /// Terminal: the reply failed and the fallback text replaces whatever
    /// has been accumulated so far.
    Fallback,
}

/// Builds the Arabic career-advisor system instruction around the user's
/// current tally.
pub fn system_instruction(scores: &ScoreTally) -> String {
    format!(
        "أنت مستشار مهني وشخصي ذكي وودود جداً. تتحدث باللغة العربية بأسلوب مشجع.\n\
         المستخدم قام بإجراء اختبار لتحديد الميول المهنية والشخصية.\n\n\
         نتائج المستخدم هي:\n\
         - المنطق والتحليل (Logic): {}\n\
         - الإبداع (Creative): {}\n\
         - الجانب الإنساني (Human): {}\n\
         - النظم والهندسة (Systems): {}\n\n\
         دورك هو الإجابة على أسئلة المستخدم حول مستقبله المهني، أو تفسير نتيجته، \
         أو اقتراح طرق لتطوير مهاراته بناءً على هذه الأرقام.\n\
         كن دقيقاً، واستخدم نبرة ملهمة. لا تكرر النتائج بشكل آلي، بل حللها.",
        scores.logic, scores.creative, scores.human, scores.systems
    )
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    #[serde(rename = "systemInstruction")]
    system_instruction: Content,
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

/// Streamed response chunk, one per SSE `data:` payload.
#[derive(Debug, Default, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

fn build_request(
    config: &Config,
    scores: &ScoreTally,
    history: &[TranscriptMessage],
    message: &str,
) -> GenerateRequest {
    let mut contents: Vec<Content> = history
        .iter()
        .map(|m| Content {
            role: Some(m.role.as_str().to_string()),
            parts: vec![Part {
                text: m.text.clone(),
            }],
        })
        .collect();

    // The current turn goes last, after the prior transcript.
    contents.push(Content {
        role: Some("user".to_string()),
        parts: vec![Part {
            text: message.to_string(),
        }],
    });

    GenerateRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part {
                text: system_instruction(scores),
            }],
        },
        contents,
        generation_config: GenerationConfig {
            thinking_config: ThinkingConfig {
                thinking_budget: config.gemini_thinking_budget,
            },
        },
    }
}

/// Sends one chat turn and returns the receiving end of the delta sequence.
///
/// The request runs in a background task; the returned receiver yields
/// [`ChatEvent::Delta`] items as fragments arrive and closes when the
/// upstream stream does. Failures (request error, non-success status,
/// interrupted stream) emit a single [`ChatEvent::Fallback`] and close.
pub async fn stream_advice(
    http: reqwest::Client,
    config: &Config,
    scores: &ScoreTally,
    history: &[TranscriptMessage],
    message: &str,
) -> mpsc::Receiver<ChatEvent> {
    let (tx, rx) = mpsc::channel(32);

    let url = format!(
        "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
        config.gemini_base_url.trim_end_matches('/'),
        config.gemini_model
    );
    let request = http
        .post(url)
        .header("x-goog-api-key", &config.gemini_api_key)
        .header("Accept", "text/event-stream")
        .json(&build_request(config, scores, history, message));

    tokio::spawn(async move {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Chat request failed: {}", e);
                let _ = tx.send(ChatEvent::Fallback).await;
                return;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Chat upstream returned HTTP {}", status);
            let _ = tx.send(ChatEvent::Fallback).await;
            return;
        }

        pump_sse(response.bytes_stream(), tx).await;
    });

    rx
}

/// Reads an SSE byte stream and forwards the text of each `data:` payload as
/// deltas. Events are delimited by blank lines; splitting is done on raw
/// bytes so a multi-byte character divided across network chunks is never
/// corrupted. A mid-stream transport error emits the fallback and stops.
async fn pump_sse<S, E>(byte_stream: S, tx: mpsc::Sender<ChatEvent>)
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    let mut buffer: Vec<u8> = Vec::new();

    tokio::pin!(byte_stream);

    while let Some(chunk_result) = byte_stream.next().await {
        let chunk = match chunk_result {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!("Chat stream interrupted: {}", e);
                let _ = tx.send(ChatEvent::Fallback).await;
                return;
            }
        };

        buffer.extend_from_slice(&chunk);

        while let Some((pos, delimiter_len)) = find_event_boundary(&buffer) {
            let event_block: Vec<u8> = buffer.drain(..pos + delimiter_len).collect();
            let event_block = String::from_utf8_lossy(&event_block[..pos]).into_owned();
            if !forward_deltas(&event_block, &tx).await {
                // Receiver dropped: the chat was abandoned, stop pumping.
                return;
            }
        }
    }

    // A final event without a trailing blank line.
    if !buffer.is_empty() {
        let event_block = String::from_utf8_lossy(&buffer).into_owned();
        let _ = forward_deltas(&event_block, &tx).await;
    }
}

/// Finds the next blank-line event delimiter, returning its offset and
/// length. Both bare-LF and CRLF framings occur in the wild.
fn find_event_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    for i in 0..buffer.len() {
        if buffer[i..].starts_with(b"\n\n") {
            return Some((i, 2));
        }
        if buffer[i..].starts_with(b"\r\n\r\n") {
            return Some((i, 4));
        }
    }
    None
}

/// Sends every text fragment found in one SSE event block. Returns false
/// when the receiver is gone.
async fn forward_deltas(event_block: &str, tx: &mpsc::Sender<ChatEvent>) -> bool {
    for delta in extract_deltas(event_block) {
        if tx.send(ChatEvent::Delta(delta)).await.is_err() {
            return false;
        }
    }
    true
}

/// Parses one SSE event block and pulls the candidate text out of each
/// `data:` line. Non-data lines and unparseable payloads are skipped.
fn extract_deltas(event_block: &str) -> Vec<String> {
    let mut deltas = Vec::new();

    for line in event_block.lines() {
        let Some(payload) = line.strip_prefix("data:") else {
            continue;
        };
        let payload = payload.trim();
        if payload.is_empty() {
            continue;
        }

        let chunk: GenerateChunk = match serde_json::from_str(payload) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::debug!("Skipping unparseable chat chunk: {}", e);
                continue;
            }
        };

        for candidate in chunk.candidates {
            let Some(content) = candidate.content else {
                continue;
            };
            for part in content.parts {
                if !part.text.is_empty() {
                    deltas.push(part.text);
                }
            }
        }
    }

    deltas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Category;

    fn sse_event(text: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": text }] }
                }]
            })
        )
    }

    async fn collect_events<E: std::fmt::Display>(
        chunks: Vec<Result<Bytes, E>>,
    ) -> Vec<ChatEvent> {
        let (tx, mut rx) = mpsc::channel(32);
        pump_sse(futures::stream::iter(chunks), tx).await;

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_system_instruction_embeds_scores() {
        let mut scores = ScoreTally::default();
        scores.add(Category::Logic, 6);
        scores.add(Category::Systems, 3);

        let prompt = system_instruction(&scores);
        assert!(prompt.contains("(Logic): 6"));
        assert!(prompt.contains("(Creative): 0"));
        assert!(prompt.contains("(Human): 0"));
        assert!(prompt.contains("(Systems): 3"));
    }

    #[test]
    fn test_request_keeps_current_turn_out_of_history() {
        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            gemini_api_key: "test-key".to_string(),
            gemini_base_url: "http://127.0.0.1:9".to_string(),
            gemini_model: "gemini-test".to_string(),
            gemini_thinking_budget: 0,
            rust_log: "error".to_string(),
        };
        let history = vec![
            TranscriptMessage {
                role: crate::models::dto::ChatRole::User,
                text: "سؤال قديم".to_string(),
            },
            TranscriptMessage {
                role: crate::models::dto::ChatRole::Model,
                text: "جواب قديم".to_string(),
            },
        ];

        let request = build_request(&config, &ScoreTally::default(), &history, "سؤال جديد");

        assert_eq!(request.contents.len(), 3);
        assert_eq!(request.contents[0].role.as_deref(), Some("user"));
        assert_eq!(request.contents[1].role.as_deref(), Some("model"));
        assert_eq!(request.contents[2].role.as_deref(), Some("user"));
        assert_eq!(request.contents[2].parts[0].text, "سؤال جديد");
    }

    #[test]
    fn test_extract_deltas_skips_garbage() {
        let block = "event: message\ndata: not-json\ndata: {\"candidates\":[]}";
        assert!(extract_deltas(block).is_empty());
    }

    #[tokio::test]
    async fn test_fragments_accumulate_in_order() {
        let body = format!("{}{}", sse_event("مرحبا"), sse_event(" بك"));
        let events =
            collect_events::<String>(vec![Ok(Bytes::from(body))]).await;

        assert_eq!(
            events,
            vec![
                ChatEvent::Delta("مرحبا".to_string()),
                ChatEvent::Delta(" بك".to_string()),
            ]
        );

        let full: String = events
            .iter()
            .map(|e| match e {
                ChatEvent::Delta(text) => text.as_str(),
                ChatEvent::Fallback => FALLBACK_MESSAGE,
            })
            .collect();
        assert_eq!(full, "مرحبا بك");
    }

    #[tokio::test]
    async fn test_event_split_across_chunks() {
        let body = sse_event("تحليل نتيجتك");
        let bytes = body.as_bytes();
        // Split in the middle of the Arabic text, inside a UTF-8 sequence.
        let mid = bytes.len() / 2;
        let events = collect_events::<String>(vec![
            Ok(Bytes::copy_from_slice(&bytes[..mid])),
            Ok(Bytes::copy_from_slice(&bytes[mid..])),
        ])
        .await;

        assert_eq!(events, vec![ChatEvent::Delta("تحليل نتيجتك".to_string())]);
    }

    #[tokio::test]
    async fn test_transport_fault_resolves_to_single_fallback() {
        let events = collect_events(vec![
            Ok(Bytes::from(sse_event("جزء أول"))),
            Err("connection reset".to_string()),
        ])
        .await;

        assert_eq!(
            events,
            vec![
                ChatEvent::Delta("جزء أول".to_string()),
                ChatEvent::Fallback,
            ]
        );
    }

    #[tokio::test]
    async fn test_crlf_framed_events_stream_incrementally() {
        // An upstream using CRLF line endings must still yield one delta per
        // event, not a single batch at stream close.
        let body = format!(
            "data: {}\r\n\r\ndata: {}\r\n\r\n",
            serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": "مرحبا" }] } }]
            }),
            serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": " بك" }] } }]
            })
        );
        let events = collect_events::<String>(vec![Ok(Bytes::from(body))]).await;

        assert_eq!(
            events,
            vec![
                ChatEvent::Delta("مرحبا".to_string()),
                ChatEvent::Delta(" بك".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_dropped_receiver_stops_pump() {
        // Closing the chat drops the receiver; the pump must wind down on
        // its next send instead of looping over the rest of the stream.
        let (tx, mut rx) = mpsc::channel(1);
        let chunks: Vec<Result<Bytes, String>> = (0..3)
            .map(|i| Ok(Bytes::from(sse_event(&format!("جزء {}", i)))))
            .collect();

        let pump = tokio::spawn(pump_sse(futures::stream::iter(chunks), tx));

        let first = rx.recv().await;
        assert!(matches!(first, Some(ChatEvent::Delta(_))));
        drop(rx);

        // With capacity 1 the pump is parked on its second send; it must
        // observe the closed channel and finish promptly.
        tokio::time::timeout(std::time::Duration::from_secs(2), pump)
            .await
            .expect("pump kept running after the receiver was dropped")
            .unwrap();
    }

    #[tokio::test]
    async fn test_final_event_without_trailing_blank_line() {
        let body = sse_event("مرحبا");
        let trimmed = body.trim_end().to_string();
        let events = collect_events::<String>(vec![Ok(Bytes::from(trimmed))]).await;
        assert_eq!(events, vec![ChatEvent::Delta("مرحبا".to_string())]);
    }
}
