//! Change Feed
//!
//! Row-level change subscription over the realtime WebSocket. Frames follow
//! the Phoenix shape `{topic, event, payload, ref}`: one join frame with a
//! `postgres_changes` config, a heartbeat on a timer, and inbound
//! `postgres_changes` frames forwarded to the callback.
//!
//! Socket, timer, and JS callbacks live in a thread-local slot keyed by
//! handle id, so the detach handle itself is plain data and can ride
//! through reactive-owner cleanup.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use gloo_timers::callback::Interval;
use serde::{Deserialize, Serialize};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{MessageEvent, WebSocket};

use crate::config::Config;
use crate::error::Error;

const HEARTBEAT_INTERVAL_MS: u32 = 30_000;
const JOIN_REF: &str = "1";
const HEARTBEAT_REF: &str = "0";

/// Row-level change subscription parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostgresChanges {
    event: String,
    schema: String,
    table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<String>,
}

impl PostgresChanges {
    /// Subscribe to every event type (insert/update/delete) on `table`.
    pub fn on_table(table: &str) -> Self {
        Self {
            event: "*".to_string(),
            schema: "public".to_string(),
            table: table.to_string(),
            filter: None,
        }
    }

    /// Narrow to rows matching a PostgREST-style predicate, e.g. `user_id=eq.X`.
    pub fn with_filter(mut self, filter: String) -> Self {
        self.filter = Some(filter);
        self
    }
}

#[derive(Serialize)]
struct Frame<'a, P: Serialize> {
    topic: &'a str,
    event: &'a str,
    payload: P,
    #[serde(rename = "ref")]
    reference: &'a str,
}

#[derive(Serialize)]
struct JoinPayload<'a> {
    config: JoinConfig<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
}

#[derive(Serialize)]
struct JoinConfig<'a> {
    postgres_changes: [&'a PostgresChanges; 1],
}

#[derive(Deserialize)]
struct InboundFrame {
    #[serde(default)]
    topic: String,
    #[serde(default)]
    event: String,
}

fn join_frame(topic: &str, changes: &PostgresChanges, access_token: Option<&str>) -> Result<String, Error> {
    let frame = Frame {
        topic,
        event: "phx_join",
        payload: JoinPayload {
            config: JoinConfig {
                postgres_changes: [changes],
            },
            access_token,
        },
        reference: JOIN_REF,
    };
    serde_json::to_string(&frame).map_err(|e| Error::Decode(e.to_string()))
}

fn heartbeat_frame() -> Result<String, Error> {
    let frame = Frame {
        topic: "phoenix",
        event: "heartbeat",
        payload: serde_json::json!({}),
        reference: HEARTBEAT_REF,
    };
    serde_json::to_string(&frame).map_err(|e| Error::Decode(e.to_string()))
}

/// True for any row-change frame on the joined topic; replies, presence, and
/// heartbeat acks do not count.
fn is_change_event(raw: &str, topic: &str) -> bool {
    match serde_json::from_str::<InboundFrame>(raw) {
        Ok(frame) => frame.event == "postgres_changes" && frame.topic == topic,
        Err(_) => false,
    }
}

struct LiveChannel {
    socket: WebSocket,
    _heartbeat: Interval,
    _on_open: Closure<dyn FnMut()>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_close: Closure<dyn FnMut()>,
}

thread_local! {
    static ACTIVE: RefCell<HashMap<u64, LiveChannel>> = RefCell::new(HashMap::new());
    static NEXT_ID: Cell<u64> = const { Cell::new(1) };
}

/// Detach handle for one open channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelHandle {
    id: u64,
}

impl ChannelHandle {
    /// Close the socket and drop the heartbeat timer and JS callbacks.
    /// Safe to call after the channel is already gone.
    pub fn unsubscribe(self) {
        let channel = ACTIVE.with(|active| active.borrow_mut().remove(&self.id));
        if let Some(channel) = channel {
            channel.socket.set_onopen(None);
            channel.socket.set_onmessage(None);
            channel.socket.set_onclose(None);
            let _ = channel.socket.close();
        }
    }
}

pub(crate) fn subscribe(
    config: &Config,
    channel_name: &str,
    changes: PostgresChanges,
    access_token: Option<String>,
    on_change: impl Fn() + 'static,
) -> Result<ChannelHandle, Error> {
    let topic = format!("realtime:{channel_name}");
    let join = join_frame(&topic, &changes, access_token.as_deref())?;
    let heartbeat_text = heartbeat_frame()?;

    let socket = WebSocket::new(&config.realtime_url())
        .map_err(|_| Error::Network("could not open the realtime socket".to_string()))?;

    let join_socket = socket.clone();
    let on_open = Closure::<dyn FnMut()>::new(move || {
        if join_socket.send_with_str(&join).is_err() {
            log::warn!("realtime join frame did not send");
        }
    });
    socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));

    let message_topic = topic.clone();
    let on_message = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
        if let Some(text) = event.data().as_string() {
            if is_change_event(&text, &message_topic) {
                on_change();
            }
        }
    });
    socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

    let on_close = Closure::<dyn FnMut()>::new(move || {
        log::debug!("realtime socket closed");
    });
    socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));

    let heartbeat_socket = socket.clone();
    let heartbeat = Interval::new(HEARTBEAT_INTERVAL_MS, move || {
        if heartbeat_socket.ready_state() == WebSocket::OPEN {
            let _ = heartbeat_socket.send_with_str(&heartbeat_text);
        }
    });

    let id = NEXT_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    });
    ACTIVE.with(|active| {
        active.borrow_mut().insert(
            id,
            LiveChannel {
                socket,
                _heartbeat: heartbeat,
                _on_open: on_open,
                _on_message: on_message,
                _on_close: on_close,
            },
        );
    });
    Ok(ChannelHandle { id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_frame_shape() {
        let changes = PostgresChanges::on_table("tasks").with_filter("user_id=eq.u-1".to_string());
        let frame = join_frame("realtime:tasks-realtime", &changes, Some("jwt")).expect("serialize");
        let value: serde_json::Value = serde_json::from_str(&frame).expect("json");

        assert_eq!(value["topic"], "realtime:tasks-realtime");
        assert_eq!(value["event"], "phx_join");
        assert_eq!(value["ref"], JOIN_REF);
        assert_eq!(value["payload"]["access_token"], "jwt");

        let subscription = &value["payload"]["config"]["postgres_changes"][0];
        assert_eq!(subscription["event"], "*");
        assert_eq!(subscription["schema"], "public");
        assert_eq!(subscription["table"], "tasks");
        assert_eq!(subscription["filter"], "user_id=eq.u-1");
    }

    #[test]
    fn test_join_frame_omits_absent_fields() {
        let changes = PostgresChanges::on_table("tasks");
        let frame = join_frame("realtime:t", &changes, None).expect("serialize");
        assert!(!frame.contains("access_token"));
        assert!(!frame.contains("filter"));
    }

    #[test]
    fn test_heartbeat_frame_shape() {
        let value: serde_json::Value =
            serde_json::from_str(&heartbeat_frame().expect("serialize")).expect("json");
        assert_eq!(value["topic"], "phoenix");
        assert_eq!(value["event"], "heartbeat");
    }

    #[test]
    fn test_change_events_are_recognized() {
        let change = r#"{"topic":"realtime:tasks-realtime","event":"postgres_changes","payload":{},"ref":null}"#;
        assert!(is_change_event(change, "realtime:tasks-realtime"));
        assert!(!is_change_event(change, "realtime:other"));

        let reply = r#"{"topic":"realtime:tasks-realtime","event":"phx_reply","payload":{"status":"ok"},"ref":"1"}"#;
        assert!(!is_change_event(reply, "realtime:tasks-realtime"));

        let heartbeat_ack = r#"{"topic":"phoenix","event":"phx_reply","payload":{},"ref":"0"}"#;
        assert!(!is_change_event(heartbeat_ack, "realtime:tasks-realtime"));

        assert!(!is_change_event("not json", "realtime:tasks-realtime"));
    }
}
