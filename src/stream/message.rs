// src/stream/message.rs
use serde::Deserialize;
use serde_json::Value;

use super::tweet::Tweet;

/// One message delivered on the streaming connection. Only `Tweet` becomes a
/// tuple; the rest are control and compliance notices.
#[derive(Debug, Clone)]
pub enum StreamMessage {
    Tweet(Box<Tweet>),
    StatusDeletion(StatusDeletion),
    LocationDeletion(LocationDeletion),
    Limit(LimitNotice),
    StatusWithheld(StatusWithheld),
    UserWithheld(UserWithheld),
    Disconnect(Disconnect),
    StallWarning(StallWarning),
    /// Anything else, kept raw.
    Other(Value),
}

impl StreamMessage {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Tweet(_) => "tweet",
            Self::StatusDeletion(_) => "delete",
            Self::LocationDeletion(_) => "scrub_geo",
            Self::Limit(_) => "limit",
            Self::StatusWithheld(_) => "status_withheld",
            Self::UserWithheld(_) => "user_withheld",
            Self::Disconnect(_) => "disconnect",
            Self::StallWarning(_) => "warning",
            Self::Other(_) => "other",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StatusDeletion {
    pub id: u64,
    pub id_str: String,
    pub user_id: u64,
    pub user_id_str: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocationDeletion {
    pub user_id: u64,
    pub user_id_str: String,
    pub up_to_status_id: u64,
    pub up_to_status_id_str: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LimitNotice {
    /// Undelivered matches since the connection opened.
    pub track: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StatusWithheld {
    pub id: u64,
    pub user_id: u64,
    pub withheld_in_countries: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserWithheld {
    pub id: u64,
    pub withheld_in_countries: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Disconnect {
    pub code: i64,
    pub stream_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StallWarning {
    pub code: String,
    pub message: String,
    pub percent_full: i64,
}

/// Decode one line of the stream body. Blank keep-alive lines give `None`.
pub fn decode_line(line: &str) -> Option<Result<StreamMessage, serde_json::Error>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(serde_json::from_str::<Value>(line).map(classify))
}

/// Sort a decoded JSON value into a message kind. A payload that looks like a
/// tweet but doesn't fit the typed shape is kept as `Other`.
pub fn classify(v: Value) -> StreamMessage {
    fn typed<T: for<'de> Deserialize<'de>>(v: &Value) -> Option<T> {
        serde_json::from_value(v.clone()).ok()
    }

    let Some(obj) = v.as_object() else {
        return StreamMessage::Other(v);
    };

    let msg = if obj.contains_key("retweet_count") {
        typed::<Tweet>(&v).map(|t| StreamMessage::Tweet(Box::new(t)))
    } else if let Some(d) = obj.get("delete").and_then(|d| d.get("status")) {
        typed(d).map(StreamMessage::StatusDeletion)
    } else if let Some(d) = obj.get("scrub_geo") {
        typed(d).map(StreamMessage::LocationDeletion)
    } else if let Some(d) = obj.get("limit") {
        typed(d).map(StreamMessage::Limit)
    } else if let Some(d) = obj.get("status_withheld") {
        typed(d).map(StreamMessage::StatusWithheld)
    } else if let Some(d) = obj.get("user_withheld") {
        typed(d).map(StreamMessage::UserWithheld)
    } else if let Some(d) = obj.get("disconnect") {
        typed(d).map(StreamMessage::Disconnect)
    } else if let Some(d) = obj.get("warning") {
        typed(d).map(StreamMessage::StallWarning)
    } else {
        None
    };

    msg.unwrap_or(StreamMessage::Other(v))
}
