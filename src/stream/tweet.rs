//! Typed tweet object (REST/streaming API v1.1) and its mapping to a record.
//!
//! The record carries a fixed key set: every field declared on [`Tweet`] and
//! [`User`] is always present, absent optional values are `null`. Free-form
//! sub-objects (entities, place, ...) are passed through untouched.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Number, Value};

use crate::error::ConvertError;
use crate::host::Record;

/// `created_at` layout used by the v1.1 API, e.g. `Wed Aug 27 13:08:45 +0000 2008`.
pub const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Tweet {
    pub contributors: Option<Value>,
    pub coordinates: Option<Coordinates>,
    pub created_at: String,
    pub current_user_retweet: Option<Value>,
    pub display_text_range: Option<Vec<i64>>,
    pub entities: Option<Value>,
    pub extended_entities: Option<Value>,
    pub extended_tweet: Option<Value>,
    pub favorite_count: u64,
    pub favorited: bool,
    pub filter_level: Option<String>,
    pub full_text: Option<String>,
    pub has_extended_profile: Option<bool>,
    pub id: u64,
    pub id_str: String,
    pub in_reply_to_screen_name: Option<String>,
    pub in_reply_to_status_id: Option<u64>,
    pub in_reply_to_status_id_str: Option<String>,
    pub in_reply_to_user_id: Option<u64>,
    pub in_reply_to_user_id_str: Option<String>,
    pub is_quote_status: bool,
    pub is_translation_enabled: bool,
    pub lang: Option<String>,
    pub place: Option<Value>,
    pub possibly_sensitive: Option<bool>,
    pub possibly_sensitive_appealable: Option<bool>,
    pub quoted_status_id: Option<u64>,
    pub quoted_status_id_str: Option<String>,
    pub quoted_status: Option<Box<Tweet>>,
    pub retweet_count: u64,
    pub retweeted: bool,
    pub retweeted_status: Option<Box<Tweet>>,
    pub source: Option<String>,
    pub scopes: Option<Value>,
    pub text: String,
    pub truncated: bool,
    pub user: User,
    pub withheld_copyright: bool,
    pub withheld_in_countries: Vec<String>,
    pub withheld_scope: Option<String>,
}

/// Author object. `status` is only sent for users the authenticating account
/// follows.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct User {
    pub contributors_enabled: bool,
    pub created_at: String,
    pub default_profile: bool,
    pub default_profile_image: bool,
    pub description: Option<String>,
    pub email: Option<String>,
    pub entities: Option<Value>,
    pub favourites_count: u64,
    pub follow_request_sent: Option<bool>,
    pub followers_count: u64,
    pub following: Option<bool>,
    pub friends_count: u64,
    pub geo_enabled: bool,
    pub has_extended_profile: bool,
    pub id: u64,
    pub id_str: String,
    pub is_translation_enabled: bool,
    pub is_translator: bool,
    pub lang: Option<String>,
    pub listed_count: u64,
    pub location: Option<String>,
    pub name: String,
    pub notifications: Option<bool>,
    pub profile_background_color: Option<String>,
    pub profile_background_image_url: Option<String>,
    pub profile_background_image_url_https: Option<String>,
    pub profile_background_tile: bool,
    pub profile_banner_url: Option<String>,
    pub profile_image_url: Option<String>,
    pub profile_image_url_https: Option<String>,
    pub profile_link_color: Option<String>,
    pub profile_sidebar_border_color: Option<String>,
    pub profile_sidebar_fill_color: Option<String>,
    pub profile_text_color: Option<String>,
    pub profile_use_background_image: bool,
    pub protected: bool,
    pub screen_name: String,
    pub show_all_inline_media: bool,
    pub status: Option<Box<Tweet>>,
    pub statuses_count: u64,
    pub time_zone: Option<String>,
    pub url: Option<String>,
    pub utc_offset: Option<i64>,
    pub verified: bool,
    pub withheld_in_countries: Vec<String>,
    pub withheld_scope: Option<String>,
}

/// GeoJSON point; `coordinates` is `[longitude, latitude]`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Coordinates {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<f64>,
}

impl Tweet {
    pub fn created_at_time(&self) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_str(&self.created_at, CREATED_AT_FORMAT).map(|t| t.with_timezone(&Utc))
    }

    pub fn to_record(&self) -> Result<Record, ConvertError> {
        let mut m = Record::new();
        put(&mut m, "contributors", opt_value(&self.contributors));
        let coordinates = match &self.coordinates {
            Some(c) => c.to_value()?,
            None => Value::Null,
        };
        put(&mut m, "coordinates", coordinates);
        put(&mut m, "created_at", self.created_at.as_str());
        put(&mut m, "current_user_retweet", opt_value(&self.current_user_retweet));
        put(&mut m, "display_text_range", opt(self.display_text_range.clone()));
        put(&mut m, "entities", opt_value(&self.entities));
        put(&mut m, "extended_entities", opt_value(&self.extended_entities));
        put(&mut m, "extended_tweet", opt_value(&self.extended_tweet));
        put(&mut m, "favorite_count", self.favorite_count);
        put(&mut m, "favorited", self.favorited);
        put(&mut m, "filter_level", opt_str(&self.filter_level));
        put(&mut m, "full_text", opt_str(&self.full_text));
        put(&mut m, "has_extended_profile", opt(self.has_extended_profile));
        put(&mut m, "id", self.id);
        put(&mut m, "id_str", self.id_str.as_str());
        put(&mut m, "in_reply_to_screen_name", opt_str(&self.in_reply_to_screen_name));
        put(&mut m, "in_reply_to_status_id", opt(self.in_reply_to_status_id));
        put(&mut m, "in_reply_to_status_id_str", opt_str(&self.in_reply_to_status_id_str));
        put(&mut m, "in_reply_to_user_id", opt(self.in_reply_to_user_id));
        put(&mut m, "in_reply_to_user_id_str", opt_str(&self.in_reply_to_user_id_str));
        put(&mut m, "is_quote_status", self.is_quote_status);
        put(&mut m, "is_translation_enabled", self.is_translation_enabled);
        put(&mut m, "lang", opt_str(&self.lang));
        put(&mut m, "place", opt_value(&self.place));
        put(&mut m, "possibly_sensitive", opt(self.possibly_sensitive));
        put(&mut m, "possibly_sensitive_appealable", opt(self.possibly_sensitive_appealable));
        put(&mut m, "quoted_status_id", opt(self.quoted_status_id));
        put(&mut m, "quoted_status_id_str", opt_str(&self.quoted_status_id_str));
        put(&mut m, "quoted_status", nested(&self.quoted_status)?);
        put(&mut m, "retweet_count", self.retweet_count);
        put(&mut m, "retweeted", self.retweeted);
        put(&mut m, "retweeted_status", nested(&self.retweeted_status)?);
        put(&mut m, "source", opt_str(&self.source));
        put(&mut m, "scopes", opt_value(&self.scopes));
        put(&mut m, "text", self.text.as_str());
        put(&mut m, "truncated", self.truncated);
        put(&mut m, "user", Value::Object(self.user.to_record()?));
        put(&mut m, "withheld_copyright", self.withheld_copyright);
        put(&mut m, "withheld_in_countries", self.withheld_in_countries.clone());
        put(&mut m, "withheld_scope", opt_str(&self.withheld_scope));
        Ok(m)
    }
}

impl User {
    pub fn to_record(&self) -> Result<Record, ConvertError> {
        let mut m = Record::new();
        put(&mut m, "contributors_enabled", self.contributors_enabled);
        put(&mut m, "created_at", self.created_at.as_str());
        put(&mut m, "default_profile", self.default_profile);
        put(&mut m, "default_profile_image", self.default_profile_image);
        put(&mut m, "description", opt_str(&self.description));
        put(&mut m, "email", opt_str(&self.email));
        put(&mut m, "entities", opt_value(&self.entities));
        put(&mut m, "favourites_count", self.favourites_count);
        put(&mut m, "follow_request_sent", opt(self.follow_request_sent));
        put(&mut m, "followers_count", self.followers_count);
        put(&mut m, "following", opt(self.following));
        put(&mut m, "friends_count", self.friends_count);
        put(&mut m, "geo_enabled", self.geo_enabled);
        put(&mut m, "has_extended_profile", self.has_extended_profile);
        put(&mut m, "id", self.id);
        put(&mut m, "id_str", self.id_str.as_str());
        put(&mut m, "is_translation_enabled", self.is_translation_enabled);
        put(&mut m, "is_translator", self.is_translator);
        put(&mut m, "lang", opt_str(&self.lang));
        put(&mut m, "listed_count", self.listed_count);
        put(&mut m, "location", opt_str(&self.location));
        put(&mut m, "name", self.name.as_str());
        put(&mut m, "notifications", opt(self.notifications));
        put(&mut m, "profile_background_color", opt_str(&self.profile_background_color));
        put(&mut m, "profile_background_image_url", opt_str(&self.profile_background_image_url));
        put(
            &mut m,
            "profile_background_image_url_https",
            opt_str(&self.profile_background_image_url_https),
        );
        put(&mut m, "profile_background_tile", self.profile_background_tile);
        put(&mut m, "profile_banner_url", opt_str(&self.profile_banner_url));
        put(&mut m, "profile_image_url", opt_str(&self.profile_image_url));
        put(&mut m, "profile_image_url_https", opt_str(&self.profile_image_url_https));
        put(&mut m, "profile_link_color", opt_str(&self.profile_link_color));
        put(&mut m, "profile_sidebar_border_color", opt_str(&self.profile_sidebar_border_color));
        put(&mut m, "profile_sidebar_fill_color", opt_str(&self.profile_sidebar_fill_color));
        put(&mut m, "profile_text_color", opt_str(&self.profile_text_color));
        put(&mut m, "profile_use_background_image", self.profile_use_background_image);
        put(&mut m, "protected", self.protected);
        put(&mut m, "screen_name", self.screen_name.as_str());
        put(&mut m, "show_all_inline_media", self.show_all_inline_media);
        put(&mut m, "status", nested(&self.status)?);
        put(&mut m, "statuses_count", self.statuses_count);
        put(&mut m, "time_zone", opt_str(&self.time_zone));
        put(&mut m, "url", opt_str(&self.url));
        put(&mut m, "utc_offset", opt(self.utc_offset));
        put(&mut m, "verified", self.verified);
        put(&mut m, "withheld_in_countries", self.withheld_in_countries.clone());
        put(&mut m, "withheld_scope", opt_str(&self.withheld_scope));
        Ok(m)
    }
}

impl Coordinates {
    fn to_value(&self) -> Result<Value, ConvertError> {
        let points = self
            .coordinates
            .iter()
            .map(|&x| {
                Number::from_f64(x)
                    .map(Value::Number)
                    .ok_or(ConvertError::NonFiniteNumber {
                        field: "coordinates",
                        value: x,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut m = Record::new();
        put(&mut m, "type", self.kind.as_str());
        put(&mut m, "coordinates", points);
        Ok(Value::Object(m))
    }
}

fn put(m: &mut Record, key: &str, v: impl Into<Value>) {
    m.insert(key.to_string(), v.into());
}

fn opt<T: Into<Value>>(v: Option<T>) -> Value {
    v.map_or(Value::Null, Into::into)
}

fn opt_str(v: &Option<String>) -> Value {
    v.as_deref().map_or(Value::Null, Value::from)
}

fn opt_value(v: &Option<Value>) -> Value {
    v.clone().unwrap_or(Value::Null)
}

fn nested(v: &Option<Box<Tweet>>) -> Result<Value, ConvertError> {
    match v {
        Some(t) => Ok(Value::Object(t.to_record()?)),
        None => Ok(Value::Null),
    }
}
