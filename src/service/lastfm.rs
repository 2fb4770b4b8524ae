//! Last.fm web service client.
//!
//! Blocking client for the Last.fm 2.0 REST API. Write calls are signed
//! POSTs, read calls are unsigned GETs; all responses are requested as JSON.
//! Failures are reduced to the four remote error codes.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tracing::debug;

use crate::config::LastFmCredentials;
use crate::error::{ErrorCode, Result, ScrobblerError};
use crate::types::TrackIdentity;

use super::{RemoteTrack, ScrobbleService};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Number of similar tracks requested per lookup.
const SIMILAR_LIMIT: u32 = 50;

/// Number of top tracks requested per lookup.
const TOP_TRACKS_LIMIT: u32 = 50;

/// Last.fm API error codes that matter for classification.
mod api_error {
    pub const INVALID_PARAMETERS: i64 = 6;
    pub const OPERATION_FAILED: i64 = 8;
    pub const SERVICE_OFFLINE: i64 = 11;
    pub const TEMPORARY_ERROR: i64 = 16;
    pub const RATE_LIMIT_EXCEEDED: i64 = 29;
}

/// Last.fm implementation of [`ScrobbleService`].
pub struct LastFmClient {
    http: reqwest::blocking::Client,
    credentials: LastFmCredentials,
}

impl LastFmClient {
    pub fn new(credentials: LastFmCredentials) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("scrobbled/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ScrobblerError::with_source(
                    ErrorCode::UnknownError,
                    "Failed to create HTTP client",
                    e,
                )
            })?;
        Ok(Self { http, credentials })
    }

    /// Returns true if the client holds a session key for write calls.
    pub fn is_authenticated(&self) -> bool {
        !self.credentials.session_key.is_empty() && !self.credentials.api_secret.is_empty()
    }

    /// Performs a signed write call.
    fn write_call(&self, method: &str, mut params: BTreeMap<&str, String>) -> Result<Value> {
        if !self.is_authenticated() {
            return Err(ScrobblerError::unknown(format!(
                "{} requires a session key and API secret",
                method
            )));
        }
        params.insert("method", method.to_string());
        params.insert("api_key", self.credentials.api_key.clone());
        params.insert("sk", self.credentials.session_key.clone());
        let signature = sign(&params, &self.credentials.api_secret);
        params.insert("api_sig", signature);
        params.insert("format", "json".to_string());

        debug!("Last.fm POST {}", method);
        let response = self.http.post(&self.credentials.endpoint).form(&params).send();
        read_response(method, response)
    }

    /// Performs an unsigned read call.
    fn read_call(&self, method: &str, mut params: BTreeMap<&str, String>) -> Result<Value> {
        params.insert("method", method.to_string());
        params.insert("api_key", self.credentials.api_key.clone());
        params.insert("format", "json".to_string());

        debug!("Last.fm GET {}", method);
        let response = self
            .http
            .get(&self.credentials.endpoint)
            .query(&params)
            .send();
        read_response(method, response)
    }
}

impl ScrobbleService for LastFmClient {
    fn announce_now_playing(&self, track: &TrackIdentity) -> Result<()> {
        let mut params = track_params(track);
        if track.duration_sec > 0 {
            params.insert("duration", track.duration_sec.to_string());
        }
        self.write_call("track.updateNowPlaying", params).map(|_| ())
    }

    fn scrobble(&self, track: &TrackIdentity, played_at: SystemTime) -> Result<()> {
        let mut params = track_params(track);
        let timestamp = played_at
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs();
        params.insert("timestamp", timestamp.to_string());
        if track.duration_sec > 0 {
            params.insert("duration", track.duration_sec.to_string());
        }
        let body = self.write_call("track.scrobble", params)?;

        let ignored = body
            .pointer("/scrobbles/@attr/ignored")
            .and_then(as_count)
            .unwrap_or(0);
        if ignored > 0 {
            let reason = body
                .pointer("/scrobbles/scrobble/ignoredMessage/#text")
                .and_then(Value::as_str)
                .unwrap_or("scrobble ignored");
            return Err(ScrobblerError::invalid_parameters(reason.to_string()));
        }
        Ok(())
    }

    fn similar_tracks(&self, artist: &str, title: &str) -> Result<Vec<RemoteTrack>> {
        let mut params = BTreeMap::new();
        params.insert("artist", artist.to_string());
        params.insert("track", title.to_string());
        params.insert("autocorrect", "1".to_string());
        params.insert("limit", SIMILAR_LIMIT.to_string());
        let body = self.read_call("track.getSimilar", params)?;
        Ok(parse_track_list(body.pointer("/similartracks/track")))
    }

    fn artist_top_tracks(&self, artist: &str) -> Result<Vec<RemoteTrack>> {
        let mut params = BTreeMap::new();
        params.insert("artist", artist.to_string());
        params.insert("autocorrect", "1".to_string());
        params.insert("limit", TOP_TRACKS_LIMIT.to_string());
        let body = self.read_call("artist.getTopTracks", params)?;
        Ok(parse_track_list(body.pointer("/toptracks/track")))
    }
}

fn track_params(track: &TrackIdentity) -> BTreeMap<&'static str, String> {
    let mut params = BTreeMap::new();
    params.insert("artist", track.artist.clone());
    params.insert("track", track.title.clone());
    if !track.album.is_empty() {
        params.insert("album", track.album.clone());
    }
    params
}

/// Computes `api_sig`: MD5 of the sorted `name``value` pairs followed by the secret.
///
/// `format` and `callback` are not part of the signature.
fn sign(params: &BTreeMap<&str, String>, secret: &str) -> String {
    let mut input = String::new();
    for (key, value) in params {
        if *key == "format" || *key == "callback" {
            continue;
        }
        input.push_str(key);
        input.push_str(value);
    }
    input.push_str(secret);
    format!("{:x}", md5::compute(input.as_bytes()))
}

fn read_response(
    method: &str,
    response: reqwest::Result<reqwest::blocking::Response>,
) -> Result<Value> {
    let response = response.map_err(|e| transport_error(method, e))?;
    let status = response.status();
    let text = response.text().map_err(|e| transport_error(method, e))?;

    match serde_json::from_str::<Value>(&text) {
        Ok(body) => {
            if let Some(code) = body.get("error").and_then(Value::as_i64) {
                let message = body
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                return Err(classify_api_error(method, code, message));
            }
            if status.is_success() {
                Ok(body)
            } else {
                Err(classify_status(method, status))
            }
        }
        Err(_) if !status.is_success() => Err(classify_status(method, status)),
        Err(e) => Err(ScrobblerError::with_source(
            ErrorCode::UnknownError,
            format!("{}: unreadable response", method),
            e,
        )),
    }
}

fn transport_error(method: &str, e: reqwest::Error) -> ScrobblerError {
    let code = if e.is_connect() || e.is_timeout() {
        ErrorCode::ServiceOffline
    } else {
        ErrorCode::UnknownError
    };
    ScrobblerError::with_source(code, format!("{}: request failed", method), e)
}

fn classify_status(method: &str, status: reqwest::StatusCode) -> ScrobblerError {
    let message = format!("{}: HTTP {}", method, status);
    if status.is_server_error() {
        ScrobblerError::service_unavailable(message)
    } else {
        ScrobblerError::unknown(message)
    }
}

fn classify_api_error(method: &str, code: i64, message: &str) -> ScrobblerError {
    let message = format!("{}: Last.fm error {}: {}", method, code, message);
    match code {
        api_error::INVALID_PARAMETERS => ScrobblerError::invalid_parameters(message),
        api_error::SERVICE_OFFLINE => ScrobblerError::service_offline(message),
        api_error::TEMPORARY_ERROR
        | api_error::OPERATION_FAILED
        | api_error::RATE_LIMIT_EXCEEDED => ScrobblerError::service_unavailable(message),
        _ => ScrobblerError::unknown(message),
    }
}

fn as_count(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

fn array_or_single(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item @ Value::Object(_)) => vec![item],
        _ => Vec::new(),
    }
}

fn parse_track_list(value: Option<&Value>) -> Vec<RemoteTrack> {
    array_or_single(value)
        .into_iter()
        .filter_map(|track| {
            let title = track.get("name")?.as_str()?;
            let artist = match track.get("artist")? {
                Value::String(name) => name.as_str(),
                other => other.get("name")?.as_str()?,
            };
            Some(RemoteTrack::new(artist, title))
        })
        .collect()
}
