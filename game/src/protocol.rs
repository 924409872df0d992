use std::convert::From;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::betting::Action;
use crate::model::Chips;
use crate::view::Snapshot;

/// Every possible kind of request that a client may send.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    /// Take a seat, or change name if already seated.
    Join(JoinRequest),
    SetReady(bool),
    /// Host only: clear the finished hand so a new one can be dealt.
    StartNextHand,
    /// Host only: back to idle, whatever the stage.
    ResetGame,
    Play(PlayRequest),
}

/// Every possible kind of response that a server may send.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Response {
    /// A line for the table log, sent to everyone.
    Message(String),
    /// The table as the receiving connection may see it.
    State(Snapshot),
    /// The receiver's last request was refused.
    ActionError(String),
}

// Auxillary macro for converting inner request/response types into their
// outermost counterparts.

macro_rules! derive_from {
    ($to:ident, $ty:ident, $r:ident) => {
        impl From<$r> for $to {
            fn from(r: $r) -> Self {
                $to::$ty(r)
            }
        }
    };
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct JoinRequest {
    pub name: String,
}

derive_from!(Request, Join, JoinRequest);

#[derive(Debug, Copy, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PlayRequest {
    Fold,
    Check,
    Call,
    Bet(Amount),
    /// Chips added this action: the call plus the raise.
    Raise(Amount),
}

derive_from!(Request, Play, PlayRequest);
derive_from!(Response, State, Snapshot);

impl From<PlayRequest> for Action {
    fn from(r: PlayRequest) -> Self {
        match r {
            PlayRequest::Fold => Action::Fold,
            PlayRequest::Check => Action::Check,
            PlayRequest::Call => Action::Call,
            PlayRequest::Bet(a) => Action::Bet(a.into()),
            PlayRequest::Raise(a) => Action::Raise(a.into()),
        }
    }
}

/// A chip amount as typed by a client.
///
/// Anything is accepted on the wire; see [`Amount::normalize`].
#[derive(Debug, Copy, Clone, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Amount(pub i64);

impl Amount {
    /// Whole chips from an arbitrary JSON value. Numbers and numeric strings
    /// are floored; negative, non-finite and non-numeric input is zero.
    pub fn normalize(value: &Value) -> Self {
        let n = match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(floor)),
            Value::String(s) => s.trim().parse::<f64>().ok().and_then(floor),
            _ => None,
        };
        Amount(n.unwrap_or(0).max(0))
    }
}

fn floor(f: f64) -> Option<i64> {
    if f.is_finite() {
        Some(f.floor() as i64)
    } else {
        None
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Amount::normalize(&value))
    }
}

impl From<Amount> for Chips {
    fn from(a: Amount) -> Self {
        Chips(a.0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn amount(v: Value) -> i64 {
        Amount::normalize(&v).0
    }

    #[test]
    fn amounts_are_floored_and_sanitized() {
        assert_eq!(amount(json!(40)), 40);
        assert_eq!(amount(json!(40.9)), 40);
        assert_eq!(amount(json!("25")), 25);
        assert_eq!(amount(json!(" 25.7 ")), 25);
        assert_eq!(amount(json!(-5)), 0);
        assert_eq!(amount(json!(1e30)), i64::MAX);
        assert_eq!(amount(json!("lots")), 0);
        assert_eq!(amount(json!("inf")), 0);
        assert_eq!(amount(json!("NaN")), 0);
        assert_eq!(amount(json!(null)), 0);
        assert_eq!(amount(json!([10])), 0);
        assert_eq!(amount(json!({ "chips": 10 })), 0);
    }

    #[test]
    fn requests_decode_from_json() {
        let req: Request = serde_json::from_str(r#"{"join":{"name":"ana"}}"#).unwrap();
        assert_eq!(
            req,
            JoinRequest {
                name: "ana".into()
            }
            .into()
        );

        let req: Request = serde_json::from_str(r#"{"setReady":true}"#).unwrap();
        assert_eq!(req, Request::SetReady(true));

        let req: Request = serde_json::from_str(r#""startNextHand""#).unwrap();
        assert_eq!(req, Request::StartNextHand);

        let req: Request = serde_json::from_str(r#"{"play":"fold"}"#).unwrap();
        assert_eq!(req, PlayRequest::Fold.into());

        let req: Request = serde_json::from_str(r#"{"play":{"raise":"60.5"}}"#).unwrap();
        assert_eq!(req, PlayRequest::Raise(Amount(60)).into());
    }

    #[test]
    fn play_requests_become_actions() {
        assert_eq!(
            Action::from(PlayRequest::Bet(Amount(30))),
            Action::Bet(Chips(30))
        );
        assert_eq!(Action::from(PlayRequest::Call), Action::Call);
    }

    #[test]
    fn responses_encode_to_json() {
        let json = serde_json::to_value(Response::ActionError("it is not your turn".into())).unwrap();
        assert_eq!(json, json!({ "actionError": "it is not your turn" }));
        let json = serde_json::to_value(Response::Message("hi".into())).unwrap();
        assert_eq!(json, json!({ "message": "hi" }));
    }
}
