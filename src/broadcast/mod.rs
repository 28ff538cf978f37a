pub(crate) mod document;
pub mod policy;
pub mod sink;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;

use crate::error::Error;
use document::ErrorDocument;
use policy::{MessageSource, RetryPolicy};
use sink::{DiagnosticSink, TracingSink, report};

/// What the broadcast loop should do next with a failed transaction.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    strum_macros::Display,
    strum_macros::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecoveryAction {
    /// Send the identical signed bytes again, possibly to another node.
    Resubmit,
    /// Rebuild from scratch with fresh reference block and expiration, re-sign, send.
    Reprepare,
    Abandon,
}

/// Interpretation of one error response returned by a failed broadcast.
///
/// Built once per failed attempt; classification never fails. Responses that
/// cannot be interpreted yield no parsed fields and every flag `false`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ErrorClassification {
    response: Option<Value>,
    error_code: Option<i64>,
    error_message: Option<String>,
    api_name: Option<Value>,
    api_method: Option<Value>,
    api_params: Option<Value>,
    transaction_id: Option<String>,
    expired: bool,
    retryable: bool,
    reprepareable: bool,
}

impl ErrorClassification {
    pub fn classify(response: Option<&Value>) -> Self {
        Self::classify_with(response, &TracingSink)
    }

    pub fn classify_with(response: Option<&Value>, sink: &dyn DiagnosticSink) -> Self {
        let Some(response) = response else {
            return Self::unclassified(None);
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| Self::interpret(response)))
            .unwrap_or_else(|_| {
                Err(Error::MalformedResponse {
                    reason: "panic while walking response".into(),
                })
            });

        outcome.unwrap_or_else(|fault| {
            report(sink, response, &fault);
            Self::unclassified(Some(response.clone()))
        })
    }

    /// Classifies a response still in its raw JSON text form.
    pub fn classify_json(raw: Option<&str>) -> Self {
        Self::classify_json_with(raw, &TracingSink)
    }

    pub fn classify_json_with(raw: Option<&str>, sink: &dyn DiagnosticSink) -> Self {
        let Some(raw) = raw else {
            return Self::unclassified(None);
        };
        match serde_json::from_str::<Value>(raw) {
            Ok(response) => Self::classify_with(Some(&response), sink),
            Err(err) => {
                let response = Value::String(raw.to_string());
                report(sink, &response, &Error::from(err));
                Self::unclassified(Some(response))
            }
        }
    }

    fn interpret(response: &Value) -> Result<Self, Error> {
        let doc = ErrorDocument::from_response(response)?;
        let error_code = doc.code();
        let api_name = doc.call_origin();
        let formats = doc.formats();
        let decision = policy::decide(error_code, api_name, &formats);

        let error_message = match decision.message {
            MessageSource::StackFormats => Some(doc.joined_formats()),
            MessageSource::DataMessage => doc.message().map(str::to_string),
        };

        Ok(Self {
            response: Some(response.clone()),
            error_code,
            error_message,
            api_name: api_name.cloned(),
            api_method: None,
            api_params: None,
            transaction_id: doc.transaction_id(),
            expired: decision.policy.expired,
            retryable: decision.policy.retryable,
            reprepareable: decision.policy.reprepareable,
        })
    }

    fn unclassified(response: Option<Value>) -> Self {
        let RetryPolicy {
            expired,
            retryable,
            reprepareable,
        } = RetryPolicy::ABANDON;
        Self {
            response,
            error_code: None,
            error_message: None,
            api_name: None,
            api_method: None,
            api_params: None,
            transaction_id: None,
            expired,
            retryable,
            reprepareable,
        }
    }

    /// The response as received, kept for diagnostics. Unparseable JSON text is
    /// kept as a string value.
    pub fn response(&self) -> Option<&Value> {
        self.response.as_ref()
    }

    pub fn error_code(&self) -> Option<i64> {
        self.error_code
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// `call.params` of the originating call, unsplit.
    pub fn api_name(&self) -> Option<&Value> {
        self.api_name.as_ref()
    }

    /// Never populated; the origin is carried whole by [`Self::api_name`].
    pub fn api_method(&self) -> Option<&Value> {
        self.api_method.as_ref()
    }

    /// Never populated; the origin is carried whole by [`Self::api_name`].
    pub fn api_params(&self) -> Option<&Value> {
        self.api_params.as_ref()
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn can_retry(&self) -> bool {
        self.retryable
    }

    pub fn can_reprepare(&self) -> bool {
        self.reprepareable
    }

    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            expired: self.expired,
            retryable: self.retryable,
            reprepareable: self.reprepareable,
        }
    }

    /// First thing to try after this failure.
    pub fn recommended_action(&self) -> RecoveryAction {
        if self.retryable {
            RecoveryAction::Resubmit
        } else {
            self.fallback_action()
        }
    }

    /// What to do once a resubmit of the same bytes has also failed.
    pub fn fallback_action(&self) -> RecoveryAction {
        if self.reprepareable {
            RecoveryAction::Reprepare
        } else {
            RecoveryAction::Abandon
        }
    }

    /// `"<code>: <message>"`, or just the code when there is no message.
    pub fn render(&self) -> String {
        let code = self.error_code.map(|c| c.to_string()).unwrap_or_default();
        match self.error_message.as_deref() {
            Some(message) if !message.is_empty() => format!("{code}: {message}"),
            _ => code,
        }
    }

    pub fn inspect(&self) -> String {
        format!("#<ErrorClassification [{self}]>")
    }
}

impl fmt::Display for ErrorClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
