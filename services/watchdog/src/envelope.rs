//! Standard response envelope returned by the platform API
//!
//! Every endpoint wraps its payload as `{ "success": bool, "response": T, "error": string }`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub response: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    /// Convert into the payload, turning `success: false` into an API error
    pub fn into_result(self) -> crate::Result<Option<T>> {
        if self.success {
            Ok(self.response)
        } else {
            Err(crate::WatchdogError::Api(
                self.error
                    .unwrap_or_else(|| "request was not successful".to_string()),
            ))
        }
    }
}

/// Parse a response body as an envelope
pub fn parse<T>(body: &str) -> crate::Result<Envelope<T>>
where
    T: for<'de> Deserialize<'de>,
{
    Ok(serde_json::from_str(body)?)
}

/// Read only the `success` flag, ignoring the payload.
///
/// Returns `None` when the body is not an envelope at all.
pub fn success_flag(body: &str) -> Option<bool> {
    #[derive(Deserialize)]
    struct Flag {
        success: bool,
    }

    serde_json::from_str::<Flag>(body).ok().map(|f| f.success)
}
