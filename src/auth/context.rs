use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request-scoped authentication state: the decoded token payload, if any.
///
/// Token verification happens before the engine is called; the engine only
/// reads claims. Claims that are absent (or `null`) are treated as `NULL`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthContext {
    #[serde(default)]
    pub jwt: Option<Map<String, Value>>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self { jwt: None }
    }

    /// Authenticated context from a claim object. Anything but an object is
    /// treated as an anonymous request.
    pub fn with_claims(claims: Value) -> Self {
        match claims {
            Value::Object(map) => Self { jwt: Some(map) },
            _ => Self::anonymous(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.jwt.is_some()
    }

    pub fn claims(&self) -> Option<&Map<String, Value>> {
        self.jwt.as_ref()
    }

    /// Claim value at `path`; `None` when any segment is missing or the value is null.
    pub fn claim(&self, path: &[String]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.jwt.as_ref()?.get(first)?;
        for segment in rest {
            current = current.as_object()?.get(segment)?;
        }
        if current.is_null() {
            None
        } else {
            Some(current)
        }
    }
}
