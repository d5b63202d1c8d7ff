//! Chat turns read from the command line or a JSON-lines script

use anyhow::{bail, Context, Result};
use okr_dispatch::{ParamEnum, ParameterBag, Role, UserContext};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Caller identity used when a turn does not carry its own
#[derive(Debug, Clone)]
pub(crate) struct DefaultUser {
    pub(crate) user_id: String,
    pub(crate) organization_id: String,
    pub(crate) role: Role,
}

impl DefaultUser {
    pub(crate) fn context(&self) -> UserContext {
        UserContext::new(self.user_id.clone(), self.organization_id.clone(), self.role)
    }
}

/// One scripted turn
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Turn {
    pub(crate) conversation_id: String,
    pub(crate) intent: String,
    pub(crate) params: ParameterBag,
    pub(crate) user: UserContext,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTurn {
    conversation_id: String,
    intent: String,
    #[serde(default)]
    params: Map<String, Value>,
    user: Option<UserContext>,
}

/// Parse a `--role` value
pub(crate) fn parse_role(raw: &str) -> Result<Role> {
    match Role::parse_param(raw) {
        Some(role) => Ok(role),
        None => bail!("unknown role '{raw}', expected one of Admin, Manager, Member, Viewer"),
    }
}

/// Parse repeated `key=value` arguments
pub(crate) fn parse_pairs<'a>(pairs: impl IntoIterator<Item = &'a String>) -> Result<ParameterBag> {
    let mut params = ParameterBag::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("parameter '{pair}' is not in key=value form");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("parameter '{pair}' has an empty key");
        }
        params.insert(key, value);
    }
    Ok(params)
}

/// Scalars become their textual form; `null` drops the key
fn stringify(params: Map<String, Value>) -> ParameterBag {
    params
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(text) => Some((key, text)),
            other => Some((key, other.to_string())),
        })
        .collect()
}

/// Parse one JSON line; `None` for blank lines and `#` comments
pub(crate) fn parse_line(line: &str, fallback: &DefaultUser) -> Result<Option<Turn>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let raw: RawTurn = serde_json::from_str(line).context("turn is not valid JSON")?;
    Ok(Some(Turn {
        conversation_id: raw.conversation_id,
        intent: raw.intent,
        params: stringify(raw.params),
        user: raw.user.unwrap_or_else(|| fallback.context()),
    }))
}
