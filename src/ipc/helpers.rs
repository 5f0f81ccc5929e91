use crate::error::EngineError;
use crate::ipc::error::{engine_err, err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::Principal;
use crate::settings::AlternativesSettings;
use rusqlite::Connection;
use serde_json::json;

pub enum HandlerErr {
    Plain {
        code: &'static str,
        message: String,
        details: Option<serde_json::Value>,
    },
    Engine(EngineError),
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self::Plain {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        match self {
            Self::Plain {
                code,
                message,
                details,
            } => err(id, code, message, details),
            Self::Engine(e) => engine_err(id, &e),
        }
    }
}

impl From<EngineError> for HandlerErr {
    fn from(e: EngineError) -> Self {
        Self::Engine(e)
    }
}

pub type HandlerResult = Result<serde_json::Value, HandlerErr>;

pub fn respond(req: &Request, result: HandlerResult) -> serde_json::Value {
    match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    }
}

pub fn db(state: &AppState) -> Result<&Connection, HandlerErr> {
    state
        .db
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

/// Connection plus the acting principal, for read-only methods.
pub fn reader<'a>(state: &'a AppState) -> Result<(&'a Connection, Principal), HandlerErr> {
    let conn = db(state)?;
    let Some(session) = state.session.as_ref() else {
        return Err(HandlerErr::new("unauthenticated", "begin a session first"));
    };
    Ok((conn, session.principal().clone()))
}

/// Like [`reader`], but the request must echo the session's CSRF token.
pub fn writer<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<(&'a Connection, Principal), HandlerErr> {
    let (conn, principal) = reader(state)?;
    let token = req
        .params
        .get("csrfToken")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let valid = state
        .session
        .as_ref()
        .map(|s| s.validate_csrf(token))
        .unwrap_or(false);
    if !valid {
        return Err(HandlerErr::new("csrf_invalid", "missing or invalid csrfToken"));
    }
    Ok((conn, principal))
}

pub fn load_settings(conn: &Connection) -> Result<AlternativesSettings, HandlerErr> {
    AlternativesSettings::load(conn)
        .map_err(|e| HandlerErr::new("db_query_failed", format!("failed to read settings: {e}")))
}

pub fn param_i64(req: &Request, key: &str) -> Result<i64, HandlerErr> {
    req.params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn param_opt_i64(req: &Request, key: &str) -> Result<Option<i64>, HandlerErr> {
    match req.params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be an integer", key))),
    }
}

pub fn param_str<'a>(req: &'a Request, key: &str) -> Result<&'a str, HandlerErr> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn param_opt_str<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub fn param_bool(req: &Request, key: &str) -> Result<bool, HandlerErr> {
    req.params
        .get(key)
        .and_then(|v| v.as_bool())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn param_i64_list(req: &Request, key: &str) -> Result<Vec<i64>, HandlerErr> {
    let Some(items) = req.params.get(key).and_then(|v| v.as_array()) else {
        return Err(HandlerErr::bad_params(format!("missing {}", key)));
    };
    items
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_i64().ok_or_else(|| HandlerErr::Plain {
                code: "bad_params",
                message: format!("{} must contain only integers", key),
                details: Some(json!({ "index": i, "value": v })),
            })
        })
        .collect()
}

pub fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, HandlerErr> {
    serde_json::to_value(value)
        .map_err(|e| HandlerErr::new("internal", format!("failed to encode result: {e}")))
}
