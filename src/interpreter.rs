//! Turn raw model output into an [`ActionRequest`].
//!
//! Model output is not guaranteed to be pure JSON, so the payload is taken
//! from the first `{` through the last `}`. This tolerates commentary before
//! and after the object but breaks when the text holds several objects or a
//! brace inside a string value. Anything that does not decode is reported as
//! [`Interpretation::Unparsed`] instead of an error.

use serde_json::{Map, Value};

use crate::prompt::{IM_END, IM_START};

/// Reporting period for `get_total_expense`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Period {
    ThisMonth,
    LastMonth,
    ThisYear,
    Other(String),
}

impl Period {
    fn from_wire(value: &str) -> Self {
        match value {
            "this_month" => Period::ThisMonth,
            "last_month" => Period::LastMonth,
            "this_year" => Period::ThisYear,
            other => Period::Other(other.to_string()),
        }
    }
}

/// Parameters shared by `add_expense` and `add_income`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionParams {
    /// Left as raw JSON: models emit both numbers and strings here.
    pub amount: Option<Value>,
    pub category: Option<String>,
    pub note: Option<String>,
}

/// One parsed user turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionRequest {
    AddExpense(TransactionParams),
    AddIncome(TransactionParams),
    GetTotalExpense { period: Option<Period> },
    GetBalance,
    Chat { message: Option<String> },
    Unknown { action: String, params: Map<String, Value> },
}

impl ActionRequest {
    /// Build a request from an action name and its params object.
    ///
    /// Returns `None` for an empty action name.
    pub fn from_parts(action: &str, params: Map<String, Value>) -> Option<Self> {
        let request = match action {
            "" => return None,
            "add_expense" => ActionRequest::AddExpense(TransactionParams::from_params(&params)),
            "add_income" => ActionRequest::AddIncome(TransactionParams::from_params(&params)),
            "get_total_expense" => ActionRequest::GetTotalExpense {
                period: string_param(&params, "period").map(|p| Period::from_wire(&p)),
            },
            "get_balance" => ActionRequest::GetBalance,
            "chat" => ActionRequest::Chat {
                message: string_param(&params, "message"),
            },
            other => ActionRequest::Unknown {
                action: other.to_string(),
                params,
            },
        };
        Some(request)
    }

    pub fn action_name(&self) -> &str {
        match self {
            ActionRequest::AddExpense(_) => "add_expense",
            ActionRequest::AddIncome(_) => "add_income",
            ActionRequest::GetTotalExpense { .. } => "get_total_expense",
            ActionRequest::GetBalance => "get_balance",
            ActionRequest::Chat { .. } => "chat",
            ActionRequest::Unknown { action, .. } => action,
        }
    }
}

impl TransactionParams {
    fn from_params(params: &Map<String, Value>) -> Self {
        Self {
            amount: params.get("amount").filter(|v| !v.is_null()).cloned(),
            category: string_param(params, "category"),
            note: string_param(params, "note").or_else(|| string_param(params, "message")),
        }
    }
}

fn string_param(params: &Map<String, Value>, key: &str) -> Option<String> {
    params.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Result of interpreting one model reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    /// `raw` is the decoded object exactly as the model sent it.
    Parsed { request: ActionRequest, raw: Value },
    Unparsed,
}

/// Remove leftover ChatML role markers.
pub fn strip_markers(text: &str) -> String {
    text.replace(IM_END, "").replace(IM_START, "")
}

/// Parse a model reply into an action request.
pub fn parse_response(raw: &str) -> Interpretation {
    let cleaned = strip_markers(raw);
    let response = cleaned.trim();

    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => {
            let json_str = &response[s..=e];
            match decode_request(json_str) {
                Some((request, raw)) => Interpretation::Parsed { request, raw },
                None => {
                    log::debug!("unusable JSON payload from model: {json_str}");
                    Interpretation::Unparsed
                }
            }
        }
        _ => Interpretation::Unparsed,
    }
}

fn decode_request(json_str: &str) -> Option<(ActionRequest, Value)> {
    let raw: Value = serde_json::from_str(json_str).ok()?;
    let object = raw.as_object()?;

    let action = object.get("action")?.as_str()?;
    let params = match object.get("params") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(params)) => params.clone(),
        Some(_) => return None,
    };

    let request = ActionRequest::from_parts(action, params)?;
    Some((request, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parsed(raw: &str) -> ActionRequest {
        match parse_response(raw) {
            Interpretation::Parsed { request, .. } => request,
            Interpretation::Unparsed => panic!("expected a parsed request from {raw:?}"),
        }
    }

    #[test]
    fn test_parse_chat() {
        let request = parsed(r#"{"action":"chat","params":{"message":"hi"}}"#);
        assert_eq!(
            request,
            ActionRequest::Chat {
                message: Some("hi".into())
            }
        );
    }

    #[test]
    fn test_parse_with_surrounding_text() {
        let request = parsed(
            r#"garbage {"action":"add_expense","params":{"amount":"40000","category":"Fuel","note":"gas"}} trailing"#,
        );
        assert_eq!(
            request,
            ActionRequest::AddExpense(TransactionParams {
                amount: Some(json!("40000")),
                category: Some("Fuel".into()),
                note: Some("gas".into()),
            })
        );
    }

    #[test]
    fn test_parse_strips_markers() {
        let request = parsed("<|im_start|>\n  {\"action\":\"get_balance\",\"params\":{}}<|im_end|>  ");
        assert_eq!(request, ActionRequest::GetBalance);
    }

    #[test]
    fn test_parse_without_json() {
        assert_eq!(parse_response(""), Interpretation::Unparsed);
        assert_eq!(parse_response("no braces here"), Interpretation::Unparsed);
        assert_eq!(parse_response("<|im_end|>"), Interpretation::Unparsed);
    }

    #[test]
    fn test_parse_reversed_braces() {
        assert_eq!(parse_response("} oops {"), Interpretation::Unparsed);
        assert_eq!(parse_response("only an opening {"), Interpretation::Unparsed);
    }

    #[test]
    fn test_parse_malformed_json() {
        assert_eq!(parse_response(r#"{"action": "chat", "params": }"#), Interpretation::Unparsed);
    }

    #[test]
    fn test_parse_wrong_shape() {
        assert_eq!(parse_response(r#"{"params":{}}"#), Interpretation::Unparsed);
        assert_eq!(parse_response(r#"{"action":"","params":{}}"#), Interpretation::Unparsed);
        assert_eq!(parse_response(r#"{"action":42}"#), Interpretation::Unparsed);
        assert_eq!(parse_response(r#"{"action":"chat","params":[1,2]}"#), Interpretation::Unparsed);
    }

    #[test]
    fn test_missing_params_default_to_empty() {
        assert_eq!(parsed(r#"{"action":"get_balance"}"#), ActionRequest::GetBalance);
        assert_eq!(
            parsed(r#"{"action":"self_destruct","params":null}"#),
            ActionRequest::Unknown {
                action: "self_destruct".into(),
                params: Map::new()
            }
        );
    }

    #[test]
    fn test_two_objects_break_the_slice() {
        // first `{` to last `}` spans both objects, which is not valid JSON
        let raw = r#"{"action":"get_balance"} and {"action":"chat"}"#;
        assert_eq!(parse_response(raw), Interpretation::Unparsed);
    }

    #[test]
    fn test_nested_braces_in_params() {
        let request = parsed(r#"Sure! {"action":"chat","params":{"message":"ok {fine}"}}"#);
        assert_eq!(
            request,
            ActionRequest::Chat {
                message: Some("ok {fine}".into())
            }
        );
    }

    #[test]
    fn test_period_parsing() {
        let request = parsed(r#"{"action":"get_total_expense","params":{"period":"last_month"}}"#);
        assert_eq!(
            request,
            ActionRequest::GetTotalExpense {
                period: Some(Period::LastMonth)
            }
        );

        let request = parsed(r#"{"action":"get_total_expense","params":{"period":"yesterday"}}"#);
        assert_eq!(
            request,
            ActionRequest::GetTotalExpense {
                period: Some(Period::Other("yesterday".into()))
            }
        );
    }

    #[test]
    fn test_note_falls_back_to_message() {
        let request = parsed(r#"{"action":"add_income","params":{"amount":5,"message":"tips"}}"#);
        assert_eq!(
            request,
            ActionRequest::AddIncome(TransactionParams {
                amount: Some(json!(5)),
                category: None,
                note: Some("tips".into()),
            })
        );
    }

    #[test]
    fn test_raw_keeps_what_the_model_sent() {
        let text = r#"{"action":"add_expense","params":{"amount":12,"category":5,"message":"taxi","date":"2024-05-01"}}"#;
        let Interpretation::Parsed { request, raw } = parse_response(text) else {
            panic!("expected a parsed request");
        };
        assert_eq!(
            raw,
            json!({"action": "add_expense", "params": {"amount": 12, "category": 5, "message": "taxi", "date": "2024-05-01"}})
        );
        assert_eq!(
            request,
            ActionRequest::AddExpense(TransactionParams {
                amount: Some(json!(12)),
                category: None,
                note: Some("taxi".into()),
            })
        );
    }
}
