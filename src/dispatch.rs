//! Human-readable confirmation lines for parsed actions.
//!
//! Aggregate queries are answered with placeholders; nothing here touches a
//! ledger.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::interpreter::{strip_markers, ActionRequest, Interpretation};

pub const TOTAL_EXPENSE_PLACEHOLDER: &str = "Total expense this month: xxx đ 📊";
pub const BALANCE_PLACEHOLDER: &str = "Current balance: xxx đ 💳";
pub const NOT_UNDERSTOOD: &str = "I didn't understand that...";

/// What gets printed for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub headline: String,
    /// `[JSON: ..]` for parsed turns, `(Raw: ..)` for unparsed text.
    pub detail: Option<String>,
}

impl Reply {
    /// Build the reply for a model response, falling back to the raw text
    /// when it held no usable action.
    ///
    /// `fallback` is the category named for expenses that carry none.
    pub fn from_response(raw: &str, interpretation: &Interpretation, fallback: &str) -> Self {
        match interpretation {
            Interpretation::Parsed { request, raw: json } => Self {
                headline: describe(request, fallback),
                detail: Some(format!("[JSON: {json}]")),
            },
            Interpretation::Unparsed => {
                let clean = strip_markers(raw);
                let clean = clean.trim();
                Self {
                    headline: describe_unparsed(raw),
                    detail: (!clean.is_empty()).then(|| format!("(Raw: {clean})")),
                }
            }
        }
    }
}

pub fn describe(request: &ActionRequest, fallback: &str) -> String {
    match request {
        ActionRequest::AddExpense(params) => {
            let amount = params.amount.as_ref().map_or(0, coerce_amount);
            let category = params.category.as_deref().unwrap_or(fallback);
            format!("Recorded expense of {}đ in {category} 💸", format_thousands(amount))
        }
        ActionRequest::AddIncome(params) => {
            let amount = params.amount.as_ref().map_or(0, coerce_amount);
            format!("Recorded income of {}đ 💰", format_thousands(amount))
        }
        ActionRequest::GetTotalExpense { .. } => TOTAL_EXPENSE_PLACEHOLDER.to_string(),
        ActionRequest::GetBalance => BALANCE_PLACEHOLDER.to_string(),
        ActionRequest::Chat { message } => message.clone().unwrap_or_else(|| "...".to_string()),
        ActionRequest::Unknown { action, .. } => format!("Unrecognized action: {action}"),
    }
}

/// Headline for a reply that held no usable action.
pub fn describe_unparsed(raw: &str) -> String {
    let clean = strip_markers(raw);
    let clean = clean.trim();
    if clean.is_empty() {
        NOT_UNDERSTOOD.to_string()
    } else {
        clean.to_string()
    }
}

/// Coerce an `amount` param to a whole number, or 0 when it is not numeric.
///
/// Strings may use the shorthand the prompt asks the model to normalize:
/// `"$5"`, `"1,500"`, `"40k"`, `"1,5tr"`, `"5 triệu"`, `"2m"`. Other text is
/// stripped down to its digits, so `"40000đ"` reads as 40000.
pub fn coerce_amount(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => parse_amount_str(s).unwrap_or(0),
        _ => 0,
    }
}

fn amount_re() -> &'static Regex {
    static AMOUNT_RE: OnceLock<Regex> = OnceLock::new();
    AMOUNT_RE.get_or_init(|| {
        Regex::new(
            r"^(?:(?P<grouped>\d{1,3}(?:[.,]\d{3})+)|(?P<plain>\d+(?:[.,]\d{1,2})?))\s*(?P<unit>k|tr|triệu|m)?$",
        )
        .expect("valid regex")
    })
}

fn parse_amount_str(input: &str) -> Option<i64> {
    let lowered = input.trim().to_lowercase();
    let text = lowered.strip_prefix('$').unwrap_or(&lowered).trim();

    let amount = match amount_re().captures(text) {
        Some(caps) => {
            // `1.500` / `1,500` group thousands, `1,5` is a decimal comma
            let number: f64 = match (caps.name("grouped"), caps.name("plain")) {
                (Some(grouped), _) => grouped.as_str().replace([',', '.'], "").parse().ok()?,
                (None, Some(plain)) => plain.as_str().replace(',', ".").parse().ok()?,
                (None, None) => return None,
            };
            let multiplier = match caps.name("unit").map(|m| m.as_str()) {
                Some("k") => 1_000.0,
                Some("tr" | "triệu" | "m") => 1_000_000.0,
                _ => 1.0,
            };
            number * multiplier
        }
        None => {
            let digits: String = text
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            digits.parse().ok()?
        }
    };

    amount.is_finite().then(|| amount.round() as i64)
}

/// Format with `,` between groups of three digits.
pub fn format_thousands(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
