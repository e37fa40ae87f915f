use std::time::Duration;

use chrono::Utc;
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::reply::{ListReply, SaveOutcome, ScriptReply};
use super::ApiError;
use crate::config::ScriptEndpoints;
use crate::models::{
    CombinedOrder, ExpenseSubmission, FabricExpense, FabricOrder, NewWorker, OtherExpense,
    PaymentEntry, PaymentRecord, TailorOrder, Worker,
};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sent instead of `application/json` so the script host sees a simple request.
pub const JSON_AS_TEXT: &str = "text/plain;charset=UTF-8";

/// Text the script host emits when it fails to parse a body it already acted on.
const PARSE_FAILURE_MARKER: &str = "Unexpected token";

/// Client for one Apps Script web app deployment.
#[derive(Clone)]
pub struct ScriptClient {
    client: Client,
    script_url: String,
}

impl ScriptClient {
    pub fn new(script_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::NetworkError)?;
        Ok(Self::with_client(client, script_url))
    }

    /// Share one connection pool across several endpoints.
    pub fn with_client(client: Client, script_url: impl Into<String>) -> Self {
        Self {
            client,
            script_url: script_url.into(),
        }
    }

    pub fn script_url(&self) -> &str {
        &self.script_url
    }

    fn ensure_configured(&self) -> Result<(), ApiError> {
        if ScriptEndpoints::is_configured(&self.script_url) {
            Ok(())
        } else {
            Err(ApiError::NotConfigured(self.script_url.clone()))
        }
    }

    // ===== Transport =====

    async fn post_json<B: Serialize + ?Sized>(&self, body: &B) -> Result<(StatusCode, String), ApiError> {
        self.ensure_configured()?;
        let body = encode_json_body(body)?;
        debug!(url = %self.script_url, bytes = body.len(), "POST json");

        let response = self
            .client
            .post(&self.script_url)
            .header(header::CONTENT_TYPE, JSON_AS_TEXT)
            .body(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        Ok((status, text))
    }

    async fn post_form(&self, fields: &[(String, String)]) -> Result<(StatusCode, String), ApiError> {
        self.ensure_configured()?;
        debug!(url = %self.script_url, fields = fields.len(), "POST form");

        let response = self.client.post(&self.script_url).form(fields).send().await?;
        let status = response.status();
        let text = response.text().await?;
        Ok((status, text))
    }

    async fn get_action(&self, action: &str) -> Result<(StatusCode, String), ApiError> {
        self.ensure_configured()?;
        debug!(url = %self.script_url, action, "GET");

        let response = self
            .client
            .get(&self.script_url)
            .query(&[("action", action)])
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        Ok((status, text))
    }

    async fn get_list<T: DeserializeOwned>(&self, action: &str) -> Result<Vec<T>, ApiError> {
        let (status, text) = self.get_action(action).await?;
        if !status.is_success() {
            return Err(ApiError::from_status(status, &text));
        }
        let reply: ListReply<T> = serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!(
                "{}: {}",
                e,
                ApiError::truncate_body(&text)
            ))
        })?;
        reply.into_items()
    }

    // ===== Workers and payments =====

    pub async fn add_worker(&self, worker: &NewWorker) -> Result<ScriptReply, ApiError> {
        #[derive(Serialize)]
        struct Body<'a> {
            action: &'static str,
            #[serde(flatten)]
            worker: &'a NewWorker,
        }

        let (status, text) = self
            .post_json(&Body { action: "addWorker", worker })
            .await?;
        let reply = parse_reply(status, &text)?.into_result()?;
        info!(name = %worker.name, "Worker added");
        Ok(reply)
    }

    pub async fn get_workers(&self) -> Result<Vec<Worker>, ApiError> {
        self.get_list("getWorkers").await
    }

    pub async fn get_worker_names(&self) -> Result<Vec<String>, ApiError> {
        self.get_list("getWorkerNames").await
    }

    pub async fn add_payment(&self, entry: &PaymentEntry) -> Result<ScriptReply, ApiError> {
        #[derive(Serialize)]
        struct Body<'a> {
            action: &'static str,
            #[serde(flatten)]
            entry: &'a PaymentEntry,
        }

        let (status, text) = self
            .post_json(&Body { action: "addPayment", entry })
            .await?;
        let reply = parse_reply(status, &text)?.into_result()?;
        info!(worker = %entry.worker_name, "Payment recorded");
        Ok(reply)
    }

    pub async fn get_payment_history(&self) -> Result<Vec<PaymentRecord>, ApiError> {
        self.get_list("getPayments").await
    }

    // ===== Orders =====

    pub async fn submit_fabric_order(&self, order: &FabricOrder) -> Result<ScriptReply, ApiError> {
        let (status, text) = self.post_form(&order.to_form_fields()).await?;
        let reply = parse_reply(status, &text)?.into_result()?;
        info!(order_id = %order.order_id, total = order.total(), "Fabric order submitted");
        Ok(reply)
    }

    pub async fn submit_tailor_order(&self, order: &TailorOrder) -> Result<SaveOutcome, ApiError> {
        let payload = order.to_payload(&Utc::now().to_rfc3339());
        let (status, text) = self.post_json(&payload).await?;
        let outcome = parse_save(status, &text)?;
        info!(order_id = %order.order_id, outcome = ?outcome_kind(&outcome), "Tailor order submitted");
        Ok(outcome)
    }

    pub async fn submit_combined_order(&self, order: &CombinedOrder) -> Result<SaveOutcome, ApiError> {
        let (status, text) = self.post_json(order).await?;
        let outcome = parse_combined_save(status, &text)?;
        info!(
            combined_id = %order.combined_order_id,
            total = order.total_amount,
            outcome = ?outcome_kind(&outcome),
            "Combined order submitted"
        );
        Ok(outcome)
    }

    // ===== Expenses =====

    pub async fn submit_fabric_expense(&self, expense: &FabricExpense) -> Result<SaveOutcome, ApiError> {
        let (status, text) = self
            .post_json(&ExpenseSubmission::Fabric(expense.clone()))
            .await?;
        parse_save(status, &text)
    }

    pub async fn submit_other_expense(&self, expense: &OtherExpense) -> Result<SaveOutcome, ApiError> {
        let (status, text) = self
            .post_json(&ExpenseSubmission::Other(expense.clone()))
            .await?;
        parse_save(status, &text)
    }
}

/// One client per configured script, sharing a connection pool.
#[derive(Clone)]
pub struct ScriptClients {
    pub workers: ScriptClient,
    pub fabric_orders: ScriptClient,
    pub tailor_orders: ScriptClient,
    pub combined_orders: ScriptClient,
    pub expenses: ScriptClient,
}

impl ScriptClients {
    pub fn new(endpoints: &ScriptEndpoints, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::NetworkError)?;
        Ok(Self {
            workers: ScriptClient::with_client(client.clone(), &endpoints.workers),
            fabric_orders: ScriptClient::with_client(client.clone(), &endpoints.fabric_orders),
            tailor_orders: ScriptClient::with_client(client.clone(), &endpoints.tailor_orders),
            combined_orders: ScriptClient::with_client(client.clone(), &endpoints.combined_orders),
            expenses: ScriptClient::with_client(client, &endpoints.expenses),
        })
    }
}

// ===== Response handling =====

/// Serialize a body for the `text/plain` POST; the script parses it back with `JSON.parse`.
pub fn encode_json_body<B: Serialize + ?Sized>(body: &B) -> Result<String, ApiError> {
    serde_json::to_string(body)
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to encode request body: {}", e)))
}

/// Strict parsing: non-2xx and non-JSON bodies are errors.
pub fn parse_reply(status: StatusCode, text: &str) -> Result<ScriptReply, ApiError> {
    if !status.is_success() {
        return Err(ApiError::from_status(status, text));
    }
    serde_json::from_str(text).map_err(|e| {
        ApiError::InvalidResponse(format!(
            "Invalid JSON response from server ({}): {}",
            e,
            ApiError::truncate_body(text)
        ))
    })
}

/// Lenient parsing for saves: an OK status with an unreadable body counts as saved.
pub fn parse_save(status: StatusCode, text: &str) -> Result<SaveOutcome, ApiError> {
    if !status.is_success() {
        return Err(ApiError::from_status(status, text));
    }
    match serde_json::from_str::<ScriptReply>(text) {
        Ok(reply) => reply.into_result().map(SaveOutcome::Saved),
        Err(e) => {
            warn!(error = %e, "Non-JSON reply to a save, assuming it was written");
            Ok(SaveOutcome::AssumedSaved {
                raw: ApiError::truncate_body(text),
            })
        }
    }
}

/// Like [`parse_save`], but a script-side JSON parse error is reported as likely saved.
pub fn parse_combined_save(status: StatusCode, text: &str) -> Result<SaveOutcome, ApiError> {
    match parse_save(status, text) {
        Err(ApiError::Rejected(error)) if error.contains(PARSE_FAILURE_MARKER) => {
            warn!(%error, "Script reported a parse error after saving");
            Ok(SaveOutcome::LikelySaved { error })
        }
        other => other,
    }
}

fn outcome_kind(outcome: &SaveOutcome) -> &'static str {
    match outcome {
        SaveOutcome::Saved(_) => "saved",
        SaveOutcome::AssumedSaved { .. } => "assumed",
        SaveOutcome::LikelySaved { .. } => "likely",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentStatus;

    fn combined() -> CombinedOrder {
        CombinedOrder {
            customer_name: "Meera \"Didi\" Rao".to_string(),
            contact: "98450 12345".to_string(),
            customer_type: "Regular".to_string(),
            order_date: "2025-03-14".to_string(),
            sessions: "Wedding".to_string(),
            notes: "Line one\nLine two — ₹ symbol".to_string(),
            address: "12, MG Road".to_string(),
            fabric_order_id: "F-CMB1741939200000042".to_string(),
            fabric_price: 1250.5,
            tailoring_order_id: "T-CMB1741939200000042".to_string(),
            tailoring_price: 900.0,
            total_amount: 2150.5,
            paid_status: PaymentStatus::Partial,
            combined_order_id: "C-CMB1741939200000042".to_string(),
            master_order_id: "CMB1741939200000042".to_string(),
            timestamp: "2025-03-14T10:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_json_body_round_trips_through_text() {
        let order = combined();
        let body = encode_json_body(&order).unwrap();
        let parsed: CombinedOrder = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed, order);
    }

    #[test]
    fn test_strict_parse_rejects_html() {
        let err = parse_reply(StatusCode::OK, "<html>Moved</html>").unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(m) if m.contains("Invalid JSON")));
    }

    #[test]
    fn test_non_ok_status_is_error_even_when_lenient() {
        let err = parse_save(StatusCode::INTERNAL_SERVER_ERROR, "boom").unwrap_err();
        assert!(matches!(err, ApiError::ServerError(b) if b == "boom"));
    }

    #[test]
    fn test_lenient_parse_assumes_saved() {
        let outcome = parse_save(StatusCode::OK, "").unwrap();
        assert!(matches!(outcome, SaveOutcome::AssumedSaved { .. }));

        let outcome = parse_save(StatusCode::OK, r#"{"success": true, "message": "Row added"}"#).unwrap();
        assert_eq!(outcome.message(), "Row added");
    }

    #[test]
    fn test_lenient_parse_still_surfaces_rejections() {
        let err = parse_save(StatusCode::OK, r#"{"success": false, "error": "Missing supplier"}"#).unwrap_err();
        assert!(matches!(err, ApiError::Rejected(m) if m == "Missing supplier"));
    }

    #[test]
    fn test_combined_parse_error_is_likely_saved() {
        let text = r#"{"success": false, "error": "SyntaxError: Unexpected token < in JSON"}"#;
        let outcome = parse_combined_save(StatusCode::OK, text).unwrap();
        assert!(matches!(outcome, SaveOutcome::LikelySaved { error } if error.contains("Unexpected token")));

        let text = r#"{"success": false, "error": "Sheet not found"}"#;
        assert!(parse_combined_save(StatusCode::OK, text).is_err());
    }

    #[tokio::test]
    async fn test_placeholder_endpoint_is_refused_before_sending() {
        let client = ScriptClient::new(ScriptEndpoints::default().tailor_orders, DEFAULT_TIMEOUT).unwrap();
        let err = client.get_workers().await.unwrap_err();
        assert!(matches!(err, ApiError::NotConfigured(_)));
    }
}
