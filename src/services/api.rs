use std::convert::Infallible;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{error, info, warn};
use warp::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::commands::report_format::report_lines;
use crate::domain::scenario::{ScenarioPayload, ScenarioValidationError};
use crate::services::report_pdf::{render_report_pdf, report_file_name};
use crate::services::roi_calculator::calculate_roi;
use crate::services::scenario_store::{ScenarioStore, ScenarioStoreError};

const MAX_BODY_BYTES: u64 = 64 * 1024;

pub type SharedStore = Arc<dyn ScenarioStore>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Email required")]
    EmailRequired,
    #[error("{0}")]
    Validation(#[from] ScenarioValidationError),
    #[error("Scenario not found")]
    ScenarioNotFound,
    #[error("{0}")]
    Storage(#[from] ScenarioStoreError),
    #[error("Request body deserialize error: {0}")]
    Body(#[from] serde_json::Error),
    #[error("scenario store task failed: {0}")]
    Task(#[from] JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::EmailRequired | ApiError::Validation(_) | ApiError::Body(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::ScenarioNotFound => StatusCode::NOT_FOUND,
            ApiError::Storage(_) | ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_response(self) -> Response {
        if matches!(self, ApiError::Storage(_) | ApiError::Task(_)) {
            error!(error = %self, "scenario store failure");
        }
        error_response(self.status(), &self.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

#[derive(Serialize)]
struct MessageBody<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    warp::reply::with_status(warp::reply::json(&ErrorBody { error: message }), status)
        .into_response()
}

fn message_response(status: StatusCode, message: &str, id: Option<i64>) -> Response {
    warp::reply::with_status(warp::reply::json(&MessageBody { message, id }), status)
        .into_response()
}

/// All HTTP routes, with rejections rendered as JSON errors and a tracing
/// span around every request.
pub fn api(store: SharedStore) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    routes(store)
        .recover(handle_rejection)
        .with(warp::trace::request())
}

pub fn routes(store: SharedStore) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let simulate = warp::path!("simulate")
        .and(warp::post())
        .and(json_body())
        .and_then(simulate_handler);

    let create = warp::path!("scenarios")
        .and(warp::post())
        .and(json_body())
        .and(with_store(store.clone()))
        .and_then(create_scenario_handler);

    let list = warp::path!("scenarios")
        .and(warp::get())
        .and(with_store(store.clone()))
        .and_then(list_scenarios_handler);

    let get = warp::path!("scenarios" / String)
        .and(warp::get())
        .and(with_store(store.clone()))
        .and_then(get_scenario_handler);

    let delete = warp::path!("scenarios" / String)
        .and(warp::delete())
        .and(with_store(store))
        .and_then(delete_scenario_handler);

    let report = warp::path!("report" / "generate")
        .and(warp::post())
        .and(json_value_body())
        .and_then(generate_report_handler);

    simulate
        .or(create)
        .or(list)
        .or(get)
        .or(delete)
        .or(report)
}

fn with_store(store: SharedStore) -> impl Filter<Extract = (SharedStore,), Error = Infallible> + Clone {
    warp::any().map(move || store.clone())
}

fn json_body() -> impl Filter<Extract = (ScenarioPayload,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn json_value_body() -> impl Filter<Extract = (Value,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// Runs a store call on the blocking pool; SQLite may wait on its busy timeout.
async fn run_blocking<T, F>(store: SharedStore, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&dyn ScenarioStore) -> Result<T, ScenarioStoreError> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || op(store.as_ref())).await?;
    Ok(result?)
}

// Ids that are not integers cannot name a stored row.
fn parse_id(segment: &str) -> Option<i64> {
    segment.parse().ok()
}

async fn simulate_handler(payload: ScenarioPayload) -> Result<Response, Infallible> {
    Ok(simulate(&payload).unwrap_or_else(ApiError::into_response))
}

fn simulate(payload: &ScenarioPayload) -> Result<Response, ApiError> {
    let scenario = payload.validate()?;
    let result = calculate_roi(&scenario.input);
    Ok(warp::reply::json(&result).into_response())
}

async fn create_scenario_handler(
    payload: ScenarioPayload,
    store: SharedStore,
) -> Result<Response, Infallible> {
    Ok(create_scenario(&payload, store)
        .await
        .unwrap_or_else(ApiError::into_response))
}

async fn create_scenario(payload: &ScenarioPayload, store: SharedStore) -> Result<Response, ApiError> {
    let scenario = payload.validate()?;
    let name = scenario.scenario_name.clone();
    let id = run_blocking(store, move |store| store.create(&scenario)).await?;
    info!(id, name = %name, "scenario saved");
    Ok(message_response(StatusCode::CREATED, "Scenario saved", Some(id)))
}

async fn list_scenarios_handler(store: SharedStore) -> Result<Response, Infallible> {
    let response = run_blocking(store, |store| store.list())
        .await
        .map(|summaries| warp::reply::json(&summaries).into_response());
    Ok(response.unwrap_or_else(ApiError::into_response))
}

async fn get_scenario_handler(id: String, store: SharedStore) -> Result<Response, Infallible> {
    Ok(get_scenario(&id, store)
        .await
        .unwrap_or_else(ApiError::into_response))
}

async fn get_scenario(id: &str, store: SharedStore) -> Result<Response, ApiError> {
    let id = parse_id(id).ok_or(ApiError::ScenarioNotFound)?;
    match run_blocking(store, move |store| store.get(id)).await? {
        Some(scenario) => Ok(warp::reply::json(&scenario).into_response()),
        None => Err(ApiError::ScenarioNotFound),
    }
}

async fn delete_scenario_handler(id: String, store: SharedStore) -> Result<Response, Infallible> {
    Ok(delete_scenario(&id, store)
        .await
        .unwrap_or_else(ApiError::into_response))
}

async fn delete_scenario(id: &str, store: SharedStore) -> Result<Response, ApiError> {
    match parse_id(id) {
        Some(id) => {
            let removed = run_blocking(store, move |store| store.delete(id)).await?;
            info!(id, removed, "scenario delete requested");
        }
        None => info!(id, removed = false, "scenario delete requested"),
    }
    Ok(message_response(StatusCode::OK, "Scenario deleted", None))
}

async fn generate_report_handler(body: Value) -> Result<Response, Infallible> {
    Ok(generate_report(body).unwrap_or_else(ApiError::into_response))
}

fn generate_report(body: Value) -> Result<Response, ApiError> {
    if report_email(&body).is_none() {
        return Err(ApiError::EmailRequired);
    }
    let payload: ScenarioPayload = serde_json::from_value(body)?;
    let scenario = payload.validate()?;
    let result = calculate_roi(&scenario.input);
    let lines = report_lines(&scenario.scenario_name, &scenario.input, &result);
    let pdf = render_report_pdf(&lines, Utc::now());
    info!(bytes = pdf.len(), name = %scenario.scenario_name, "report generated");

    let disposition = format!(
        "attachment; filename={}",
        report_file_name(&scenario.scenario_name)
    );
    let reply = warp::reply::with_header(pdf, CONTENT_TYPE, "application/pdf");
    Ok(warp::reply::with_header(reply, CONTENT_DISPOSITION, disposition).into_response())
}

/// The report recipient, if one was given. Blank and non-string values count
/// as missing.
fn report_email(body: &Value) -> Option<&str> {
    body.get("email")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|email| !email.is_empty())
}

async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large".to_string())
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Expected a JSON body".to_string(),
        )
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "Length required".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        warn!(rejection = ?err, "unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };
    Ok(error_response(status, &message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scenario::{NewScenario, Scenario, ScenarioSummary};
    use crate::services::sqlite_store::SqliteScenarioStore;
    use crate::test_support::{sample_input, sample_payload_json};
    use std::time::{Duration, Instant};

    fn test_store() -> SharedStore {
        let store = SqliteScenarioStore::in_memory().unwrap();
        store.migrate().unwrap();
        Arc::new(store)
    }

    fn body_json(body: &[u8]) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    #[tokio::test]
    async fn simulate_returns_roi_figures() {
        let filter = api(test_store());

        let res = warp::test::request()
            .method("POST")
            .path("/simulate")
            .json(&sample_payload_json("sim"))
            .reply(&filter)
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res.body());
        let monthly = body["monthly_savings"].as_f64().unwrap();
        assert!((monthly - 34100.0).abs() < 1e-6);
        assert_eq!(
            monthly,
            calculate_roi(&sample_input()).monthly_savings,
            "the JSON number carries every bit of the computed figure"
        );
        assert!((body["roi_percentage"].as_f64().unwrap() - 2355.2).abs() < 1e-6);
        assert!(body["payback_months"].as_f64().unwrap() > 1.46);
    }

    #[tokio::test]
    async fn simulate_rejects_missing_field() {
        let filter = api(test_store());
        let mut payload = sample_payload_json("sim");
        payload.as_object_mut().unwrap().remove("error_cost");

        let res = warp::test::request()
            .method("POST")
            .path("/simulate")
            .json(&payload)
            .reply(&filter)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(res.body())["error"],
            "missing required field: error_cost"
        );
    }

    #[tokio::test]
    async fn simulate_rejects_malformed_json() {
        let filter = api(test_store());

        let res = warp::test::request()
            .method("POST")
            .path("/simulate")
            .header("content-type", "application/json")
            .body("{not json")
            .reply(&filter)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(res.body())["error"].is_string());
    }

    #[tokio::test]
    async fn create_then_fetch_round_trips_fields() {
        let filter = api(test_store());

        let res = warp::test::request()
            .method("POST")
            .path("/scenarios")
            .json(&sample_payload_json("Round trip"))
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let created = body_json(res.body());
        assert_eq!(created["message"], "Scenario saved");
        let id = created["id"].as_i64().unwrap();

        let res = warp::test::request()
            .method("GET")
            .path(&format!("/scenarios/{id}"))
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let stored = body_json(res.body());
        assert_eq!(stored["id"], id);
        assert_eq!(stored["scenario_name"], "Round trip");
        assert_eq!(stored["monthly_invoice_volume"], 2000.0);
        assert_eq!(stored["avg_hours_per_invoice"], 0.17);
        assert_eq!(stored["error_rate_manual"], 0.5);
        assert_eq!(stored["one_time_implementation_cost"], 50000.0);
    }

    #[tokio::test]
    async fn get_unknown_scenario_returns_not_found() {
        let filter = api(test_store());

        let res = warp::test::request()
            .method("GET")
            .path("/scenarios/404")
            .reply(&filter)
            .await;

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(res.body())["error"], "Scenario not found");
    }

    #[tokio::test]
    async fn get_non_integer_id_returns_not_found() {
        let filter = api(test_store());

        for path in ["/scenarios/abc", "/scenarios/99999999999999999999"] {
            let res = warp::test::request()
                .method("GET")
                .path(path)
                .reply(&filter)
                .await;

            assert_eq!(res.status(), StatusCode::NOT_FOUND, "{path}");
            assert_eq!(body_json(res.body())["error"], "Scenario not found");
        }
    }

    #[tokio::test]
    async fn delete_removes_scenario_from_listing() {
        let store = test_store();
        let filter = api(store.clone());
        let keep = store
            .create(&crate::test_support::sample_scenario("keep"))
            .unwrap();
        let gone = store
            .create(&crate::test_support::sample_scenario("gone"))
            .unwrap();

        let res = warp::test::request()
            .method("DELETE")
            .path(&format!("/scenarios/{gone}"))
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res.body())["message"], "Scenario deleted");

        let res = warp::test::request()
            .method("GET")
            .path("/scenarios")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let listing = body_json(res.body());
        assert_eq!(listing, serde_json::json!([{ "id": keep, "scenario_name": "keep" }]));
    }

    #[tokio::test]
    async fn delete_absent_scenario_still_succeeds() {
        let filter = api(test_store());

        let res = warp::test::request()
            .method("DELETE")
            .path("/scenarios/12345")
            .reply(&filter)
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res.body())["message"], "Scenario deleted");
    }

    #[tokio::test]
    async fn delete_non_integer_id_still_succeeds() {
        let store = test_store();
        let filter = api(store.clone());
        let kept = store
            .create(&crate::test_support::sample_scenario("kept"))
            .unwrap();

        for path in ["/scenarios/abc", "/scenarios/99999999999999999999"] {
            let res = warp::test::request()
                .method("DELETE")
                .path(path)
                .reply(&filter)
                .await;

            assert_eq!(res.status(), StatusCode::OK, "{path}");
            assert_eq!(body_json(res.body())["message"], "Scenario deleted");
        }
        assert!(store.get(kept).unwrap().is_some());
    }

    #[tokio::test]
    async fn storage_failure_surfaces_raw_message() {
        // Never migrated, so every query fails.
        let store: SharedStore = Arc::new(SqliteScenarioStore::in_memory().unwrap());
        let filter = api(store);

        let res = warp::test::request()
            .method("GET")
            .path("/scenarios")
            .reply(&filter)
            .await;

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let message = body_json(res.body())["error"].as_str().unwrap().to_string();
        assert!(message.contains("no such table"));
    }

    #[tokio::test]
    async fn report_without_email_is_rejected() {
        let filter = api(test_store());

        let res = warp::test::request()
            .method("POST")
            .path("/report/generate")
            .json(&sample_payload_json("no email"))
            .reply(&filter)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res.body())["error"], "Email required");
        assert!(res.headers().get(CONTENT_DISPOSITION).is_none());
    }

    #[tokio::test]
    async fn report_checks_email_before_other_fields() {
        let filter = api(test_store());

        let res = warp::test::request()
            .method("POST")
            .path("/report/generate")
            .json(&serde_json::json!({ "scenario_name": "empty" }))
            .reply(&filter)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res.body())["error"], "Email required");
    }

    #[tokio::test]
    async fn report_checks_email_before_field_types() {
        let filter = api(test_store());

        for body in [
            serde_json::json!({ "monthly_invoice_volume": true }),
            serde_json::json!({ "scenario_name": ["x"], "num_ap_staff": {} }),
            serde_json::json!({ "email": 7, "error_cost": null }),
        ] {
            let res = warp::test::request()
                .method("POST")
                .path("/report/generate")
                .json(&body)
                .reply(&filter)
                .await;

            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(body_json(res.body())["error"], "Email required");
        }
    }

    #[tokio::test]
    async fn report_with_email_rejects_mistyped_fields() {
        let filter = api(test_store());
        let mut payload = sample_payload_json("typed");
        payload["email"] = Value::from("ap@example.com");
        payload["monthly_invoice_volume"] = Value::from(true);

        let res = warp::test::request()
            .method("POST")
            .path("/report/generate")
            .json(&payload)
            .reply(&filter)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(res.body())["error"],
            "field monthly_invoice_volume is not a number: true"
        );
    }

    #[tokio::test]
    async fn simulate_rejects_mistyped_field_with_field_name() {
        let filter = api(test_store());
        let mut payload = sample_payload_json("sim");
        payload["num_ap_staff"] = serde_json::json!([3]);

        let res = warp::test::request()
            .method("POST")
            .path("/simulate")
            .json(&payload)
            .reply(&filter)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(res.body())["error"],
            "field num_ap_staff is not a number: [3]"
        );
    }

    #[tokio::test]
    async fn report_returns_pdf_attachment() {
        let filter = api(test_store());
        let mut payload = sample_payload_json("Q4");
        payload["email"] = Value::from("ap@example.com");

        let res = warp::test::request()
            .method("POST")
            .path("/report/generate")
            .json(&payload)
            .reply(&filter)
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[CONTENT_TYPE], "application/pdf");
        assert_eq!(
            res.headers()[CONTENT_DISPOSITION],
            "attachment; filename=ROI_Report_Q4.pdf"
        );
        let body = String::from_utf8_lossy(res.body());
        assert!(body.starts_with("%PDF-"));
        assert!(body.contains("Monthly Savings: $34100.00"));
        assert!(body.contains("Payback Period"));
        assert!(body.contains(": 1.5"));
        assert!(body.contains("2355.2"));
    }

    #[test]
    fn report_email_ignores_blank_and_non_string_values() {
        assert_eq!(report_email(&serde_json::json!({})), None);
        assert_eq!(report_email(&serde_json::json!({ "email": "   " })), None);
        assert_eq!(report_email(&serde_json::json!({ "email": 42 })), None);
        assert_eq!(
            report_email(&serde_json::json!({ "email": " ap@example.com " })),
            Some("ap@example.com")
        );
    }

    struct SlowStore;

    impl ScenarioStore for SlowStore {
        fn create(&self, _scenario: &NewScenario) -> Result<i64, ScenarioStoreError> {
            Ok(1)
        }

        fn list(&self) -> Result<Vec<ScenarioSummary>, ScenarioStoreError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(Vec::new())
        }

        fn get(&self, _id: i64) -> Result<Option<Scenario>, ScenarioStoreError> {
            Ok(None)
        }

        fn delete(&self, _id: i64) -> Result<bool, ScenarioStoreError> {
            Ok(false)
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn slow_store_does_not_stall_other_requests() {
        let filter = api(Arc::new(SlowStore));
        let started = Instant::now();

        let listing = async {
            let res = warp::test::request()
                .method("GET")
                .path("/scenarios")
                .reply(&filter)
                .await;
            (res.status(), started.elapsed())
        };
        let simulation = async {
            let res = warp::test::request()
                .method("POST")
                .path("/simulate")
                .json(&sample_payload_json("meanwhile"))
                .reply(&filter)
                .await;
            (res.status(), started.elapsed())
        };

        let ((list_status, listed_after), (sim_status, simulated_after)) =
            tokio::join!(listing, simulation);

        assert_eq!(list_status, StatusCode::OK);
        assert_eq!(sim_status, StatusCode::OK);
        assert!(listed_after >= Duration::from_millis(300));
        assert!(simulated_after < listed_after);
    }

    #[tokio::test]
    async fn unknown_route_returns_json_not_found() {
        let filter = api(test_store());

        let res = warp::test::request()
            .method("GET")
            .path("/nothing/here")
            .reply(&filter)
            .await;

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(res.body())["error"], "Not found");
    }

    #[tokio::test]
    async fn serves_simulation_over_http() {
        let (addr, server) = warp::serve(api(test_store())).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/simulate"))
            .json(&sample_payload_json("over the wire"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        assert!((body["cumulative_savings"].as_f64().unwrap() - 1_227_600.0).abs() < 1e-6);
    }
}
