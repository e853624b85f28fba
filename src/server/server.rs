use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{
    body::Incoming,
    header::{HeaderValue, CONTENT_TYPE},
    service::Service,
    Method, Request, Response, StatusCode,
};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};
use url_escape::decode;

use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};

use crate::{
    database::{sqlite::SqliteDatabase, store::NewStore},
    editor::{EditAction, EditMode, HoursEditor},
    error::{AppError, Result},
    legacy::text::{generate_legacy_text, parse_legacy_text},
    timing::{
        schedule::BusinessHoursData,
        time_slot::{require_time, time_options},
        weekday::Weekday,
    },
};

use super::myresponse::{EditResponse, HoursResponse, StoreResponse};

type HttpResponse = Response<Full<Bytes>>;

/// The Server
///
/// Handles every API endpoint. Storage is delegated to `SqliteDatabase` and the hours logic
/// to `BusinessHoursData`, the legacy codec and the editor; this struct only deals with
/// request parsing and turning results into JSON responses.
///
/// It implements hyper's `Service`, and is cloned for every connection.
#[derive(Clone)]
pub struct Server {
    connection_pool: Arc<Pool<SqliteConnectionManager>>,
}

/// Body of `POST /api/hours/edit`: the current hours plus the interactions to replay.
///
/// A record that has never been edited can send its `legacy_hours` text instead.
#[derive(Deserialize)]
struct EditRequest {
    #[serde(default)]
    business_hours: Value,
    #[serde(default)]
    legacy_hours: Option<String>,
    #[serde(default)]
    mode: EditMode,
    #[serde(default)]
    actions: Vec<EditAction>,
}

#[derive(Serialize)]
struct Created {
    id: i64,
}

impl Server {
    pub fn setup(connection_pool: Arc<Pool<SqliteConnectionManager>>) -> Self {
        Self { connection_pool }
    }

    /// Parses the query parameters and returns a `hashmap` of key pair values
    /// Returns `None` if the parameters are malformed
    fn parse_params(text: &str) -> Option<HashMap<String, String>> {
        let mut map: HashMap<String, String> = HashMap::new();
        for pairs in text.split('&').filter(|pair| !pair.is_empty()) {
            let mut iterator = pairs.split('=');
            map.insert(
                iterator.next()?.to_string(),
                decode(iterator.next()?).to_string(),
            );
        }
        Some(map)
    }

    fn params(query: Option<&str>) -> Result<HashMap<String, String>> {
        match query {
            None => Ok(HashMap::new()),
            Some(query) => Self::parse_params(query)
                .ok_or_else(|| AppError::BadRequest("Malformed Parameters.".to_string())),
        }
    }

    fn id_param(query: Option<&str>) -> Result<i64> {
        let params = Self::params(query)?;
        let Some(id) = params.get("id") else {
            return Err(AppError::BadRequest("id not provided.".to_string()));
        };
        id.parse()
            .map_err(|_| AppError::BadRequest("Malformed id.".to_string()))
    }

    /// Obtain a connection from the connection pool.
    fn get_connection(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.connection_pool.get()?)
    }

    fn json_body(body: &Bytes) -> Result<Value> {
        if body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(body)?)
    }

    /// GET /api/stores
    fn list_stores(&self) -> Result<HttpResponse> {
        let connection = self.get_connection()?;
        let stores: Vec<StoreResponse> = SqliteDatabase::query_all_stores(&connection)?
            .into_iter()
            .map(StoreResponse::new)
            .collect();
        Self::ok_data(&stores)
    }

    /// GET /api/stores/open?day=monday&time=12:00
    ///
    /// Both parameters are optional; see `SqliteDatabase::query_open_stores`.
    fn open_stores(&self, query: Option<&str>) -> Result<HttpResponse> {
        let params = Self::params(query)?;
        let day = match params.get("day").map(|day| day.trim()).filter(|day| !day.is_empty()) {
            Some(day) => Some(Weekday::from_key(day)?),
            None => None,
        };
        let time = match params.get("time").map(|time| time.trim()).filter(|time| !time.is_empty()) {
            Some(time) => Some(require_time(time)?),
            None => None,
        };
        let connection = self.get_connection()?;
        let stores: Vec<StoreResponse> = SqliteDatabase::query_open_stores(&connection, day, time)?
            .into_iter()
            .map(StoreResponse::new)
            .collect();
        Self::ok_data(&stores)
    }

    /// GET /api/store?id=1
    fn get_store(&self, query: Option<&str>) -> Result<HttpResponse> {
        let id = Self::id_param(query)?;
        let connection = self.get_connection()?;
        match SqliteDatabase::query_store(&connection, id)? {
            Some(store) => Self::ok_data(&StoreResponse::new(store)),
            None => Err(AppError::NotFound(format!("store {}", id))),
        }
    }

    /// POST /api/store
    ///
    /// Structured hours are sanitized. A record that only brings legacy text gets its
    /// structured hours parsed from it.
    fn create_store(&self, body: &Bytes) -> Result<HttpResponse> {
        let new_store: NewStore = serde_json::from_slice(body)?;
        let name = new_store.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("name not provided.".to_string()));
        }
        let business_hours = match (&new_store.business_hours, &new_store.legacy_hours) {
            (Some(raw), _) => BusinessHoursData::sanitize(raw),
            (None, Some(text)) => parse_legacy_text(text),
            (None, None) => BusinessHoursData::default(),
        };
        let connection = self.get_connection()?;
        let id = SqliteDatabase::insert_store(
            &connection,
            name,
            Some(&business_hours),
            new_store.legacy_hours.as_deref(),
        )?;
        info!("created store {} '{}'", id, name);
        Self::respond(StatusCode::CREATED, &Created { id })
    }

    /// PUT /api/store/hours?id=1
    fn replace_hours(&self, query: Option<&str>, body: &Bytes) -> Result<HttpResponse> {
        let id = Self::id_param(query)?;
        let business_hours = BusinessHoursData::sanitize(&Self::json_body(body)?);
        let connection = self.get_connection()?;
        if !SqliteDatabase::update_business_hours(&connection, id, &business_hours)? {
            return Err(AppError::NotFound(format!("store {}", id)));
        }
        Self::ok_data(&HoursResponse::new(business_hours))
    }

    /// POST /api/hours/sanitize
    fn sanitize_hours(body: &Bytes) -> Result<HttpResponse> {
        let business_hours = BusinessHoursData::sanitize(&Self::json_body(body)?);
        Self::ok_data(&HoursResponse::new(business_hours))
    }

    /// POST /api/hours/edit
    ///
    /// Replays editor actions on the given hours, in order, and reports which applied.
    fn edit_hours(body: &Bytes) -> Result<HttpResponse> {
        let request: EditRequest = serde_json::from_slice(body)?;
        let mut editor = match (&request.business_hours, &request.legacy_hours) {
            (Value::Null, Some(text)) => HoursEditor::from_legacy_text(text),
            (raw, _) => HoursEditor::new(BusinessHoursData::sanitize(raw)),
        };
        editor.set_mode(request.mode);
        let applied: Vec<bool> = request
            .actions
            .into_iter()
            .map(|action| editor.apply(action))
            .collect();
        Self::ok_data(&EditResponse::new(editor, applied))
    }

    /// POST /api/hours/legacy/parse, plain text body.
    fn parse_legacy(body: &Bytes) -> Result<HttpResponse> {
        let text = std::str::from_utf8(body)
            .map_err(|_| AppError::BadRequest("Body is not UTF-8.".to_string()))?;
        Self::ok_data(&HoursResponse::new(parse_legacy_text(text)))
    }

    /// POST /api/hours/legacy/generate, JSON body, plain text response.
    fn generate_legacy(body: &Bytes) -> Result<HttpResponse> {
        let business_hours = BusinessHoursData::sanitize(&Self::json_body(body)?);
        let mut res = Response::new(Full::new(Bytes::from(generate_legacy_text(&business_hours))));
        res.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        Ok(res)
    }

    /// Route a request whose body has already been read.
    pub fn handle(&self, method: &Method, path: &str, query: Option<&str>, body: Bytes) -> HttpResponse {
        let result = match (method, path) {
            (&Method::GET, "/api/stores") => self.list_stores(),
            (&Method::GET, "/api/stores/open") => self.open_stores(query),
            (&Method::GET, "/api/store") => self.get_store(query),
            (&Method::POST, "/api/store") => self.create_store(&body),
            (&Method::PUT, "/api/store/hours") => self.replace_hours(query, &body),
            (&Method::GET, "/api/hours/time-options") => Self::ok_data(&time_options()),
            (&Method::POST, "/api/hours/sanitize") => Self::sanitize_hours(&body),
            (&Method::POST, "/api/hours/edit") => Self::edit_hours(&body),
            (&Method::POST, "/api/hours/legacy/parse") => Self::parse_legacy(&body),
            (&Method::POST, "/api/hours/legacy/generate") => Self::generate_legacy(&body),
            _ => return Self::not_found(""),
        };
        result.unwrap_or_else(|err| Self::error_response(&err))
    }

    fn error_response(err: &AppError) -> HttpResponse {
        let status = match err {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidDay(_)
            | AppError::InvalidTime(_)
            | AppError::BadRequest(_)
            | AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Pool(_) | AppError::Io(_) => {
                error!("{}", err);
                return Self::server_error(&err.to_string());
            }
        };
        warn!("{}", err);
        Self::error_body(status, &err.to_string())
    }

    fn respond<T: Serialize>(status: StatusCode, body: &T) -> Result<HttpResponse> {
        let data = serde_json::to_vec(body)?;
        let mut res = Response::new(Full::new(Bytes::from(data)));
        *res.status_mut() = status;
        res.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(res)
    }

    /// Return a 200 OK response with the data provided.
    fn ok_data<T: Serialize>(body: &T) -> Result<HttpResponse> {
        Self::respond(StatusCode::OK, body)
    }

    fn error_body(status: StatusCode, message: &str) -> HttpResponse {
        let body = serde_json::json!({ "error": message }).to_string();
        let mut res = Response::new(Full::new(Bytes::from(body)));
        *res.status_mut() = status;
        res.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        res
    }

    /// Return a 500 Internal Server Error response with the message provided.
    fn server_error(message: &str) -> HttpResponse {
        Self::error_body(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Return a 404 Not Found response with the message provided. The message here is optional.
    /// Leave it empty for no message.
    fn not_found(message: &str) -> HttpResponse {
        if message.is_empty() {
            let mut res = Response::new(Full::new(Bytes::new()));
            *res.status_mut() = StatusCode::NOT_FOUND;
            return res;
        }
        Self::error_body(StatusCode::NOT_FOUND, message)
    }
}

impl Service<Request<Incoming>> for Server {
    type Response = HttpResponse;
    type Error = hyper::Error;
    type Future = Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let server = self.clone();
        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let body = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(err) => {
                    return Ok(Self::error_body(StatusCode::BAD_REQUEST, &err.to_string()));
                }
            };
            Ok(server.handle(&parts.method, parts.uri.path(), parts.uri.query(), body))
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn server() -> Server {
        let pool = Pool::builder()
            .max_size(1)
            .build(SqliteConnectionManager::memory())
            .unwrap();
        SqliteDatabase::create_tables(&pool.get().unwrap()).unwrap();
        Server::setup(Arc::new(pool))
    }

    async fn body_json(res: HttpResponse) -> Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(res: HttpResponse) -> String {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn post(server: &Server, path: &str, body: &str) -> HttpResponse {
        server.handle(&Method::POST, path, None, Bytes::from(body.to_string()))
    }

    #[test]
    fn params_are_decoded() {
        let params = Server::parse_params("day=monday&time=12%3A00").unwrap();
        assert_eq!(params["day"], "monday");
        assert_eq!(params["time"], "12:00");
        assert!(Server::parse_params("day").is_none());
    }

    #[tokio::test]
    async fn create_then_fetch_store() {
        let server = server();
        let res = post(
            &server,
            "/api/store",
            r#"{"name": "Curry House", "business_hours": {"monday": {"is_closed": true}}}"#,
        );
        assert_eq!(res.status(), StatusCode::CREATED);
        let id = body_json(res).await["id"].as_i64().unwrap();

        let res = server.handle(&Method::GET, "/api/store", Some(format!("id={}", id).as_str()), Bytes::new());
        assert_eq!(res.status(), StatusCode::OK);
        let store = body_json(res).await;
        assert_eq!(store["name"], "Curry House");
        assert_eq!(store["business_hours"]["monday"]["is_closed"], true);
        assert_eq!(store["business_hours"]["sunday"]["time_slots"], json!([]));
        assert_eq!(store["common_hours"]["closedDays"], json!(["monday"]));
        assert_eq!(store["display"][0], "月曜日: 定休日");
    }

    #[tokio::test]
    async fn create_from_legacy_text() {
        let server = server();
        let body = json!({ "name": "Kissaten", "legacy_hours": "定休日：水曜日\n8:00～18:00" });
        let res = post(&server, "/api/store", &body.to_string());
        let id = body_json(res).await["id"].as_i64().unwrap();

        let res = server.handle(&Method::GET, "/api/store", Some(format!("id={}", id).as_str()), Bytes::new());
        let store = body_json(res).await;
        assert_eq!(store["business_hours"]["wednesday"]["is_closed"], true);
        assert_eq!(
            store["business_hours"]["thursday"]["time_slots"][0]["open_time"],
            "08:00"
        );
        assert_eq!(store["legacy_hours"], "定休日：水曜日\n8:00～18:00");
    }

    #[tokio::test]
    async fn missing_store_is_404() {
        let server = server();
        let res = server.handle(&Method::GET, "/api/store", Some("id=42"), Bytes::new());
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(res).await["error"], "store 42 not found");

        let res = server.handle(&Method::PUT, "/api/store/hours", Some("id=42"), Bytes::from("{}"));
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_requests() {
        let server = server();
        let res = server.handle(&Method::GET, "/api/store", None, Bytes::new());
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = server.handle(&Method::GET, "/api/stores/open", Some("day=someday"), Bytes::new());
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = server.handle(&Method::GET, "/api/stores/open", Some("time=noon"), Bytes::new());
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = post(&server, "/api/store", r#"{"name": "  "}"#);
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = post(&server, "/api/hours/sanitize", "{oops");
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = server.handle(&Method::DELETE, "/api/store", None, Bytes::new());
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn replace_hours_and_search() {
        let server = server();
        let res = post(&server, "/api/store", r#"{"name": "Bistro"}"#);
        let id = body_json(res).await["id"].as_i64().unwrap();

        let hours = BusinessHoursData::uniform(crate::timing::time_slot::TimeSlot::new(
            "18:00", "23:00", "22:00",
        ));
        let res = server.handle(
            &Method::PUT,
            "/api/store/hours",
            Some(format!("id={}", id).as_str()),
            Bytes::from(serde_json::to_vec(&hours).unwrap()),
        );
        assert_eq!(res.status(), StatusCode::OK);

        let res = server.handle(
            &Method::GET,
            "/api/stores/open",
            Some("day=friday&time=19%3A30"),
            Bytes::new(),
        );
        let stores = body_json(res).await;
        assert_eq!(stores.as_array().unwrap().len(), 1);

        let res = server.handle(&Method::GET, "/api/stores/open", Some("time=22:30"), Bytes::new());
        assert_eq!(body_json(res).await, json!([]));
    }

    #[tokio::test]
    async fn sanitize_null_body() {
        let server = server();
        let res = post(&server, "/api/hours/sanitize", "null");
        let hours = body_json(res).await;
        for day in Weekday::ALL {
            assert_eq!(
                hours["business_hours"][day.key()],
                json!({ "is_closed": false, "time_slots": [] })
            );
        }
        assert_eq!(hours["summary"], "営業時間未設定");
    }

    #[tokio::test]
    async fn edit_replays_actions() {
        let server = server();
        let hours = BusinessHoursData::uniform(Default::default());
        let body = json!({
            "business_hours": hours,
            "actions": [
                { "action": "toggle_closed_day", "day": "sunday" },
                { "action": "set_common_hours", "field": "open_time", "value": "10:00" },
                { "action": "add_time_slot", "day": "monday" },
                { "action": "set_mode", "mode": "detailed" },
                { "action": "add_time_slot", "day": "monday" }
            ]
        });
        let res = post(&server, "/api/hours/edit", &body.to_string());
        let edited = body_json(res).await;

        assert_eq!(edited["mode"], "detailed");
        assert_eq!(edited["applied"], json!([true, true, false, true, true]));
        assert_eq!(edited["business_hours"]["sunday"]["is_closed"], true);
        assert_eq!(
            edited["business_hours"]["saturday"]["time_slots"][0]["open_time"],
            "10:00"
        );
        assert_eq!(
            edited["business_hours"]["monday"]["time_slots"]
                .as_array()
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn edit_starts_from_legacy_text() {
        let server = server();
        let body = json!({
            "legacy_hours": "営業時間: 18:00-24:00\n定休日: 日曜日",
            "actions": [
                { "action": "set_common_hours", "field": "last_order_time", "value": "23:30" }
            ]
        });
        let res = post(&server, "/api/hours/edit", &body.to_string());
        let edited = body_json(res).await;

        assert_eq!(edited["mode"], "simple");
        assert_eq!(edited["applied"], json!([true]));
        assert_eq!(edited["common_hours"]["close_time"], "24:00");
        assert_eq!(edited["common_hours"]["last_order_time"], "23:30");
        assert_eq!(edited["common_hours"]["closedDays"], json!(["sunday"]));
        assert_eq!(edited["business_hours"]["sunday"]["is_closed"], true);
    }

    #[tokio::test]
    async fn legacy_endpoints() {
        let server = server();
        let res = post(&server, "/api/hours/legacy/parse", "定休日：月曜日、火曜日\n11:00～22:00\nL.O. 21:30");
        let parsed = body_json(res).await;
        assert_eq!(parsed["common_hours"]["closedDays"], json!(["monday", "tuesday"]));
        assert_eq!(parsed["common_hours"]["last_order_time"], "21:30");

        let hours = BusinessHoursData::uniform(Default::default());
        let res = post(
            &server,
            "/api/hours/legacy/generate",
            &serde_json::to_string(&hours).unwrap(),
        );
        assert_eq!(
            body_text(res).await,
            "営業時間: 11:00-22:00\nラストオーダー: 21:30\n定休日: 年中無休"
        );
    }

    #[tokio::test]
    async fn time_options_endpoint() {
        let server = server();
        let res = server.handle(&Method::GET, "/api/hours/time-options", None, Bytes::new());
        let options = body_json(res).await;
        assert_eq!(options.as_array().unwrap().len(), 48);
    }
}
