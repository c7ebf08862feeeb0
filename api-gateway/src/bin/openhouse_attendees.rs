//! Open House Attendees Lambda - Records attendance against open houses.
//!
//! Endpoints:
//! - POST /openhouses/{uuid}/attendees - Count one more attendee
//! - GET /openhouses/{uuid}/attendees - Get the attendee count

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::Serialize;
use shared::config::table_name;
use shared::http::{empty_response, into_lambda_response, json_response, path_uuid};
use shared::{AttendeeStore, Config, DynamoAttendeeStore};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Attendee count response
#[derive(Debug, Serialize)]
struct AttendeesResponse {
    attendees: u64,
}

/// Application state
struct AppState {
    store: Arc<dyn AttendeeStore>,
}

impl AppState {
    fn new(store: Arc<dyn AttendeeStore>) -> Self {
        Self { store }
    }

    async fn from_env() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let table = table_name("TABLE_NAME")?;

        let client = shared::dynamo::client(&config).await.clone();

        Ok(Self::new(Arc::new(DynamoAttendeeStore::new(client, table))))
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    info!(
        "Received request: method={}, path={}",
        event.method(),
        event.uri().path()
    );

    into_lambda_response(route(&state, &event).await)
}

async fn route(state: &AppState, event: &Request) -> shared::Result<Response<Body>> {
    match event.method().as_str() {
        "POST" => {
            let uuid = path_uuid(event)?;
            record_attendee(state, &uuid).await
        }
        "GET" => {
            let uuid = path_uuid(event)?;
            get_attendees(state, &uuid).await
        }
        other => Err(shared::Error::MethodNotAllowed(other.to_string())),
    }
}

async fn record_attendee(state: &AppState, uuid: &str) -> shared::Result<Response<Body>> {
    if !state.store.attendees_exist(uuid).await? {
        return Err(not_found());
    }

    state.store.increment_attendees(uuid).await?;

    info!("Recorded attendee for open house {}", uuid);

    empty_response(200)
}

async fn get_attendees(state: &AppState, uuid: &str) -> shared::Result<Response<Body>> {
    let attendance = state
        .store
        .get_attendees(uuid)
        .await?
        .ok_or_else(not_found)?;

    json_response(
        200,
        &AttendeesResponse {
            attendees: attendance.attendees,
        },
    )
}

fn not_found() -> shared::Error {
    shared::Error::NotFound("Open House does not exist".to_string())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::from_env().await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_http::RequestExt;
    use serde_json::Value;
    use shared::{Attendance, MemoryStore, OpenHouseStore};
    use std::collections::HashMap;

    async fn setup(known: &[&str]) -> (Arc<MemoryStore>, Arc<AppState>) {
        let store = Arc::new(MemoryStore::new());
        for uuid in known {
            store.put_attendees(&Attendance::new(*uuid)).await.unwrap();
        }
        let state = Arc::new(AppState::new(store.clone()));
        (store, state)
    }

    fn request(method: &str, uuid: Option<&str>) -> Request {
        let request = lambda_http::http::Request::builder()
            .method(method)
            .uri(format!("/openhouses/{}/attendees", uuid.unwrap_or("")))
            .body(Body::Empty)
            .unwrap();

        match uuid {
            Some(uuid) => request.with_path_parameters(HashMap::from([(
                "uuid".to_string(),
                uuid.to_string(),
            )])),
            None => request,
        }
    }

    async fn call(state: &Arc<AppState>, request: Request) -> (u16, Value) {
        let response = handler(Arc::clone(state), request).await.unwrap();
        let body = match response.body() {
            Body::Empty => Value::Null,
            body => serde_json::from_slice(body.as_ref()).unwrap(),
        };
        (response.status().as_u16(), body)
    }

    #[tokio::test]
    async fn test_record_attendee_twice() {
        let (_, state) = setup(&["abc"]).await;

        assert_eq!(call(&state, request("POST", Some("abc"))).await.0, 200);
        assert_eq!(call(&state, request("POST", Some("abc"))).await.0, 200);

        let (status, body) = call(&state, request("GET", Some("abc"))).await;
        assert_eq!(status, 200);
        assert_eq!(body["attendees"], 2);
    }

    #[tokio::test]
    async fn test_record_attendee_unknown_open_house() {
        let (store, state) = setup(&[]).await;

        let (status, body) = call(&state, request("POST", Some("nope"))).await;
        assert_eq!(status, 404);
        assert_eq!(body["error"], "Open House does not exist");
        assert!(!store.attendees_exist("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_uuid() {
        let (_, state) = setup(&[]).await;

        let (status, body) = call(&state, request("POST", None)).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Missing UUID in URL path");
    }

    #[tokio::test]
    async fn test_unsupported_method() {
        let (_, state) = setup(&["abc"]).await;

        assert_eq!(call(&state, request("DELETE", Some("abc"))).await.0, 405);
    }

    #[tokio::test]
    async fn test_concurrent_requests_lose_no_updates() {
        let (store, state) = setup(&["abc"]).await;

        let tasks: Vec<_> = (0..25)
            .map(|_| {
                let state = Arc::clone(&state);
                tokio::spawn(async move { handler(state, request("POST", Some("abc"))).await })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap().status(), 200);
        }

        let attendance = store.get_attendees("abc").await.unwrap().unwrap();
        assert_eq!(attendance.attendees, 25);
    }

    #[tokio::test]
    async fn test_store_failure_is_500() {
        let (store, state) = setup(&["abc"]).await;
        store.set_unavailable(true);

        let (status, body) = call(&state, request("POST", Some("abc"))).await;
        assert_eq!(status, 500);
        assert_eq!(body["error"], "Internal server error");
    }
}
