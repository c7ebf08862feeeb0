//! Open Houses Lambda - Handles open house event listings.
//!
//! Endpoints:
//! - GET /openhouses - List open houses
//! - GET /openhouses/{uuid} - Get open house details
//! - POST /openhouses - Create an open house
//! - PUT /openhouses/{uuid} - Replace an open house
//! - DELETE /openhouses/{uuid} - Delete an open house

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::Serialize;
use shared::config::table_name;
use shared::http::{
    empty_response, into_lambda_response, json_response, parse_json_body, path_uuid,
};
use shared::{
    Attendance, Config, DynamoOpenHouseStore, OpenHouse, OpenHouseForm, OpenHouseStore,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// List response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OpenHousesResponse {
    open_houses: Vec<OpenHouse>,
}

/// Single open house response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OpenHouseResponse {
    open_house: OpenHouse,
}

/// Application state
struct AppState {
    store: Arc<dyn OpenHouseStore>,
}

impl AppState {
    fn new(store: Arc<dyn OpenHouseStore>) -> Self {
        Self { store }
    }

    async fn from_env() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let open_houses_table = table_name("OPEN_HOUSES_TABLE")?;
        let attendees_table = table_name("OPEN_HOUSE_ATTENDEES_TABLE")?;

        let client = shared::dynamo::client(&config).await.clone();

        Ok(Self::new(Arc::new(DynamoOpenHouseStore::new(
            client,
            open_houses_table,
            attendees_table,
        ))))
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
        "GET" => match path_uuid(event).ok() {
            Some(uuid) => get_open_house(state, &uuid).await,
            None => list_open_houses(state).await,
        },
        "POST" => create_open_house(state, parse_json_body(event.body())?).await,
        "PUT" => {
            let uuid = path_uuid(event)?;
            update_open_house(state, &uuid, parse_json_body(event.body())?).await
        }
        "DELETE" => {
            let uuid = path_uuid(event)?;
            delete_open_house(state, &uuid).await
        }
        other => Err(shared::Error::MethodNotAllowed(other.to_string())),
    }
}

async fn list_open_houses(state: &AppState) -> shared::Result<Response<Body>> {
    let open_houses = state.store.scan_open_houses().await?;

    json_response(200, &OpenHousesResponse { open_houses })
}

async fn get_open_house(state: &AppState, uuid: &str) -> shared::Result<Response<Body>> {
    let open_house = state
        .store
        .get_open_house(uuid)
        .await?
        .ok_or_else(not_found)?;

    json_response(200, &OpenHouseResponse { open_house })
}

async fn create_open_house(
    state: &AppState,
    body: serde_json::Value,
) -> shared::Result<Response<Body>> {
    let uuid = Uuid::new_v4().to_string();
    let open_house = OpenHouseForm::from_value(body)?.into_open_house(uuid)?;

    // Counter goes first: a listed open house must always have one
    state
        .store
        .put_attendees(&Attendance::new(open_house.uuid.clone()))
        .await?;

    if let Err(err) = state.store.put_open_house(&open_house).await {
        if let Err(cleanup) = state.store.delete_attendees(&open_house.uuid).await {
            warn!(
                "Failed to remove counter for unsaved open house {}: {}",
                open_house.uuid, cleanup
            );
        }
        return Err(err);
    }

    info!("Created open house {} ({})", open_house.uuid, open_house.name);

    empty_response(201)
}

async fn update_open_house(
    state: &AppState,
    uuid: &str,
    body: serde_json::Value,
) -> shared::Result<Response<Body>> {
    // Existence is checked before the body is validated
    if state.store.get_open_house(uuid).await?.is_none() {
        return Err(not_found());
    }

    let open_house = OpenHouseForm::from_value(body)?.into_open_house(uuid)?;
    state.store.put_open_house(&open_house).await?;

    info!("Updated open house {}", uuid);

    empty_response(200)
}

async fn delete_open_house(state: &AppState, uuid: &str) -> shared::Result<Response<Body>> {
    state.store.delete_open_house(uuid).await?;
    state.store.delete_attendees(uuid).await?;

    info!("Deleted open house {}", uuid);

    empty_response(200)
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
