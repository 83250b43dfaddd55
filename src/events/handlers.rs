use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    events::{
        dto::{AttachEventRequest, BulkEventsRequest, Envelope, HelloResponse},
        repo_types::{Event, NewEvent},
        services::{food_events, has_food, GraphEvent},
    },
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(hello))
        .route("/api/", get(hello).post(create_event))
        .route("/api/fromfb/", post(create_graph_event))
        .route("/api/events/", get(list_events).post(create_events))
        .route("/api/events/:id/", delete(delete_event))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/user/events/", get(list_user_events).post(attach_user_event))
        .route("/api/user/events/:id/", delete(detach_user_event))
}

pub async fn hello() -> Json<HelloResponse> {
    Json(HelloResponse {
        message: "Hello, World!",
    })
}

#[instrument(skip(state, payload))]
pub async fn create_event(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<NewEvent>, ApiError>,
) -> Result<(StatusCode, Json<Envelope<Event>>), ApiError> {
    if !has_food(payload.content.as_deref()) {
        return Err(ApiError::NoFood);
    }
    let event = state.events.create(payload).await?;
    info!(event_id = %event.id, "event created");
    Ok((StatusCode::CREATED, Json(Envelope::ok(event))))
}

#[instrument(skip(state, payload))]
pub async fn create_graph_event(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<GraphEvent>, ApiError>,
) -> Result<(StatusCode, Json<Envelope<Event>>), ApiError> {
    if !has_food(payload.description.as_deref()) {
        return Err(ApiError::NoFood);
    }
    let new_event = NewEvent::try_from(payload)?;
    let event = state.events.create(new_event).await?;
    info!(event_id = %event.id, "graph event imported");
    Ok((StatusCode::CREATED, Json(Envelope::ok(event))))
}

#[instrument(skip(state, payload))]
pub async fn create_events(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<BulkEventsRequest>, ApiError>,
) -> Result<(StatusCode, Json<Envelope<Vec<Event>>>), ApiError> {
    let submitted = payload.data.len();
    let events = state.events.create_many(food_events(payload.data)).await?;
    info!(submitted, created = events.len(), "bulk events created");
    Ok((StatusCode::CREATED, Json(Envelope::ok(events))))
}

#[instrument(skip(state))]
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<Event>>>, ApiError> {
    Ok(Json(Envelope::ok(state.events.list_all().await?)))
}

#[instrument(skip(state))]
pub async fn delete_event(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<Json<Envelope<Event>>, ApiError> {
    let event = state
        .events
        .delete(id)
        .await?
        .ok_or(ApiError::NotFound("Event not found!"))?;
    info!(event_id = %id, "event deleted");
    Ok(Json(Envelope::ok(event)))
}

#[instrument(skip(state, user))]
pub async fn list_user_events(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Envelope<Vec<Event>>>, ApiError> {
    Ok(Json(Envelope::ok(state.events.list_for_user(user.id).await?)))
}

#[instrument(skip(state, user, payload))]
pub async fn attach_user_event(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    WithRejection(Json(payload), _): WithRejection<Json<AttachEventRequest>, ApiError>,
) -> Result<Json<Envelope<Event>>, ApiError> {
    let event = state
        .events
        .get(payload.id)
        .await?
        .ok_or(ApiError::NotFound("Event not found!"))?;
    if !has_food(event.content.as_deref()) {
        warn!(event_id = %event.id, "refusing to attach event without food");
        return Err(ApiError::NoFood);
    }
    let event = state
        .events
        .attach(user.id, event.id)
        .await?
        .ok_or(ApiError::NotFound("Event not found!"))?;
    Ok(Json(Envelope::ok(event)))
}

#[instrument(skip(state, user))]
pub async fn detach_user_event(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<Json<Envelope<Event>>, ApiError> {
    let event = state
        .events
        .detach(user.id, id)
        .await?
        .ok_or(ApiError::NotFound("Event not found!"))?;
    Ok(Json(Envelope::ok(event)))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{app::build_app, state::AppState};

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn session_for(app: &Router, email: &str) -> String {
        let (status, body) = call(
            app,
            Method::POST,
            "/register/",
            None,
            Some(json!({"email": email, "password": "pw123"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["session_token"].as_str().unwrap().to_string()
    }

    async fn create(app: &Router, content: &str) -> (StatusCode, Value) {
        call(
            app,
            Method::POST,
            "/api/",
            None,
            Some(json!({"name": "Meetup", "content": content, "latitude": 42.44})),
        )
        .await
    }

    #[tokio::test]
    async fn hello_routes() {
        let app = build_app(AppState::fake());
        for uri in ["/", "/api/"] {
            let (status, body) = call(&app, Method::GET, uri, None, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["message"], "Hello, World!");
        }
    }

    #[tokio::test]
    async fn events_without_food_are_not_acceptable() {
        let app = build_app(AppState::fake());
        let (status, body) = create(&app, "resume review").await;
        assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
        assert_eq!(body["error"], "No food offered in event!");

        let (status, body) = create(&app, "free pizza").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["latitude"], "42.44");
    }

    #[tokio::test]
    async fn bulk_create_then_list_and_delete() {
        let app = build_app(AppState::fake());
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/events/",
            None,
            Some(json!({"data": [
                {"name": "a", "content": "bagels and coffee"},
                {"name": "b", "content": "office hours"},
                {"name": "c", "content": "taco tuesday"}
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);

        let (_, listed) = call(&app, Method::GET, "/api/events/", None, None).await;
        let listed = listed["data"].as_array().unwrap().clone();
        assert_eq!(listed.len(), 2);

        let id = listed[0]["id"].as_str().unwrap();
        let uri = format!("/api/events/{id}/");
        let (status, _) = call(&app, Method::DELETE, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = call(&app, Method::DELETE, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Event not found!");
    }

    #[tokio::test]
    async fn graph_payload_is_imported() {
        let app = build_app(AppState::fake());
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/fromfb/",
            None,
            Some(json!({
                "name": "Club social",
                "description": "Ice cream social!",
                "start_time": "2018-04-20T19:30:00-0400",
                "place": {"name": "Duffield", "location": {"latitude": 42.44, "longitude": -76.48}}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["datetime"], "2018-04-20 19:30");
        assert_eq!(body["data"]["location"], "Duffield");

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/fromfb/",
            None,
            Some(json!({
                "description": "pizza",
                "start_time": "tomorrow",
                "place": {"name": "x", "location": {"latitude": 0.0, "longitude": 0.0}}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn graph_payload_without_place_is_a_bad_request() {
        let app = build_app(AppState::fake());
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/fromfb/",
            None,
            Some(json!({
                "name": "Club social",
                "description": "pizza",
                "start_time": "2018-04-20T19:30:00-0400"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("place"));
    }

    #[tokio::test]
    async fn malformed_event_id_is_a_bad_request() {
        let app = build_app(AppState::fake());
        let (status, body) =
            call(&app, Method::DELETE, "/api/events/not-a-uuid/", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn user_event_list_requires_valid_session() {
        let app = build_app(AppState::fake());
        let (status, _) = call(&app, Method::GET, "/api/user/events/", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, body) =
            call(&app, Method::GET, "/api/user/events/", Some("deadbeef"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid token.");
    }

    #[tokio::test]
    async fn users_attach_and_detach_shared_events() {
        let app = build_app(AppState::fake());
        let alice = session_for(&app, "alice@x.com").await;
        let bob = session_for(&app, "bob@x.com").await;

        let (_, created) = create(&app, "free lunch").await;
        let id = created["data"]["id"].as_str().unwrap().to_string();

        for token in [&alice, &bob] {
            let (status, _) = call(
                &app,
                Method::POST,
                "/api/user/events/",
                Some(token.as_str()),
                Some(json!({"id": id})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let uri = format!("/api/user/events/{id}/");
        let (status, _) = call(&app, Method::DELETE, &uri, Some(alice.as_str()), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, mine) = call(&app, Method::GET, "/api/user/events/", Some(alice.as_str()), None).await;
        assert!(mine["data"].as_array().unwrap().is_empty());
        let (_, theirs) = call(&app, Method::GET, "/api/user/events/", Some(bob.as_str()), None).await;
        assert_eq!(theirs["data"][0]["id"], id.as_str());

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/user/events/",
            Some(alice.as_str()),
            Some(json!({"id": uuid::Uuid::new_v4()})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
