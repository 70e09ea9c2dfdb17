mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::{Duration, Utc};
use common::{hour_slot, EventSpec, TestApp};
use meeting_scheduler::domain::models::vote::VoteChoice;
use meeting_scheduler::domain::services::decision::Trigger;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(app: &TestApp, uri: &str) -> axum::response::Response {
    app.router.clone().oneshot(
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    ).await.unwrap()
}

async fn post_json(app: &TestApp, uri: &str, payload: Value) -> axum::response::Response {
    app.router.clone().oneshot(
        Request::builder().method("POST").uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(payload.to_string())).unwrap()
    ).await.unwrap()
}

fn new_event_command(room_id: Option<&str>, attendees: &[&str]) -> Value {
    let (start, end) = hour_slot(10);
    json!({
        "type": "new_event_requested",
        "title": "API planning",
        "project": "platform",
        "room_id": room_id,
        "required_attendees": attendees,
        "deadline": (Utc::now() + Duration::days(1)).to_rfc3339(),
        "slots": [{ "start": start.to_rfc3339(), "end": end.to_rfc3339() }],
        "created_by": "U-ORG"
    })
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let res = get(&app, "/health").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["calendar_enabled"], true);
}

#[tokio::test]
async fn test_command_flow_over_http() {
    let app = TestApp::new().await;

    let res = post_json(&app, "/api/v1/commands", new_event_command(None, &["U1"])).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created = parse_body(res).await;
    assert_eq!(created["type"], "event_created");
    let event_id = created["event"]["id"].as_str().unwrap().to_string();
    let option_id = created["options"][0]["id"].as_str().unwrap().to_string();

    let res = post_json(&app, "/api/v1/commands", json!({
        "type": "vote_cast", "option_id": option_id, "voter_id": "U1", "choice": "yes"
    })).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["type"], "vote_recorded");

    let res = post_json(&app, "/api/v1/commands", json!({
        "type": "close_requested", "event_id": event_id, "requester_id": "U-ORG"
    })).await;
    assert_eq!(res.status(), StatusCode::OK);
    let decided = parse_body(res).await;
    assert_eq!(decided["type"], "decided");
    assert_eq!(decided["attendees"], json!(["U1"]));

    let res = get(&app, &format!("/api/v1/events/{}", event_id)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let status = parse_body(res).await;
    assert_eq!(status["event"]["status"], "fixed");
    assert_eq!(status["options"][0]["yes_count"], 1);
    assert!(status["booking"]["id"].is_string());
}

#[tokio::test]
async fn test_command_errors_map_to_status_codes() {
    let app = TestApp::new().await;
    let room = app.create_room("Booth", Some(1)).await;

    let res = post_json(&app, "/api/v1/commands", new_event_command(Some(&room.id), &["U1", "U2"])).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = parse_body(res).await;
    assert_eq!(body["existing"], 0);
    assert_eq!(body["requested"], 2);
    assert_eq!(body["capacity"], 1);

    let res = post_json(&app, "/api/v1/commands", json!({
        "type": "vote_cast", "option_id": "nope", "voter_id": "U1", "choice": "yes"
    })).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = post_json(&app, "/api/v1/commands", json!({
        "type": "status_requested", "event_id": " "
    })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = post_json(&app, "/api/v1/commands", json!({ "type": "dance" })).await;
    assert!(res.status().is_client_error());
}

#[tokio::test]
async fn test_unknown_event_is_404() {
    let app = TestApp::new().await;
    let res = get(&app, "/api/v1/events/does-not-exist").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_calendar_feed_lists_fixed_meetings() {
    let app = TestApp::new().await;
    let (event_id, slots) = app.new_event(EventSpec::new("Feed me")).await;
    app.vote(&slots[0], "U1", VoteChoice::Yes).await;
    app.state.decision_engine.decide(&event_id, Trigger::Manual).await.unwrap();
    app.new_event(EventSpec::new("Still voting")).await;

    let res = get(&app, "/calendar.ics").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "text/calendar; charset=utf-8");

    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let feed = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(feed.contains("BEGIN:VCALENDAR"));
    assert!(feed.contains("SUMMARY:Feed me"));
    assert!(!feed.contains("Still voting"));
    assert_eq!(feed.matches("UID:").count(), 1);
}

#[tokio::test]
async fn test_room_registration() {
    let app = TestApp::new().await;

    let res = post_json(&app, "/api/v1/rooms", json!({ "name": "Room B", "capacity": 8 })).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(parse_body(res).await["capacity"], 8);

    let res = post_json(&app, "/api/v1/rooms", json!({ "name": "Room B" })).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = post_json(&app, "/api/v1/rooms", json!({ "name": "  " })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = post_json(&app, "/api/v1/rooms", json!({ "name": "Atrium" })).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let rooms = parse_body(get(&app, "/api/v1/rooms").await).await;
    let names: Vec<_> = rooms.as_array().unwrap().iter().map(|r| r["name"].as_str().unwrap().to_string()).collect();
    assert_eq!(names, vec!["Atrium", "Room B"]);
    assert!(rooms[0]["capacity"].is_null());
}

#[tokio::test]
async fn test_busy_now() {
    let app = TestApp::new().await;
    let busy_room = app.create_room("Busy", Some(10)).await;
    app.create_room("Idle", Some(10)).await;

    let start = Utc::now() - Duration::minutes(10);
    let (event_id, slots) = app.new_event(
        EventSpec::new("In progress").room(&busy_room.id).slots(vec![(start, start + Duration::hours(1))])
    ).await;
    app.vote(&slots[0], "U1", VoteChoice::Yes).await;
    app.state.decision_engine.decide(&event_id, Trigger::Manual).await.unwrap();

    let res = get(&app, "/api/v1/rooms/busy").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["timezone"], "Asia/Tokyo");

    let rooms = body["rooms"].as_array().unwrap();
    assert_eq!(rooms.len(), 2);
    let busy = rooms.iter().find(|r| r["room_name"] == "Busy").unwrap();
    assert!(busy["occupied_until"].is_string());
    let idle = rooms.iter().find(|r| r["room_name"] == "Idle").unwrap();
    assert!(idle["occupied_until"].is_null());
}

#[tokio::test]
async fn test_schedule_groups_by_local_day() {
    let app = TestApp::new().await;
    let room = app.create_room("Main", Some(10)).await;

    // 10:00 UTC is 19:00 in Tokyo, same calendar day.
    let (fixed_id, slots) = app.new_event(EventSpec::new("Booked").room(&room.id).slots(vec![hour_slot(10)])).await;
    app.vote(&slots[0], "U1", VoteChoice::Yes).await;
    app.state.decision_engine.decide(&fixed_id, Trigger::Manual).await.unwrap();
    // 16:00 UTC is 01:00 the next day in Tokyo.
    app.new_event(EventSpec::new("Proposed").room(&room.id).slots(vec![hour_slot(16)])).await;

    let res = get(&app, "/api/v1/rooms/schedule?from=2031-03-10&to=2031-03-11").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;

    let days = body["rooms"][0]["days"].as_array().unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[0]["date"], "2031-03-10");
    assert_eq!(days[0]["entries"][0]["kind"], "booking");
    assert_eq!(days[0]["entries"][0]["title"], "Booked");
    assert_eq!(days[1]["date"], "2031-03-11");
    assert_eq!(days[1]["entries"][0]["kind"], "candidate");

    let res = get(&app, "/api/v1/rooms/schedule?from=2031-03-10&to=2031-03-01").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
