mod common;

use common::{hour_slot, EventSpec, TestApp};
use meeting_scheduler::domain::models::{reminder::ReminderKind, vote::VoteChoice};
use meeting_scheduler::domain::services::{decision::Trigger, reminder::PassReport};
use chrono::{Duration, Utc};

async fn vote_scan(app: &TestApp) -> PassReport {
    let mut report = PassReport::default();
    app.state.scheduler.vote_reminder_scan(Utc::now(), &mut report).await.unwrap();
    report
}

async fn join_scan(app: &TestApp) -> PassReport {
    let mut report = PassReport::default();
    app.state.scheduler.join_reminder_scan(Utc::now(), &mut report).await.unwrap();
    report
}

#[tokio::test]
async fn test_vote_reminder_sent_once_per_user() {
    let app = TestApp::new().await;
    let (event_id, slots) = app.new_event(
        EventSpec::new("Roadmap")
            .attendees(&["U1", "U2"])
            .deadline(Utc::now() + Duration::minutes(30))
    ).await;
    app.vote(&slots[0], "U1", VoteChoice::No).await;

    let first = vote_scan(&app).await;
    assert_eq!(first.vote_reminders, 1);
    for _ in 0..3 {
        assert_eq!(vote_scan(&app).await.vote_reminders, 0);
    }

    assert!(app.chat.direct_messages_to("U1").is_empty());
    let dms = app.chat.direct_messages_to("U2");
    assert_eq!(dms.len(), 1);
    assert!(dms[0].contains("Roadmap"));
    assert!(dms[0].contains("https://chat.test/archives/C-MEETINGS/"));

    assert_eq!(
        app.count("SELECT COUNT(*) FROM reminder_claims WHERE event_id = ? AND kind = 'vote'", &event_id).await,
        1
    );
}

#[tokio::test]
async fn test_vote_reminder_waits_for_lead_time() {
    let app = TestApp::new().await;
    let mut spec = EventSpec::new("Later")
        .attendees(&["U1"])
        .deadline(Utc::now() + Duration::hours(3));
    spec.vote_reminder_minutes = Some(120);
    app.new_event(spec).await;

    assert_eq!(vote_scan(&app).await.vote_reminders, 0);

    // Default lead is 60 minutes.
    app.new_event(EventSpec::new("Default lead").attendees(&["U2"]).deadline(Utc::now() + Duration::minutes(90))).await;
    assert_eq!(vote_scan(&app).await.vote_reminders, 0);
    assert!(app.chat.direct_messages_to("U2").is_empty());
}

#[tokio::test]
async fn test_voters_are_skipped() {
    let app = TestApp::new().await;
    let (_event_id, slots) = app.new_event(
        EventSpec::new("Voted")
            .attendees(&["U1"])
            .deadline(Utc::now() + Duration::minutes(10))
    ).await;
    app.vote(&slots[0], "U1", VoteChoice::Maybe).await;

    assert_eq!(vote_scan(&app).await.vote_reminders, 0);
    assert!(app.chat.direct_messages_to("U1").is_empty());
}

#[tokio::test]
async fn test_claim_survives_failed_send() {
    let app = TestApp::new().await;
    let (event_id, _) = app.new_event(
        EventSpec::new("Flaky")
            .attendees(&["U1"])
            .deadline(Utc::now() + Duration::minutes(10))
    ).await;

    app.chat.set_failing(true);
    assert_eq!(vote_scan(&app).await.vote_reminders, 0);
    app.chat.set_failing(false);
    assert_eq!(vote_scan(&app).await.vote_reminders, 0);

    assert!(app.chat.direct_messages_to("U1").is_empty());
    assert!(!app.state.reminder_repo.claim(&event_id, "U1", ReminderKind::Vote).await.unwrap());
}

#[tokio::test]
async fn test_join_reminder_for_confirmed_attendees() {
    let app = TestApp::new().await;
    let start = Utc::now() + Duration::minutes(5);
    let mut spec = EventSpec::new("Daily")
        .attendees(&["U1", "U2", "U3"])
        .slots(vec![(start, start + Duration::minutes(30))]);
    spec.meeting_url = Some("https://meet.test/daily".into());
    let (event_id, slots) = app.new_event(spec).await;

    app.vote_many(&slots[0], &["U1", "U2"], VoteChoice::Yes).await;
    app.vote(&slots[0], "U3", VoteChoice::No).await;
    app.state.decision_engine.decide(&event_id, Trigger::Manual).await.unwrap();

    assert_eq!(join_scan(&app).await.join_reminders, 2);
    assert_eq!(join_scan(&app).await.join_reminders, 0);

    assert_eq!(app.chat.direct_messages_to("U1").len(), 1);
    assert!(app.chat.direct_messages_to("U1")[0].contains("https://meet.test/daily"));
    assert!(app.chat.direct_messages_to("U3").is_empty());
    assert_eq!(
        app.count("SELECT COUNT(*) FROM reminder_claims WHERE event_id = ? AND kind = 'join'", &event_id).await,
        2
    );
}

#[tokio::test]
async fn test_no_join_reminder_before_lead_or_for_planning_events() {
    let app = TestApp::new().await;
    let start = Utc::now() + Duration::hours(2);
    let (fixed_id, slots) = app.new_event(
        EventSpec::new("Afternoon").slots(vec![(start, start + Duration::hours(1))])
    ).await;
    app.vote(&slots[0], "U1", VoteChoice::Yes).await;
    app.state.decision_engine.decide(&fixed_id, Trigger::Manual).await.unwrap();

    let soon = Utc::now() + Duration::minutes(5);
    let (_planning_id, slots) = app.new_event(
        EventSpec::new("Undecided").slots(vec![(soon, soon + Duration::hours(1))])
    ).await;
    app.vote(&slots[0], "U2", VoteChoice::Yes).await;

    assert_eq!(join_scan(&app).await.join_reminders, 0);
    assert!(app.chat.direct_messages_to("U1").is_empty());
    assert!(app.chat.direct_messages_to("U2").is_empty());
}

#[tokio::test]
async fn test_full_pass_reports_counts() {
    let app = TestApp::new().await;
    let (_due, slots) = app.new_event(
        EventSpec::new("Overdue").deadline(Utc::now() - Duration::minutes(1))
    ).await;
    app.vote(&slots[0], "U1", VoteChoice::Yes).await;
    app.new_event(EventSpec::new("Open").attendees(&["U9"]).deadline(Utc::now() + Duration::minutes(20))).await;

    let report = app.state.scheduler.run_pass(Utc::now()).await;
    assert_eq!(report.decided, 1);
    assert_eq!(report.vote_reminders, 1);
    assert_eq!(report.failures, 0);
}

#[tokio::test]
async fn test_deferred_event_still_reminds_pending_voters_once() {
    let app = TestApp::new().await;
    let room = app.create_room("Huddle", Some(2)).await;
    let (event_id, slots) = app.new_event(
        EventSpec::new("Overflow")
            .room(&room.id)
            .attendees(&["U3", "U4"])
            .slots(vec![hour_slot(10)])
            .deadline(Utc::now() - Duration::minutes(5))
    ).await;
    app.vote(&slots[0], "U3", VoteChoice::Yes).await;

    // The room fills up after the event was proposed.
    let (existing, standing) = app.new_event(EventSpec::new("Standing").room(&room.id).slots(vec![hour_slot(10)])).await;
    app.vote_many(&standing[0], &["U1", "U2"], VoteChoice::Yes).await;
    app.state.decision_engine.decide(&existing, Trigger::Manual).await.unwrap();

    let report = app.state.scheduler.run_pass(Utc::now()).await;
    assert_eq!(report.deferred, 1);
    assert_eq!(report.vote_reminders, 1);

    let report = app.state.scheduler.run_pass(Utc::now()).await;
    assert_eq!(report.deferred, 1);
    assert_eq!(report.vote_reminders, 0);

    assert_eq!(app.chat.direct_messages_to("U4").len(), 1);
    assert!(app.chat.direct_messages_to("U3").is_empty());
    assert_eq!(
        app.count("SELECT COUNT(*) FROM reminder_claims WHERE event_id = ? AND kind = 'vote'", &event_id).await,
        1
    );
}
