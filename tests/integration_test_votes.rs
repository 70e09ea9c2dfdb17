mod common;

use common::{hour_slot, EventSpec, Sent, TestApp};
use meeting_scheduler::domain::models::{
    command::{Command, CommandReply},
    vote::VoteChoice,
};
use meeting_scheduler::domain::services::decision::Trigger;
use meeting_scheduler::error::AppError;

#[tokio::test]
async fn test_last_vote_wins() {
    let app = TestApp::new().await;
    let (event_id, slots) = app.new_event(EventSpec::new("Lunch")).await;
    let slot = &slots[0];

    app.vote(slot, "U1", VoteChoice::Yes).await;
    let first = app.state.vote_repo.find(slot, "U1").await.unwrap().unwrap();
    app.vote(slot, "U1", VoteChoice::Maybe).await;
    app.vote(slot, "U1", VoteChoice::No).await;

    assert_eq!(app.count("SELECT COUNT(*) FROM votes WHERE option_id = ?", slot).await, 1);
    let last = app.state.vote_repo.find(slot, "U1").await.unwrap().unwrap();
    assert_eq!(last.choice, VoteChoice::No);
    assert!(last.voted_at >= first.voted_at);

    let tallies = app.state.ledger.aggregate(&event_id).await.unwrap();
    assert_eq!(tallies.len(), 1);
    assert_eq!((tallies[0].yes_count, tallies[0].maybe_count, tallies[0].no_count), (0, 0, 1));
}

#[tokio::test]
async fn test_aggregate_is_ordered_by_start() {
    let app = TestApp::new().await;
    let (event_id, slots) = app.new_event(
        EventSpec::new("Workshop").slots(vec![hour_slot(15), hour_slot(9), hour_slot(15), hour_slot(12)])
    ).await;
    assert_eq!(slots.len(), 3);

    app.vote(&slots[2], "U1", VoteChoice::Yes).await;
    app.vote(&slots[2], "U2", VoteChoice::Maybe).await;

    let tallies = app.state.ledger.aggregate(&event_id).await.unwrap();
    let starts: Vec<_> = tallies.iter().map(|t| t.start_time).collect();
    assert_eq!(starts, vec![hour_slot(9).0, hour_slot(12).0, hour_slot(15).0]);
    assert_eq!((tallies[2].yes_count, tallies[2].maybe_count), (1, 1));
    assert_eq!(tallies[0].yes_count + tallies[0].maybe_count + tallies[0].no_count, 0);
}

#[tokio::test]
async fn test_vote_on_unknown_slot_is_not_found() {
    let app = TestApp::new().await;
    let result = app.state.dispatcher.dispatch(Command::VoteCast {
        option_id: "missing".into(),
        voter_id: "U1".into(),
        choice: VoteChoice::Yes,
    }).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let result = app.state.ledger.cast_vote("missing", "U1", VoteChoice::Yes).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_vote_refreshes_message_and_closes_with_event() {
    let app = TestApp::new().await;
    let (event_id, slots) = app.new_event(EventSpec::new("Standup")).await;

    let reply = app.state.dispatcher.dispatch(Command::VoteCast {
        option_id: slots[0].clone(),
        voter_id: "U1".into(),
        choice: VoteChoice::Yes,
    }).await.unwrap();
    assert!(matches!(reply, CommandReply::VoteRecorded { .. }));

    let updates: Vec<_> = app.chat.sent().into_iter()
        .filter(|s| matches!(s, Sent::Updated { .. }))
        .collect();
    assert_eq!(updates.len(), 1);
    if let Sent::Updated { text, .. } = &updates[0] {
        assert!(text.contains("yes 1 / maybe 0 / no 0"));
    }

    app.state.decision_engine.decide(&event_id, Trigger::Manual).await.unwrap();
    let late = app.state.dispatcher.dispatch(Command::VoteCast {
        option_id: slots[0].clone(),
        voter_id: "U2".into(),
        choice: VoteChoice::Yes,
    }).await;
    assert!(matches!(late, Err(AppError::InvalidState(_))));
}

#[tokio::test]
async fn test_vote_survives_chat_outage() {
    let app = TestApp::new().await;
    let (_event_id, slots) = app.new_event(EventSpec::new("Sync")).await;

    app.chat.set_failing(true);
    app.vote(&slots[0], "U1", VoteChoice::Maybe).await;

    let vote = app.state.vote_repo.find(&slots[0], "U1").await.unwrap().unwrap();
    assert_eq!(vote.choice, VoteChoice::Maybe);
}

#[tokio::test]
async fn test_new_event_publishes_vote_message() {
    let app = TestApp::new().await;
    let (event_id, _) = app.new_event(EventSpec::new("Hiring sync").attendees(&["U2", "U1", "U2"])).await;

    let event = app.state.event_repo.find_by_id(&event_id).await.unwrap().unwrap();
    assert_eq!(event.channel_id.as_deref(), Some("C-MEETINGS"));
    assert!(event.message_ts.is_some());
    assert_eq!(app.state.event_repo.list_required_attendees(&event_id).await.unwrap(), vec!["U1", "U2"]);

    // Publishing is advisory: the event exists even if the chat is down.
    app.chat.set_failing(true);
    let (event_id, _) = app.new_event(EventSpec::new("Offline")).await;
    let event = app.state.event_repo.find_by_id(&event_id).await.unwrap().unwrap();
    assert!(event.message_ref().is_none());
}
