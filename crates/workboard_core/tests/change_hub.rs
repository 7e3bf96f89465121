use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use workboard_core::db::open_db_in_memory;
use workboard_core::{
    ChangeHub, HubMessage, LinkKind, NewGoal, NewProject, NewTask, Subscription, WorkboardService,
};

fn drain(subscription: &mut Subscription) -> Vec<HubMessage> {
    let mut messages = Vec::new();
    while let Some(message) = subscription.try_recv() {
        messages.push(message);
    }
    messages
}

#[test]
fn concurrent_publishers_deliver_each_message_at_most_once_per_subscriber() {
    const PUBLISHERS: usize = 8;
    const PER_PUBLISHER: usize = 6;

    let hub = Arc::new(ChangeHub::new(PUBLISHERS * PER_PUBLISHER));
    let mut subscriptions: Vec<Subscription> = (0..5).map(|_| hub.subscribe()).collect();
    let barrier = Arc::new(Barrier::new(PUBLISHERS));

    let handles: Vec<_> = (0..PUBLISHERS)
        .map(|publisher| {
            let hub = Arc::clone(&hub);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for seq in 0..PER_PUBLISHER {
                    let report = hub.publish("task_updated", &(publisher, seq));
                    assert_eq!(report.delivered + report.dropped, 5);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for subscription in &mut subscriptions {
        let messages = drain(subscription);
        let unique: HashSet<String> = messages.iter().map(|m| m.data.clone()).collect();
        assert_eq!(messages.len(), PUBLISHERS * PER_PUBLISHER);
        assert_eq!(unique.len(), messages.len());
        assert!(messages.iter().all(|m| m.event == "task_updated"));
    }
}

#[test]
fn stalled_subscriber_never_blocks_publishers() {
    let hub = Arc::new(ChangeHub::new(2));
    let mut stalled = hub.subscribe();
    let mut active = hub.subscribe();

    let publisher = {
        let hub = Arc::clone(&hub);
        thread::spawn(move || {
            let mut dropped = 0;
            for seq in 0..50 {
                dropped += hub.publish("project_updated", &seq).dropped;
            }
            dropped
        })
    };
    let dropped = publisher.join().unwrap();

    assert_eq!(dropped, 96);
    assert_eq!(drain(&mut stalled).len(), 2);
    assert_eq!(drain(&mut active).len(), 2);
}

#[test]
fn concurrent_subscribe_and_unsubscribe_during_publish() {
    let hub = Arc::new(ChangeHub::new(4));
    let churners: Vec<_> = (0..4)
        .map(|_| {
            let hub = Arc::clone(&hub);
            thread::spawn(move || {
                for _ in 0..100 {
                    let subscription = hub.subscribe();
                    assert!(hub.unsubscribe(subscription));
                }
            })
        })
        .collect();
    let publisher = {
        let hub = Arc::clone(&hub);
        thread::spawn(move || {
            for seq in 0..200 {
                hub.publish("goal_updated", &seq);
            }
        })
    };

    for handle in churners {
        handle.join().unwrap();
    }
    publisher.join().unwrap();
    assert_eq!(hub.subscriber_count(), 0);
}

#[test]
fn service_publishes_typed_events_after_successful_mutations() {
    let conn = open_db_in_memory().unwrap();
    let hub = Arc::new(ChangeHub::new(32));
    let mut subscription = hub.subscribe();
    let service = WorkboardService::try_new(&conn, Arc::clone(&hub)).unwrap();

    let project = service.create_project(&NewProject::named("P1")).unwrap();
    let task = service
        .create_task(&NewTask::new(project.id, "T1"))
        .unwrap();
    service.create_note(task.id, "remember").unwrap();
    service.delete_task(task.id).unwrap();

    let messages = drain(&mut subscription);
    let events: Vec<&str> = messages.iter().map(|m| m.event.as_str()).collect();
    assert_eq!(
        events,
        vec!["project_created", "task_created", "task_note_created", "task_deleted"]
    );

    let created: serde_json::Value = serde_json::from_str(&messages[0].data).unwrap();
    assert_eq!(created["id"], project.id);
    assert_eq!(created["name"], "P1");
    assert_eq!(created["status"], "active");

    let deleted: serde_json::Value = serde_json::from_str(&messages[3].data).unwrap();
    assert_eq!(deleted, serde_json::json!({ "id": task.id }));
}

#[test]
fn failed_mutations_and_reads_publish_nothing() {
    let conn = open_db_in_memory().unwrap();
    let hub = Arc::new(ChangeHub::new(8));
    let mut subscription = hub.subscribe();
    let service = WorkboardService::try_new(&conn, Arc::clone(&hub)).unwrap();

    assert!(service.create_task(&NewTask::new(77, "orphan")).is_err());
    assert!(service.create_project(&NewProject::named("")).is_err());
    assert!(service.delete_goal(5).is_err());
    assert!(service.get_project(1).is_err());

    assert!(subscription.try_recv().is_none());
}

#[test]
fn relinking_publishes_once() {
    let conn = open_db_in_memory().unwrap();
    let hub = Arc::new(ChangeHub::new(8));
    let service = WorkboardService::try_new(&conn, Arc::clone(&hub)).unwrap();
    let project = service.create_project(&NewProject::named("P")).unwrap();
    let goal = service.create_goal(&NewGoal::titled("G")).unwrap();

    let mut subscription = hub.subscribe();
    service.link(LinkKind::Goal, goal.id, project.id).unwrap();
    service.link(LinkKind::Goal, goal.id, project.id).unwrap();
    service.unlink(LinkKind::Goal, goal.id, project.id).unwrap();

    let events: Vec<String> = drain(&mut subscription)
        .into_iter()
        .map(|m| m.event)
        .collect();
    assert_eq!(events, vec!["goal_linked", "goal_unlinked"]);
}
