//! Intermediate models pushed from build actions to client listeners.

use build_events::types::ListenerId;
use build_events::ProgressBridge;
use pretty_assertions::assert_eq;
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Serialize)]
struct ProjectModel {
    path: String,
    tasks: Vec<String>,
}

#[tokio::test]
async fn test_models_from_worker_thread_arrive_in_order() {
    let bridge = ProgressBridge::with_defaults().unwrap();
    let listener = ListenerId::new();
    let mut receiver = bridge.intermediate_models().register(listener.clone());
    let sender = bridge.intermediate_models().sender(listener.clone());

    let worker = std::thread::spawn(move || {
        for step in 0..100 {
            assert!(sender.push(json!({ "step": step })));
        }
    });
    worker.join().unwrap();

    for expected in 0..100u64 {
        let model = receiver.recv().await.unwrap();
        assert_eq!(model.sequence, expected);
        assert_eq!(model.payload, json!({ "step": expected }));
        assert_eq!(&model.listener, receiver.listener());
    }
}

#[tokio::test]
async fn test_typed_model_forwarded_until_tear_down() {
    let bridge = ProgressBridge::with_defaults().unwrap();
    let channel = bridge.intermediate_models().clone();
    let listener = ListenerId::new();
    let receiver = channel.register(listener.clone());

    let consumer = tokio::spawn(async move {
        let mut models = Vec::new();
        let delivered = receiver.forward_to(|model| models.push(model)).await;
        (delivered, models)
    });

    let sender = channel.sender(listener.clone());
    sender
        .push_model(&ProjectModel {
            path: ":app".to_string(),
            tasks: vec!["assemble".to_string()],
        })
        .unwrap();
    assert!(channel.tear_down(&listener));
    assert!(!sender.push(json!("late")));

    let (delivered, models) = consumer.await.unwrap();
    assert_eq!(delivered, 1);
    assert_eq!(models, vec![json!({ "path": ":app", "tasks": ["assemble"] })]);
}

#[test]
fn test_re_registration_replaces_listener() {
    let bridge = ProgressBridge::with_defaults().unwrap();
    let channel = bridge.intermediate_models();
    let listener = ListenerId::new();

    let mut stale = channel.register(listener.clone());
    let mut fresh = channel.register(listener.clone());
    assert_eq!(channel.listener_count(), 1);

    assert!(channel.push(&listener, json!(1)));
    assert!(stale.try_recv().is_none());
    assert_eq!(fresh.try_recv().map(|model| model.sequence), Some(0));
}
