mod common;

use common::{busy, ok_text, refused, ScriptedTransport};
use duetpanel_communication::{CommandDispatcher, DispatcherConfig, Method, CODE_PATH};
use duetpanel_core::{DispatchError, EventDispatcher, PanelEvent, TransportError};
use std::sync::Arc;
use std::time::Duration;

fn fast_config() -> DispatcherConfig {
    DispatcherConfig {
        retry_delay: Duration::from_millis(5),
        max_attempts: None,
    }
}

#[tokio::test]
async fn test_busy_controller_is_retried_until_accepted() {
    let transport = Arc::new(ScriptedTransport::new(
        vec![busy(), busy(), ok_text("ok")],
        ok_text(""),
    ));
    let dispatcher = CommandDispatcher::new(transport.clone(), fast_config());

    let response = dispatcher.send("M5").await.unwrap();

    assert_eq!(response, "ok");
    let requests = transport.requests.lock();
    assert_eq!(requests.len(), 3);
    assert!(requests
        .iter()
        .all(|r| r.method == Method::Post && r.path == CODE_PATH));
    assert!(requests.iter().all(|r| r.body.as_deref() == Some("M5")));
}

#[tokio::test]
async fn test_unknown_variable_is_retried_once() {
    let transport = Arc::new(ScriptedTransport::new(
        vec![
            ok_text("Error: unknown variable 'partCooling'\n"),
            ok_text(""),
        ],
        ok_text("unexpected"),
    ));
    let dispatcher = CommandDispatcher::new(transport.clone(), fast_config());

    let response = dispatcher.send("set global.partCooling = true").await.unwrap();

    assert_eq!(response, "");
    assert_eq!(transport.requests.lock().len(), 2);
}

#[tokio::test]
async fn test_other_controller_errors_are_returned_not_retried() {
    let transport = Arc::new(ScriptedTransport::new(
        vec![ok_text("Error: M568: heater 9 does not exist")],
        ok_text(""),
    ));
    let dispatcher = CommandDispatcher::new(transport.clone(), fast_config());

    let response = dispatcher.send("M568 P9 A0").await.unwrap();

    assert!(response.starts_with("Error: M568"));
    assert_eq!(transport.requests.lock().len(), 1);
}

#[tokio::test]
async fn test_network_and_http_errors_are_retried() {
    let transport = Arc::new(ScriptedTransport::new(
        vec![
            refused(),
            Err(TransportError::Http { status: 500 }),
            ok_text("done"),
        ],
        ok_text(""),
    ));
    let dispatcher = CommandDispatcher::new(transport.clone(), fast_config());

    assert_eq!(dispatcher.send("M999").await.unwrap(), "done");
    assert_eq!(transport.requests.lock().len(), 3);
}

#[tokio::test]
async fn test_attempt_ceiling_gives_up() {
    let transport = Arc::new(ScriptedTransport::new(vec![], busy()));
    let dispatcher = CommandDispatcher::new(
        transport.clone(),
        DispatcherConfig {
            retry_delay: Duration::from_millis(1),
            max_attempts: Some(4),
        },
    );

    let err = dispatcher.send("M112").await.unwrap_err();

    assert_eq!(
        err,
        DispatchError::RetriesExhausted {
            gcode: "M112".into(),
            attempts: 4
        }
    );
    assert_eq!(transport.requests.lock().len(), 4);
}

#[tokio::test]
async fn test_zero_ceiling_still_sends_once() {
    let transport = Arc::new(ScriptedTransport::new(vec![], busy()));
    let dispatcher = CommandDispatcher::new(
        transport.clone(),
        DispatcherConfig {
            retry_delay: Duration::from_millis(1),
            max_attempts: Some(0),
        },
    );

    let err = dispatcher.send("M5").await.unwrap_err();

    assert_eq!(
        err,
        DispatchError::RetriesExhausted {
            gcode: "M5".into(),
            attempts: 1
        }
    );
    assert_eq!(transport.requests.lock().len(), 1);
}

#[tokio::test]
async fn test_batch_is_sent_in_order() {
    let transport = Arc::new(ScriptedTransport::new(
        vec![ok_text(""), busy(), ok_text(""), ok_text("")],
        ok_text(""),
    ));
    let events = EventDispatcher::default();
    let mut rx = events.subscribe();
    let dispatcher = CommandDispatcher::new(transport.clone(), fast_config()).with_events(events);

    let responses = dispatcher.send_batch(&["G28", "M5", "M999"]).await.unwrap();

    assert_eq!(responses.len(), 3);
    assert_eq!(transport.bodies(), vec!["G28", "M5", "M5", "M999"]);
    assert_eq!(rx.recv().await.unwrap(), PanelEvent::CommandComplete("G28".into()));
    assert_eq!(rx.recv().await.unwrap(), PanelEvent::CommandComplete("M5".into()));
    assert_eq!(rx.recv().await.unwrap(), PanelEvent::CommandComplete("M999".into()));
}

#[tokio::test]
async fn test_json_response_is_returned_serialized() {
    let transport = Arc::new(ScriptedTransport::new(
        vec![Ok(duetpanel_communication::Payload::Json(serde_json::json!({"result": 0})))],
        ok_text(""),
    ));
    let dispatcher = CommandDispatcher::new(transport, fast_config());
    assert_eq!(dispatcher.send("M115").await.unwrap(), r#"{"result":0}"#);
}
