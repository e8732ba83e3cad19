mod common;

use common::{harness, heater, machine_status};
use duetpanel_core::{PanelEvent, TransportError};
use duetpanel_panel::{Glow, IndicatorLight};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_first_cycle_renders_and_stops_spindle_once() {
    let mut h = harness(machine_status(), true);

    h.reconciler.reconcile_once().await.unwrap();
    h.reconciler.reconcile_once().await.unwrap();

    let views = h.sink.views.lock();
    assert_eq!(views.len(), 2);
    let view = &views[0];
    assert_eq!(view.extruder.tiles.len(), 4);
    assert_eq!(view.bed.tiles.len(), 1);
    assert_eq!(view.extruder_state, "OFF");
    assert_eq!(view.extruder.glow, Glow::Cold);
    assert_eq!(view.tool.indicator_light, IndicatorLight::Green);
    assert_eq!(view.system.uptime, "01:02:05");
    assert_eq!(view.system.connected_tool, "CNC");
    assert_eq!(views[0], views[1]);
    drop(views);

    assert_eq!(h.posted().await, vec!["M5".to_string()]);
}

#[tokio::test]
async fn test_spindle_run_resent_and_stop_sent_once() {
    let mut h = harness(machine_status(), true);
    h.reconciler.reconcile_once().await.unwrap();
    h.posted().await;

    h.controls.unlock();
    assert!(h.controls.set_speed(12000));
    h.controls.start();
    let mut sent = Vec::new();
    for _ in 0..3 {
        h.reconciler.reconcile_once().await.unwrap();
        sent.extend(h.posted().await);
    }
    assert_eq!(sent, vec!["M3 P0 S12000"; 3]);

    h.controls.stop();
    let mut sent = Vec::new();
    for _ in 0..3 {
        h.reconciler.reconcile_once().await.unwrap();
        sent.extend(h.posted().await);
    }
    assert_eq!(sent, vec!["M5".to_string()]);
}

#[tokio::test]
async fn test_cnc_fault_stops_and_locks_spindle() {
    let mut h = harness(machine_status(), true);
    h.reconciler.reconcile_once().await.unwrap();
    h.controls.unlock();
    h.controls.start();
    h.reconciler.reconcile_once().await.unwrap();
    h.posted().await;

    let mut status = machine_status();
    status["global"]["CNCFault"] = json!(true);
    h.controller.set_status(status);
    h.reconciler.reconcile_once().await.unwrap();
    h.reconciler.reconcile_once().await.unwrap();

    assert_eq!(h.posted().await, vec!["M5".to_string()]);
    let request = h.controls.snapshot();
    assert!(!request.running);
    assert!(!request.unlocked);

    let views = h.sink.views.lock();
    let view = views.last().unwrap();
    assert_eq!(view.faults.cnc_fault, Some("Spindle Motor Fault"));
    assert!(view.faults.banner_visible);
    assert!(!view.spindle.running);
    assert!(view.spindle.locked);
}

#[tokio::test]
async fn test_confirmed_fault_reset_is_debounced() {
    let mut status = machine_status();
    status["heat"]["heaters"][1] = heater(22.0, 0.0, "fault");
    let mut h = harness(status, true);

    h.reconciler.reconcile_once().await.unwrap();
    assert_eq!(h.prompt.count(), 1);
    assert_eq!(
        h.posted().await,
        vec!["M292 M562 P1".to_string(), "M5".to_string()]
    );

    // still faulted inside the debounce window
    h.reconciler.reconcile_once().await.unwrap();
    assert_eq!(h.prompt.count(), 1);

    tokio::time::sleep(Duration::from_millis(60)).await;
    h.reconciler.reconcile_once().await.unwrap();
    assert_eq!(h.prompt.count(), 2);

    let views = h.sink.views.lock();
    assert_eq!(views[0].extruder_state, "FAULT");
    assert!(views[0].extruder.tiles[1].faulted);
    assert_eq!(views[0].faults.faulted_heaters, vec![1]);
}

#[tokio::test]
async fn test_declined_fault_is_not_prompted_again() {
    let mut faulted = machine_status();
    faulted["heat"]["heaters"][4] = heater(22.0, 0.0, "fault");
    let mut h = harness(faulted.clone(), false);
    let mut events = h.events.subscribe();

    for _ in 0..4 {
        h.reconciler.reconcile_once().await.unwrap();
    }
    assert_eq!(h.prompt.count(), 1);
    assert!(!h.posted().await.iter().any(|c| c.starts_with("M292")));

    let mut acknowledged = 0;
    while let Ok(event) = events.try_recv() {
        if let PanelEvent::HeaterFaultAcknowledged { heater, reset } = event {
            assert_eq!(heater, 4);
            assert!(!reset);
            acknowledged += 1;
        }
    }
    assert_eq!(acknowledged, 1);

    // leaving the fault clears the latch
    h.controller.set_status(machine_status());
    h.reconciler.reconcile_once().await.unwrap();
    h.controller.set_status(faulted);
    h.reconciler.reconcile_once().await.unwrap();
    assert_eq!(h.prompt.count(), 2);
}

#[tokio::test]
async fn test_failed_cycle_keeps_previous_view() {
    let mut h = harness(machine_status(), true);
    let mut events = h.events.subscribe();
    h.reconciler.reconcile_once().await.unwrap();

    h.controller.fail_with(TransportError::Network {
        reason: "connection refused".to_string(),
    });
    assert!(h.reconciler.reconcile_once().await.is_err());

    let mut partial = machine_status();
    partial["spindles"] = json!([]);
    h.controller.set_status(partial);
    assert!(h.reconciler.reconcile_once().await.is_err());

    assert_eq!(h.sink.views.lock().len(), 1);
    assert!(h.reconciler.view_handle().read().is_some());
    assert_eq!(events.try_recv().unwrap(), PanelEvent::ViewUpdated);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_running_task_publishes_failures() {
    let h = harness(machine_status(), true);
    h.controller.fail_with(TransportError::Http { status: 500 });
    let mut events = h.events.subscribe();

    let handle = h.reconciler.start();
    let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .unwrap()
        .unwrap();
    handle.stop().await;

    assert!(matches!(event, PanelEvent::ReconcileFailed(_)));
    assert!(h.sink.views.lock().is_empty());
}

#[tokio::test]
async fn test_busy_command_endpoint_does_not_stall_monitoring() {
    let h = harness(machine_status(), true);
    h.controller.reject_posts_with(TransportError::Http { status: 503 });
    h.controls.unlock();
    h.controls.start();

    let sink = h.sink.clone();
    let handle = h.reconciler.start();
    tokio::time::sleep(Duration::from_millis(300)).await;

    // e-stop raised while the controller is still refusing commands
    let mut status = machine_status();
    status["global"]["EstopFault"] = json!(true);
    h.controller.set_status(status);
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.stop().await;

    let views = sink.views.lock();
    assert!(views.len() >= 10, "only {} views rendered", views.len());
    assert!(views.last().unwrap().faults.estop_modal);
    assert!(h.controller.rejected() > 0);
}
