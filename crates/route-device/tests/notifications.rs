//! State and status notification delivery.

mod common;

use common::{charge, charge_fault, Harness};
use device_bus::EventPublisher;
use route_device::{
    DeviceApi, DeviceEvent, DeviceObserver, DeviceState, EventFilter, EventTopic, Subscription,
};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::time::timeout;
use tokio_stream::StreamExt;

async fn next_event(sub: &mut Subscription) -> DeviceEvent {
    timeout(Duration::from_millis(100), sub.recv())
        .await
        .expect("Should receive within timeout")
        .expect("Bus should stay open")
}

fn states(events: &[DeviceEvent]) -> Vec<DeviceState> {
    events
        .iter()
        .filter_map(|e| match e {
            DeviceEvent::StateChanged { state, .. } => Some(*state),
            _ => None,
        })
        .collect()
}

fn statuses(events: &[DeviceEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            DeviceEvent::StatusChanged { status, .. } => Some(status.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_each_transition_notifies_both_channels_in_order() {
    let harness = Harness::new();
    let service = &harness.service;
    let mut sub = service.subscribe(EventFilter::all());

    service.init().await.unwrap();
    service.start().await.unwrap();
    service.stop().await.unwrap();
    service.start().await.unwrap();
    service.stop().await.unwrap();

    let events = sub.drain();
    assert_eq!(
        states(&events),
        vec![
            DeviceState::On,
            DeviceState::Running,
            DeviceState::On,
            DeviceState::Running,
            DeviceState::On,
        ]
    );
    assert_eq!(
        statuses(&events),
        vec!["INITIALIZED", "STARTED", "STOPPED", "STARTED", "STOPPED"]
    );

    // State before status within a transition, transitions in commit order.
    let sequences: Vec<u64> = events.iter().map(DeviceEvent::sequence).collect();
    assert_eq!(sequences, vec![1, 1, 2, 2, 3, 3, 4, 4, 5, 5]);
}

#[tokio::test]
async fn test_repeated_fault_notifies_status_twice() {
    let harness = Harness::new();
    let service = &harness.service;
    service.init().await.unwrap();
    service.start().await.unwrap();
    let mut sub = service.subscribe(EventFilter::all());

    harness.engine().process("billing", charge(-1)).unwrap();
    harness.engine().process("billing", charge(-1)).unwrap();

    let events = sub.drain();
    let description = charge_fault(-1).render();
    assert_eq!(states(&events), vec![DeviceState::Alarm]);
    assert_eq!(statuses(&events), vec![description.clone(), description]);
    assert_eq!(service.state(), DeviceState::Alarm);
}

#[tokio::test]
async fn test_late_subscriber_sees_only_later_transitions() {
    let harness = Harness::new();
    let service = &harness.service;
    service.init().await.unwrap();
    service.start().await.unwrap();

    let mut sub = service.subscribe(EventFilter::all());
    service.stop().await.unwrap();

    let first = next_event(&mut sub).await;
    assert_eq!(
        first,
        DeviceEvent::StateChanged {
            device: "test/route/1".to_string(),
            state: DeviceState::On,
            sequence: 3,
        }
    );
    let second = next_event(&mut sub).await;
    assert_eq!(second.sequence(), 3);
    assert!(sub.drain().is_empty());
}

#[tokio::test]
async fn test_status_only_commit_skips_state_channel() {
    let harness = Harness::new();
    let service = &harness.service;
    service.init().await.unwrap();
    let mut sub = service.subscribe(EventFilter::all());

    let err = service.stop().await.unwrap_err();

    let events = sub.drain();
    assert!(states(&events).is_empty());
    assert_eq!(statuses(&events), vec![err.to_string()]);
}

#[tokio::test]
async fn test_topic_filter() {
    let harness = Harness::new();
    let service = &harness.service;
    let mut state_only = service.subscribe(EventFilter::topics(vec![EventTopic::State]));

    service.init().await.unwrap();
    service.start().await.unwrap();

    let events = state_only.drain();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.topic() == EventTopic::State));
}

#[tokio::test]
async fn test_commands_succeed_without_observers() {
    let harness = Harness::new();
    let service = &harness.service;

    service.init().await.unwrap();
    service.start().await.unwrap();

    let bus = service.event_bus();
    assert_eq!(bus.events_published(), 4);
    assert_eq!(bus.events_dropped(), 4);
    assert_eq!(service.state(), DeviceState::Running);
}

#[tokio::test]
async fn test_event_stream() {
    let harness = Harness::new();
    let service = &harness.service;
    let mut stream = service.event_stream(EventFilter::topics(vec![EventTopic::Status]));

    service.init().await.unwrap();

    let event = timeout(Duration::from_millis(100), stream.next())
        .await
        .expect("Should receive within timeout")
        .expect("Stream should stay open");
    assert_eq!(
        event,
        DeviceEvent::StatusChanged {
            device: "test/route/1".to_string(),
            status: "INITIALIZED".to_string(),
            sequence: 1,
        }
    );
}

#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<String>>,
}

impl DeviceObserver for Recorder {
    fn on_state_changed(&self, _device: &str, state: DeviceState, _sequence: u64) {
        self.seen.lock().unwrap().push(format!("state:{state}"));
    }

    fn on_status_changed(&self, _device: &str, status: &str, _sequence: u64) {
        self.seen.lock().unwrap().push(format!("status:{status}"));
    }
}

async fn wait_for(recorder: &Recorder, count: usize) {
    timeout(Duration::from_secs(1), async {
        while recorder.seen.lock().unwrap().len() < count {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("observer did not receive events in time");
}

#[tokio::test]
async fn test_callback_observer() {
    let harness = Harness::new();
    let service = &harness.service;
    let recorder = Arc::new(Recorder::default());
    let observer: Arc<dyn DeviceObserver> = recorder.clone();
    let weak: Weak<dyn DeviceObserver> = Arc::downgrade(&observer);
    let _handle = service.register_observer(weak, EventFilter::all());

    service.init().await.unwrap();
    service.start().await.unwrap();
    harness.engine().process("billing", charge(-4)).unwrap();

    wait_for(&recorder, 6).await;
    assert_eq!(
        *recorder.seen.lock().unwrap(),
        vec![
            "state:ON".to_string(),
            "status:INITIALIZED".to_string(),
            "state:RUNNING".to_string(),
            "status:STARTED".to_string(),
            "state:ALARM".to_string(),
            format!("status:{}", charge_fault(-4).render()),
        ]
    );
}
