//! End-to-end attachment flows through the coordinator.

use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tether::{
    AttachedRecord, AttachedStore, Coordinator, DeviceId, MemoryStore, Occurrence, Peripheral,
    RadioError, RadioManager, RadioPower, ServiceId, Status,
};
use tokio::sync::broadcast;
use tokio::time::timeout;

/// Radio double recording every request.
#[derive(Default)]
struct ScriptedRadio {
    scans: Mutex<Vec<ServiceId>>,
    stops: Mutex<usize>,
    connects: Mutex<Vec<DeviceId>>,
}

impl ScriptedRadio {
    fn scans(&self) -> Vec<ServiceId> {
        self.scans.lock().unwrap().clone()
    }

    fn stops(&self) -> usize {
        *self.stops.lock().unwrap()
    }

    fn connects(&self) -> Vec<DeviceId> {
        self.connects.lock().unwrap().clone()
    }
}

impl RadioManager for ScriptedRadio {
    fn scan(&self, service: ServiceId) -> Result<(), RadioError> {
        self.scans.lock().unwrap().push(service);
        Ok(())
    }

    fn stop_scan(&self) -> Result<(), RadioError> {
        *self.stops.lock().unwrap() += 1;
        Ok(())
    }

    fn connect(&self, device: DeviceId) -> Result<(), RadioError> {
        self.connects.lock().unwrap().push(device);
        Ok(())
    }
}

fn peripheral(name: &str) -> Peripheral {
    Peripheral {
        id: DeviceId::random(),
        name: Some(name.to_string()),
    }
}

async fn next_status(status: &mut broadcast::Receiver<Status>) -> Status {
    timeout(Duration::from_secs(2), status.recv())
        .await
        .expect("timed out waiting for a status notification")
        .expect("status channel closed")
}

async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn forced_scan_attach_reaches_ready() {
    let radio = Arc::new(ScriptedRadio::default());
    let store = Arc::new(MemoryStore::new());
    let coordinator = Coordinator::builder()
        .radio(radio.clone())
        .store(store.clone())
        .expected_peripherals(2)
        .spawn()
        .expect("coordinator should spawn");
    let mut status = coordinator.subscribe();
    let service = ServiceId::random();

    coordinator.attach(service, true);
    let sink = coordinator.sink();
    sink.deliver(Occurrence::Discovered(peripheral("RED")));
    sink.deliver(Occurrence::Discovered(peripheral("GREEN")));

    assert_eq!(next_status(&mut status).await, Status::Ready);
    assert_eq!(radio.scans(), vec![service]);
    assert_eq!(radio.stops(), 1);
    assert_eq!(radio.connects().len(), 2);
    assert_eq!(store.load_attached(&service).unwrap().len(), 2);

    coordinator.shutdown().await;
}

#[tokio::test]
async fn retrieve_reconnects_previously_attached_devices() {
    let radio = Arc::new(ScriptedRadio::default());
    let store = Arc::new(MemoryStore::new());
    let service = ServiceId::random();
    let devices = [DeviceId::random(), DeviceId::random()];
    store
        .save_attached(&[
            AttachedRecord {
                device: devices[0],
                service,
                attached_at: Utc::now(),
            },
            AttachedRecord {
                device: devices[1],
                service,
                attached_at: Utc::now(),
            },
        ])
        .unwrap();

    let coordinator = Coordinator::builder()
        .radio(radio.clone())
        .store(store.clone())
        .expected_peripherals(2)
        .spawn()
        .expect("coordinator should spawn");
    let mut status = coordinator.subscribe();
    let sink = coordinator.sink();

    coordinator.attach(service, false);
    sink.deliver(Occurrence::Connected(devices[0]));
    sink.deliver(Occurrence::Connected(devices[1]));

    assert_eq!(next_status(&mut status).await, Status::Ready);
    // No scan happened; the recorded devices were reconnected directly.
    assert!(radio.scans().is_empty());
    assert_eq!(radio.connects(), devices.to_vec());
    // The roster was persisted again on reaching Ready.
    assert_eq!(store.load_attached(&service).unwrap().len(), 4);

    coordinator.shutdown().await;
}

#[tokio::test]
async fn retrieve_miss_falls_back_to_scanning() {
    let radio = Arc::new(ScriptedRadio::default());
    let coordinator = Coordinator::builder()
        .radio(radio.clone())
        .expected_peripherals(1)
        .spawn()
        .expect("coordinator should spawn");
    let mut status = coordinator.subscribe();
    let service = ServiceId::random();

    // Nothing persisted for this service: the retrieve re-routes into a
    // scan.
    coordinator.attach(service, false);
    {
        let radio = radio.clone();
        wait_until(move || radio.scans().len() == 1).await;
    }

    coordinator
        .sink()
        .deliver(Occurrence::Discovered(peripheral("RED")));

    assert_eq!(next_status(&mut status).await, Status::Ready);
    assert_eq!(radio.scans(), vec![service]);

    coordinator.shutdown().await;
}

#[tokio::test]
async fn radio_power_cycle_publishes_status() {
    let radio = Arc::new(ScriptedRadio::default());
    let coordinator = Coordinator::builder()
        .radio(radio)
        .spawn()
        .expect("coordinator should spawn");
    let mut status = coordinator.subscribe();
    let sink = coordinator.sink();

    sink.deliver(Occurrence::PowerChanged(RadioPower::On));
    assert_eq!(next_status(&mut status).await, Status::Online);

    sink.deliver(Occurrence::PowerChanged(RadioPower::Off));
    assert_eq!(next_status(&mut status).await, Status::Offline);

    sink.deliver(Occurrence::PowerChanged(RadioPower::Unauthorized));
    assert_eq!(next_status(&mut status).await, Status::Offline);

    coordinator.shutdown().await;
}

#[tokio::test]
async fn missing_radio_recovers_without_notifying() {
    let coordinator = Coordinator::builder()
        .spawn()
        .expect("coordinator should spawn");
    let mut status = coordinator.subscribe();

    // The scan effect fails on the missing radio manager; the machine
    // falls back without publishing anything.
    coordinator.attach(ServiceId::random(), true);
    assert!(timeout(Duration::from_millis(300), status.recv())
        .await
        .is_err());

    // The coordinator is still alive and processing.
    coordinator
        .sink()
        .deliver(Occurrence::PowerChanged(RadioPower::On));
    assert_eq!(next_status(&mut status).await, Status::Online);

    coordinator.shutdown().await;
}
