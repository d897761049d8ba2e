//! # Print Session Tests
//!
//! End-to-end print attempts against the scripted adapter and permission
//! platform. Each test checks the states a session walks through and the
//! calls that reached the adapter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tokio::sync::{Notify, oneshot};

use ticket_printer::adapter::mock::{ConnectBehavior, LinkBehavior};
use ticket_printer::adapter::{MockAdapter, ScanEvent};
use ticket_printer::config::SessionConfig;
use ticket_printer::device::{PairedPayload, RawDevice};
use ticket_printer::permission::mock::ScriptedPermissions;
use ticket_printer::permission::{HostPermissions, PermissionPlatform};
use ticket_printer::selector::{
    DeviceSelector, FirstPrinter, FixedAddress, Selection, SelectionPrompt,
};
use ticket_printer::session::SessionState;
use ticket_printer::ticket::PaymentStatus;
use ticket_printer::{FailureReason, PrintSession, Ticket};

const PRINTER: &str = "00:11:22:33:44:55";

// ============================================================================
// Fixtures
// ============================================================================

fn jane_doe() -> Ticket {
    Ticket {
        client_name: "Jane Doe".into(),
        ticket_id: "ABC123XY".into(),
        phone_number: "0772000000".into(),
        from: "Kampala".into(),
        to: "Mbarara".into(),
        amount_paid: "15000".into(),
        payment_status: Some(PaymentStatus {
            name: Some("Cash".into()),
        }),
        temperature: "36.5".into(),
        printed_by: "John Staff".into(),
        number_plate_prefix: "UBX".into(),
        number_plate_postfix: "123A".into(),
        confirmation_code: "K3J9QX2A".into(),
        date: "17-10-2026 9:05".into(),
    }
}

fn printer_adapter() -> MockAdapter {
    MockAdapter::new().scan_events(vec![
        ScanEvent::Found(RawDevice::new(Some("POS-58"), PRINTER)),
        ScanEvent::Found(RawDevice::new(Some("Headset"), "66:77:88:99:AA:BB")),
        ScanEvent::Complete,
    ])
}

fn session(adapter: &Arc<MockAdapter>, permissions: Arc<dyn PermissionPlatform>) -> PrintSession {
    PrintSession::new(adapter.clone(), permissions, &SessionConfig::default())
}

fn host_session(adapter: &Arc<MockAdapter>) -> PrintSession {
    session(adapter, Arc::new(HostPermissions))
}

fn concat(chunks: &[Vec<u8>]) -> Vec<u8> {
    chunks.iter().flatten().copied().collect()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn has_connect(calls: &[String]) -> bool {
    calls.iter().any(|c| c.starts_with("connect "))
}

// ============================================================================
// Successful print
// ============================================================================

#[tokio::test]
async fn test_prints_jane_doe_ticket() {
    let adapter = Arc::new(printer_adapter());
    let session = host_session(&adapter);

    let report = session
        .start(&jane_doe(), &mut FixedAddress(PRINTER.into()))
        .await
        .unwrap();

    assert_eq!(report.device.address, PRINTER);
    assert!(report.device.is_printer);
    assert_eq!(session.state(), SessionState::Succeeded);
    assert_eq!(
        session.history(),
        vec![
            SessionState::Idle,
            SessionState::RequestingPermission,
            SessionState::Discovering,
            SessionState::AwaitingSelection,
            SessionState::Connecting,
            SessionState::Formatting,
            SessionState::Transmitting,
            SessionState::Succeeded,
        ]
    );

    let written = adapter.written();
    assert_eq!(written.len(), report.commands);
    let bytes = concat(&written);
    assert_eq!(bytes.len(), report.bytes);
    assert_eq!(&bytes[..2], &[0x1B, 0x40]);
    assert!(contains(&bytes, b"Client Name: Jane Doe"));
    assert!(contains(&bytes, b"Paid: UGX 15,000"));
    assert!(contains(&bytes, b"TICKET:ABC123XY"));
    assert!(adapter.link_closed());
}

#[tokio::test]
async fn test_first_printer_prompt_skips_other_devices() {
    let adapter = Arc::new(
        MockAdapter::new().scan_events(vec![
            ScanEvent::Found(RawDevice::new(Some("Headset"), "66:77:88:99:AA:BB")),
            ScanEvent::Found(RawDevice::new(Some("Thermal Printer"), PRINTER)),
            ScanEvent::Complete,
        ]),
    );
    let session = host_session(&adapter);

    let report = session.start(&jane_doe(), &mut FirstPrinter).await.unwrap();
    assert_eq!(report.device.name, "Thermal Printer");
    assert!(adapter.calls().contains(&format!("connect {}", PRINTER)));
}

#[tokio::test]
async fn test_paired_printer_is_selectable_without_being_scanned() {
    let adapter = Arc::new(MockAdapter::new().paired(PairedPayload::Json(format!(
        r#"[{{"name":"POS-80","address":"{}"}}]"#,
        PRINTER
    ))));
    let session = host_session(&adapter);

    let report = session
        .start(&jane_doe(), &mut FixedAddress(PRINTER.into()))
        .await
        .unwrap();
    assert!(report.device.paired);
}

// ============================================================================
// Permissions
// ============================================================================

#[tokio::test]
async fn test_permission_denied_never_discovers() {
    let adapter = Arc::new(printer_adapter());
    let permissions = Arc::new(ScriptedPermissions::modern().approving(false));
    let session = session(&adapter, permissions.clone());

    let result = session
        .start(&jane_doe(), &mut FixedAddress(PRINTER.into()))
        .await;

    assert_eq!(result, Err(FailureReason::PermissionDenied));
    assert_eq!(
        session.history(),
        vec![
            SessionState::Idle,
            SessionState::RequestingPermission,
            SessionState::Failed(FailureReason::PermissionDenied),
        ]
    );
    assert!(adapter.calls().is_empty());
    assert_eq!(permissions.requests().len(), 1);
}

#[tokio::test]
async fn test_granted_permissions_are_not_requested_again() {
    let adapter = Arc::new(printer_adapter());
    let permissions = Arc::new(ScriptedPermissions::legacy().granting_all());
    let session = session(&adapter, permissions.clone());

    session
        .start(&jane_doe(), &mut FixedAddress(PRINTER.into()))
        .await
        .unwrap();
    assert!(permissions.requests().is_empty());
}

// ============================================================================
// Discovery failures
// ============================================================================

#[tokio::test]
async fn test_empty_scan_is_no_devices_found() {
    let adapter = Arc::new(MockAdapter::new());
    let session = host_session(&adapter);

    let result = session.start(&jane_doe(), &mut FirstPrinter).await;

    assert_eq!(result, Err(FailureReason::NoDevicesFound));
    assert_eq!(
        session.state(),
        SessionState::Failed(FailureReason::NoDevicesFound)
    );
    assert!(!has_connect(&adapter.calls()));
}

#[tokio::test]
async fn test_bluetooth_that_cannot_be_enabled() {
    let adapter = Arc::new(printer_adapter().disabled().enable_stays_off());
    let session = host_session(&adapter);

    let result = session.start(&jane_doe(), &mut FirstPrinter).await;

    assert_eq!(result, Err(FailureReason::BluetoothDisabled));
    assert!(!adapter.calls().contains(&"start_scan".to_string()));
}

#[tokio::test]
async fn test_enable_error_is_discovery_failure() {
    let adapter = Arc::new(printer_adapter().disabled().enable_fails());
    let session = host_session(&adapter);

    let result = session.start(&jane_doe(), &mut FirstPrinter).await;

    let Err(FailureReason::DiscoveryFailed(detail)) = &result else {
        panic!("unexpected result: {:?}", result);
    };
    assert!(detail.contains("adapter refused to power on"));
    assert_eq!(
        session.state(),
        SessionState::Failed(result.unwrap_err())
    );
    assert!(!adapter.calls().contains(&"start_scan".to_string()));
}

#[tokio::test]
async fn test_bluetooth_off_without_auto_enable() {
    let adapter = Arc::new(printer_adapter().disabled());
    let config = SessionConfig {
        auto_enable_bluetooth: false,
        ..SessionConfig::default()
    };
    let session = PrintSession::new(adapter.clone(), Arc::new(HostPermissions), &config);

    let result = session.start(&jane_doe(), &mut FirstPrinter).await;

    assert_eq!(result, Err(FailureReason::BluetoothDisabled));
    assert!(!adapter.calls().contains(&"enable".to_string()));
}

#[tokio::test]
async fn test_bluetooth_enabled_on_demand() {
    let adapter = Arc::new(printer_adapter().disabled());
    let session = host_session(&adapter);

    session.start(&jane_doe(), &mut FirstPrinter).await.unwrap();

    let calls = adapter.calls();
    assert_eq!(&calls[..3], &["is_enabled", "enable", "is_enabled"]);
}

#[tokio::test]
async fn test_scan_that_cannot_start() {
    let adapter = Arc::new(printer_adapter().scan_start_fails());
    let session = host_session(&adapter);

    let result = session.start(&jane_doe(), &mut FirstPrinter).await;

    assert!(matches!(result, Err(FailureReason::DiscoveryFailed(_))));
}

// ============================================================================
// Selection
// ============================================================================

#[tokio::test]
async fn test_cancel_returns_to_idle_silently() {
    let adapter = Arc::new(printer_adapter());
    let session = host_session(&adapter);

    struct Cancel;

    #[async_trait]
    impl SelectionPrompt for Cancel {
        async fn choose(&mut self, _selector: &mut DeviceSelector) -> Selection {
            Selection::Cancelled
        }
    }

    let result = session.start(&jane_doe(), &mut Cancel).await;

    let reason = result.unwrap_err();
    assert_eq!(reason, FailureReason::SelectionCancelled);
    assert!(reason.is_silent());
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(session.history().last(), Some(&SessionState::Idle));
    assert!(!has_connect(&adapter.calls()));
    assert!(adapter.written().is_empty());
}

#[tokio::test]
async fn test_unknown_fixed_address_cancels() {
    let adapter = Arc::new(printer_adapter());
    let session = host_session(&adapter);

    let result = session
        .start(&jane_doe(), &mut FixedAddress("01:02:03:04:05:06".into()))
        .await;

    assert_eq!(result, Err(FailureReason::SelectionCancelled));
    assert!(!has_connect(&adapter.calls()));
}

#[tokio::test]
async fn test_prompt_sees_merged_and_filtered_list() {
    let adapter = Arc::new(
        MockAdapter::new()
            .paired(PairedPayload::Json(format!(
                r#"[{{"name":"POS-58","address":"{}"}}]"#,
                PRINTER
            )))
            .scan_events(vec![
                ScanEvent::Found(RawDevice::new(Some("POS-58"), &PRINTER.to_lowercase())),
                ScanEvent::Found(RawDevice::new(Some("My POS Phone"), "A4:C3:F0:11:22:33")),
                ScanEvent::Found(RawDevice::new(None, "66:77:88:99:AA:BB")),
                ScanEvent::Complete,
            ]),
    );
    let session = host_session(&adapter).with_printers_only(true);

    struct Inspect(Option<oneshot::Sender<(Vec<String>, Vec<String>)>>);

    #[async_trait]
    impl SelectionPrompt for Inspect {
        async fn choose(&mut self, selector: &mut DeviceSelector) -> Selection {
            let all = selector.devices().iter().map(|d| d.name.clone()).collect();
            // Toggling twice leaves the filter as it was.
            selector.toggle_printers_only();
            selector.toggle_printers_only();
            let visible = selector.visible().iter().map(|d| d.name.clone()).collect();
            if let Some(tx) = self.0.take() {
                let _ = tx.send((all, visible));
            }
            Selection::Cancelled
        }
    }

    let (tx, rx) = oneshot::channel();
    let _ = session.start(&jane_doe(), &mut Inspect(Some(tx))).await;
    let (all, visible) = rx.await.unwrap();

    assert_eq!(all, vec!["POS-58", "My POS Phone", "Unknown Device"]);
    // The keyword heuristic matches "pos" inside a phone name.
    assert_eq!(visible, vec!["POS-58", "My POS Phone"]);
}

// ============================================================================
// Connection and transmission
// ============================================================================

#[tokio::test]
async fn test_refused_connection_writes_nothing() {
    let adapter = Arc::new(printer_adapter().connect_behavior(ConnectBehavior::Refuse));
    let session = host_session(&adapter);

    let result = session
        .start(&jane_doe(), &mut FixedAddress(PRINTER.into()))
        .await;

    assert!(matches!(result, Err(FailureReason::ConnectionFailed(_))));
    assert!(adapter.written().is_empty());
    assert_eq!(
        session.history().last(),
        Some(&SessionState::Failed(result.unwrap_err()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_hanging_connection_times_out() {
    let adapter = Arc::new(printer_adapter().connect_behavior(ConnectBehavior::Hang));
    let session = host_session(&adapter);

    let result = session
        .start(&jane_doe(), &mut FixedAddress(PRINTER.into()))
        .await;

    assert!(matches!(result, Err(FailureReason::ConnectionFailed(_))));
    assert!(!session.is_busy());
}

#[tokio::test]
async fn test_transmission_failure_reports_progress_and_closes() {
    let adapter = Arc::new(printer_adapter().link_behavior(LinkBehavior::FailAt(4)));
    let session = host_session(&adapter);

    let reason = session
        .start(&jane_doe(), &mut FixedAddress(PRINTER.into()))
        .await
        .unwrap_err();

    let FailureReason::TransmissionFailed { sent, total, .. } = &reason else {
        panic!("unexpected failure: {:?}", reason);
    };
    assert_eq!(*sent, 4);
    assert!(*total > 4);
    assert!(reason.partial_print_possible());
    assert_eq!(adapter.written().len(), 4);
    assert!(adapter.link_closed());
}

#[tokio::test(start_paused = true)]
async fn test_stalled_transmission_times_out() {
    let adapter = Arc::new(printer_adapter().link_behavior(LinkBehavior::HangAt(0)));
    let session = host_session(&adapter);

    let reason = session
        .start(&jane_doe(), &mut FixedAddress(PRINTER.into()))
        .await
        .unwrap_err();

    assert!(matches!(
        reason,
        FailureReason::TransmissionFailed { sent: 0, .. }
    ));
    assert!(!reason.partial_print_possible());
    assert!(adapter.link_closed());
}

// ============================================================================
// Ordering and reentrancy
// ============================================================================

#[tokio::test]
async fn test_connect_happens_after_selection() {
    let adapter = Arc::new(printer_adapter());
    let session = host_session(&adapter);

    session
        .start(&jane_doe(), &mut FixedAddress(PRINTER.into()))
        .await
        .unwrap();

    let calls = adapter.calls();
    let position = |name: &str| calls.iter().position(|c| c.starts_with(name)).unwrap();
    assert!(position("is_enabled") < position("start_scan"));
    assert!(position("stop_scan") < position("connect "));
    assert!(position("connect ") < position("close"));
}

/// Holds the session in `AwaitingSelection` until released.
struct Gate {
    reached: Option<oneshot::Sender<()>>,
    release: Arc<Notify>,
}

#[async_trait]
impl SelectionPrompt for Gate {
    async fn choose(&mut self, _selector: &mut DeviceSelector) -> Selection {
        if let Some(reached) = self.reached.take() {
            let _ = reached.send(());
        }
        self.release.notified().await;
        Selection::Chosen(PRINTER.into())
    }
}

#[tokio::test]
async fn test_second_start_is_busy() {
    let adapter = Arc::new(printer_adapter());
    let session = Arc::new(host_session(&adapter));
    let release = Arc::new(Notify::new());
    let (reached_tx, reached_rx) = oneshot::channel();

    let first = {
        let session = Arc::clone(&session);
        let mut gate = Gate {
            reached: Some(reached_tx),
            release: Arc::clone(&release),
        };
        tokio::spawn(async move { session.start(&jane_doe(), &mut gate).await })
    };
    reached_rx.await.unwrap();
    assert!(session.is_busy());
    assert_eq!(session.state(), SessionState::AwaitingSelection);

    let second = session
        .start(&jane_doe(), &mut FixedAddress(PRINTER.into()))
        .await;
    assert_eq!(second, Err(FailureReason::Busy));
    assert_eq!(session.state(), SessionState::AwaitingSelection);

    release.notify_one();
    let report = first.await.unwrap().unwrap();
    assert_eq!(report.device.address, PRINTER);
    assert!(!session.is_busy());
    assert_eq!(
        adapter
            .calls()
            .iter()
            .filter(|c| c.starts_with("connect "))
            .count(),
        1
    );
}

#[tokio::test]
async fn test_state_changes_are_observable() {
    let adapter = Arc::new(printer_adapter().scan_delay(Duration::from_millis(20)));
    let session = host_session(&adapter);
    let mut states = session.subscribe();

    let watcher = tokio::spawn(async move {
        let mut seen = Vec::new();
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            let done = state == SessionState::Succeeded;
            seen.push(state);
            if done {
                break;
            }
        }
        seen
    });

    session
        .start(&jane_doe(), &mut FixedAddress(PRINTER.into()))
        .await
        .unwrap();
    let seen = watcher.await.unwrap();

    assert!(seen.contains(&SessionState::Discovering));
    assert_eq!(seen.last(), Some(&SessionState::Succeeded));
}

#[tokio::test]
async fn test_session_can_print_again() {
    let adapter = Arc::new(printer_adapter());
    let session = host_session(&adapter);

    session.start(&jane_doe(), &mut FirstPrinter).await.unwrap();
    session.start(&jane_doe(), &mut FirstPrinter).await.unwrap();

    assert_eq!(session.history().first(), Some(&SessionState::Idle));
    assert_eq!(session.history().len(), 8);
}
