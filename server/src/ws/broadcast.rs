use super::registry::{Connection, ConnectionId, Registry};

/// Outcome of one broadcast call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: Vec<ConnectionId>,
}

/// Broadcast a rendered payload to every registered connection.
pub fn broadcast_all(registry: &Registry, payload: &str) -> DeliveryReport {
    deliver(registry, payload, None)
}

/// Broadcast to every registered connection except `excluded`.
pub fn broadcast_except(
    registry: &Registry,
    payload: &str,
    excluded: ConnectionId,
) -> DeliveryReport {
    deliver(registry, payload, Some(excluded))
}

/// Send a payload to a single connection, registered or not.
pub fn send_to(conn: &Connection, payload: &str) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    record(&mut report, conn, payload);
    report
}

/// Snapshot first, then send without holding the table lock. A failed
/// connection is logged and skipped; the rest still get the payload.
fn deliver(registry: &Registry, payload: &str, excluded: Option<ConnectionId>) -> DeliveryReport {
    let mut report = DeliveryReport::default();

    for member in registry.snapshot_members() {
        if Some(member.connection.id()) == excluded {
            continue;
        }
        record(&mut report, &member.connection, payload);
    }

    tracing::debug!(
        recipients = report.delivered,
        failed = report.failed.len(),
        "Broadcast payload"
    );
    report
}

fn record(report: &mut DeliveryReport, conn: &Connection, payload: &str) {
    match conn.send_text(payload) {
        Ok(()) => report.delivered += 1,
        Err(e) => {
            tracing::warn!(conn_id = %conn.id(), error = %e, "Dropping payload for closed connection");
            report.failed.push(conn.id());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::ws::Message;
    use tokio::sync::mpsc;

    fn connection() -> (Connection, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Connection::new(tx), rx)
    }

    fn texts(rx: &mut mpsc::UnboundedReceiver<Message>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            if let Message::Text(text) = msg {
                out.push(text.to_string());
            }
        }
        out
    }

    #[test]
    fn test_broadcast_all_reaches_every_member_once() {
        let registry = Registry::new();
        let (a, mut rx_a) = connection();
        let (b, mut rx_b) = connection();
        let (outsider, mut rx_outsider) = connection();
        registry.register(&a, "alice").unwrap();
        registry.register(&b, "bob").unwrap();

        let report = broadcast_all(&registry, "hello");

        assert_eq!(report.delivered, 2);
        assert!(report.failed.is_empty());
        assert_eq!(texts(&mut rx_a), vec!["hello"]);
        assert_eq!(texts(&mut rx_b), vec!["hello"]);
        assert!(texts(&mut rx_outsider).is_empty());
        drop(outsider);
    }

    #[test]
    fn test_broadcast_except_skips_excluded() {
        let registry = Registry::new();
        let (a, mut rx_a) = connection();
        let (b, mut rx_b) = connection();
        registry.register(&a, "alice").unwrap();
        registry.register(&b, "bob").unwrap();

        let report = broadcast_except(&registry, "bye", b.id());

        assert_eq!(report.delivered, 1);
        assert_eq!(texts(&mut rx_a), vec!["bye"]);
        assert!(texts(&mut rx_b).is_empty());
    }

    #[test]
    fn test_closed_connection_does_not_abort_broadcast() {
        let registry = Registry::new();
        let (a, rx_a) = connection();
        let (b, mut rx_b) = connection();
        let (c, mut rx_c) = connection();
        registry.register(&a, "alice").unwrap();
        registry.register(&b, "bob").unwrap();
        registry.register(&c, "carol").unwrap();

        drop(rx_a);
        let report = broadcast_all(&registry, "still here");

        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, vec![a.id()]);
        assert_eq!(texts(&mut rx_b), vec!["still here"]);
        assert_eq!(texts(&mut rx_c), vec!["still here"]);
    }

    #[test]
    fn test_send_to_unicast() {
        let (a, mut rx_a) = connection();
        let report = send_to(&a, "welcome");
        assert_eq!(report.delivered, 1);
        assert_eq!(texts(&mut rx_a), vec!["welcome"]);

        drop(rx_a);
        let report = send_to(&a, "again");
        assert_eq!(report.failed, vec![a.id()]);
    }
}
