use atoll_shared::models::events::{RouteChange, RoutesChangedEvent, ROUTES_CHANGED_TOPIC};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Forwards `routes.changed` notifications into the in-process feed the route directory watches.
pub async fn start_routes_worker(
    brokers: String,
    group_id: String,
    tx: broadcast::Sender<RoutesChangedEvent>,
) {
    let consumer: StreamConsumer = match ClientConfig::new()
        .set("bootstrap.servers", &brokers)
        .set("group.id", &group_id)
        .set("enable.auto.commit", "true")
        .set("auto.offset.reset", "latest")
        .create()
    {
        Ok(consumer) => consumer,
        Err(e) => {
            error!("Routes consumer creation failed: {}", e);
            return;
        }
    };

    if let Err(e) = consumer.subscribe(&[ROUTES_CHANGED_TOPIC]) {
        error!("Can't subscribe to {}: {}", ROUTES_CHANGED_TOPIC, e);
        return;
    }

    info!("Routes worker started, listening to {}...", ROUTES_CHANGED_TOPIC);

    loop {
        match consumer.recv().await {
            Err(e) => error!("Kafka error: {}", e),
            Ok(m) => {
                let event = decode_event(m.payload());
                // No receivers just means nobody is watching yet.
                if tx.send(event).is_err() {
                    warn!("Route change dropped, directory is not listening");
                }
            }
        }
    }
}

/// Anything unreadable still counts as a change, so the directory refetches.
fn decode_event(payload: Option<&[u8]>) -> RoutesChangedEvent {
    match payload.map(|bytes| serde_json::from_slice::<RoutesChangedEvent>(bytes)) {
        Some(Ok(event)) => event,
        Some(Err(e)) => {
            warn!("Unreadable route change payload: {}", e);
            RoutesChangedEvent::now(RouteChange::Update, None)
        }
        None => RoutesChangedEvent::now(RouteChange::Update, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_payload_still_triggers_refresh() {
        assert_eq!(decode_event(Some(b"not json")).change, RouteChange::Update);
        assert_eq!(decode_event(None).change, RouteChange::Update);

        let event = decode_event(Some(br#"{"change":"DELETE","route_id":null,"timestamp":5}"#));
        assert_eq!(event.change, RouteChange::Delete);
        assert_eq!(event.timestamp, 5);
    }
}
