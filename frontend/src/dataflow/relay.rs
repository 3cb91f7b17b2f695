//! Event streaming from UI callbacks into Actors.

use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use std::sync::{Arc, OnceLock};

/// Sending half of an event stream consumed by one Actor.
///
/// Relays are named `{source}_{event}_relay`, e.g. `label_clicked_relay`
/// or `page_loaded_relay`.
///
/// In debug builds a relay remembers the first code location that sent
/// through it and panics when another location tries to. Route every send
/// through one function when several call sites need the same event.
#[derive(Clone, Debug)]
pub struct Relay<T = ()>
where
    T: Clone + Send + Sync + 'static,
{
    sender: UnboundedSender<T>,
    #[cfg(debug_assertions)]
    emit_location: Arc<OnceLock<&'static std::panic::Location<'static>>>,
}

#[derive(Debug, Clone)]
pub enum RelayError {
    /// The receiving Actor is gone.
    ChannelClosed,
    #[cfg(debug_assertions)]
    MultipleEmitters {
        previous: &'static std::panic::Location<'static>,
        current: &'static std::panic::Location<'static>,
    },
}

impl<T> Relay<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> (Self, UnboundedReceiver<T>) {
        let (sender, receiver) = unbounded();
        (
            Relay {
                sender,
                #[cfg(debug_assertions)]
                emit_location: Arc::new(OnceLock::new()),
            },
            receiver,
        )
    }

    #[cfg(debug_assertions)]
    #[track_caller]
    fn check_single_source(&self) -> Result<(), RelayError> {
        let caller = std::panic::Location::caller();
        match self.emit_location.set(caller) {
            Ok(()) => Ok(()),
            Err(previous) if previous == caller => Ok(()),
            Err(previous) => Err(RelayError::MultipleEmitters {
                previous,
                current: caller,
            }),
        }
    }

    /// Send an event. Events sent after the Actor is gone are dropped.
    #[track_caller]
    pub fn send(&self, value: T) {
        #[cfg(debug_assertions)]
        if let Err(error) = self.check_single_source() {
            panic!("{:?}", error);
        }
        let _ = self.sender.unbounded_send(value);
    }

    #[track_caller]
    pub fn try_send(&self, value: T) -> Result<(), RelayError> {
        #[cfg(debug_assertions)]
        self.check_single_source()?;

        self.sender
            .unbounded_send(value)
            .map_err(|_| RelayError::ChannelClosed)
    }
}

impl<T> Default for Relay<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// A disconnected relay; everything sent through it is dropped.
    fn default() -> Self {
        let (relay, _receiver) = Self::new();
        relay
    }
}

pub fn relay<T>() -> (Relay<T>, UnboundedReceiver<T>)
where
    T: Clone + Send + Sync + 'static,
{
    Relay::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use shared::NodeId;

    #[tokio::test]
    async fn delivers_events_in_order() {
        let (label_clicked_relay, mut label_clicked_stream) = relay::<NodeId>();

        for id in [3, 1, 2] {
            label_clicked_relay.send(NodeId(id));
        }

        let received: Vec<NodeId> = label_clicked_stream.by_ref().take(3).collect().await;
        assert_eq!(received, vec![NodeId(3), NodeId(1), NodeId(2)]);
    }

    #[tokio::test]
    async fn try_send_fails_once_the_receiver_is_dropped() {
        let (relay, mut receiver) = Relay::new();
        let send = |value: u64| relay.try_send(value);

        assert!(send(1).is_ok());
        assert_eq!(receiver.next().await, Some(1));

        drop(receiver);
        assert!(matches!(send(2), Err(RelayError::ChannelClosed)));
    }

    #[cfg(debug_assertions)]
    #[test]
    fn second_send_location_is_rejected() {
        let (relay, _receiver) = relay::<()>();
        // Each try_send below is a distinct call site.
        assert!(relay.try_send(()).is_ok());
        assert!(matches!(
            relay.try_send(()),
            Err(RelayError::MultipleEmitters { .. })
        ));
    }
}
