//! Event system for component lifecycle events

use crate::WebcamState;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::debug;
use webcam_media::ErrorCategory;

/// Events emitted by a [`crate::Webcam`]
#[derive(Debug, Clone, PartialEq)]
pub enum WebcamEvent {
    /// A capture stream was acquired and bound to the preview
    UserMedia {
        /// Stream (or bare track) ID
        stream_id: String,
    },
    /// An acquisition attempt failed
    UserMediaError {
        /// Message handed to the error callback
        message: String,
        /// Error classification
        category: ErrorCategory,
    },
    /// The component moved between lifecycle states
    StateChanged {
        /// Previous state
        from: WebcamState,
        /// New state
        to: WebcamState,
    },
    /// A held stream was stopped and released
    StreamReleased {
        /// Stream (or bare track) ID
        stream_id: String,
        /// Number of tracks stopped
        tracks_stopped: usize,
    },
}

impl WebcamEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            WebcamEvent::UserMedia { .. } => "user_media",
            WebcamEvent::UserMediaError { .. } => "user_media_error",
            WebcamEvent::StateChanged { .. } => "state_changed",
            WebcamEvent::StreamReleased { .. } => "stream_released",
        }
    }

    /// Check if this is an error event
    pub fn is_error_event(&self) -> bool {
        matches!(self, WebcamEvent::UserMediaError { .. })
    }
}

/// Stream of component events for async iteration
#[derive(Debug)]
pub struct EventStream {
    receiver: mpsc::UnboundedReceiver<WebcamEvent>,
}

impl EventStream {
    /// Create a new event stream with a receiver
    pub fn new(receiver: mpsc::UnboundedReceiver<WebcamEvent>) -> Self {
        Self { receiver }
    }

    /// Get the next event from the stream
    pub async fn next(&mut self) -> Option<WebcamEvent> {
        self.receiver.recv().await
    }

    /// Try to get the next event without waiting
    pub fn try_next(&mut self) -> Result<Option<WebcamEvent>, mpsc::error::TryRecvError> {
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => {
                Err(mpsc::error::TryRecvError::Disconnected)
            }
        }
    }

    /// Drain every event queued so far
    pub fn drain(&mut self) -> Vec<WebcamEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Close the event stream
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

impl Stream for EventStream {
    type Item = WebcamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Fan-out of events to every live subscriber
#[derive(Debug, Default)]
pub(crate) struct EventBus {
    subscribers: Vec<mpsc::UnboundedSender<WebcamEvent>>,
}

impl EventBus {
    pub(crate) fn subscribe(&mut self) -> EventStream {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.push(sender);
        EventStream::new(receiver)
    }

    pub(crate) fn emit(&mut self, event: WebcamEvent) {
        debug!("Webcam event: {}", event.event_type());
        // Dropped streams are pruned on the next emit.
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}
