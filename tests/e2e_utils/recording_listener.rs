#![cfg(test)]
#![allow(dead_code)]

use std::sync::Mutex;

use tcpbridge::domain::Result;
use tcpbridge::ports::ProxyListener;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start,
    Stop,
    Request(Vec<u8>),
    Response(Vec<u8>),
}

/// Keeps every event in arrival order.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<Event>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn starts(&self) -> usize {
        self.count(|e| matches!(e, Event::Start))
    }

    pub fn stops(&self) -> usize {
        self.count(|e| matches!(e, Event::Stop))
    }

    /// Data events only, lifecycle events dropped.
    pub fn data_events(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, Event::Request(_) | Event::Response(_)))
            .collect()
    }

    pub fn request_bytes(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Request(bytes) => Some(bytes),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn response_bytes(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Response(bytes) => Some(bytes),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(*e)).count()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl ProxyListener for RecordingListener {
    fn on_start(&self) -> Result<()> {
        self.push(Event::Start);
        Ok(())
    }

    fn on_stop(&self) -> Result<()> {
        self.push(Event::Stop);
        Ok(())
    }

    fn on_request(&self, message: &[u8]) -> Result<()> {
        self.push(Event::Request(message.to_vec()));
        Ok(())
    }

    fn on_response(&self, message: &[u8]) -> Result<()> {
        self.push(Event::Response(message.to_vec()));
        Ok(())
    }
}
