//! # Environment Event Stream
//!
//! Surfaces activity-log entries that appeared since the previous fetch.
//!
//! The boundary is inclusive: a fetch returns events with
//! `occurred_at >= mark`. After each tick the mark moves to that tick's start
//! time, never to the newest event time, so an event logged while a fetch is
//! in flight is still inside the next window. Events already reported that
//! sit at or after the new mark are remembered by timestamp and message and
//! dropped from the next fetch, so nothing is reported twice.
//!
//! The activity log carries no event id, so timestamp and message are the
//! whole identity. Two entries with the same text at the same instant that
//! arrive in different fetches are reported once. Entries returned together
//! in one fetch are all kept.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::debug;

use crate::console;
use crate::error::Result;
use crate::poll::TickHook;
use crate::remote::{RemoteControlClient, RemoteEvent};

pub struct EventStream<'a> {
    client: &'a dyn RemoteControlClient,
    application: &'a str,
    environment: &'a str,
    mark: DateTime<Utc>,
    recent: HashSet<RemoteEvent>,
    fetches: u32,
}

impl<'a> EventStream<'a> {
    pub fn new(
        client: &'a dyn RemoteControlClient,
        application: &'a str,
        environment: &'a str,
        mark: DateTime<Utc>,
    ) -> Self {
        Self {
            client,
            application,
            environment,
            mark,
            recent: HashSet::new(),
            fetches: 0,
        }
    }

    pub fn mark(&self) -> DateTime<Utc> {
        self.mark
    }

    /// Number of `describe_events` calls issued so far.
    pub fn fetches(&self) -> u32 {
        self.fetches
    }

    /// Events at or after the current mark not yet reported, oldest first.
    ///
    /// Reads only; the mark is left where it is.
    pub async fn fetch_since(&mut self) -> Result<Vec<RemoteEvent>> {
        self.fetches += 1;
        let mut events = self
            .client
            .describe_events(self.application, self.environment, self.mark)
            .await?;

        events.retain(|event| event.occurred_at >= self.mark && !self.recent.contains(event));
        events.sort_by_key(|event| event.occurred_at);
        self.recent.extend(events.iter().cloned());

        debug!(
            environment = %self.environment,
            mark = %self.mark,
            new_events = events.len(),
            "Fetched environment events"
        );
        Ok(events)
    }

    /// Moves the mark forward. A timestamp before the current mark is ignored.
    pub fn advance_mark(&mut self, to: DateTime<Utc>) {
        if to <= self.mark {
            return;
        }
        self.mark = to;
        let mark = self.mark;
        self.recent.retain(|event| event.occurred_at >= mark);
    }
}

#[async_trait]
impl TickHook for EventStream<'_> {
    async fn on_tick(&mut self, tick_started: DateTime<Utc>) -> Result<()> {
        let events = self.fetch_since().await?;
        if !events.is_empty() {
            console::end_line();
            for event in &events {
                console::info(&event.message);
            }
            console::info_inline("Still waiting...");
        }
        self.advance_mark(tick_started);
        Ok(())
    }
}
