//! # Pipeline Driver
//!
//! Wires the GPS character stream to the fix decoder and the detection event
//! stream, through the acceptance filter, to the event router.
//!
//! Both sources are polled from a single `tokio::select!` loop, so decoding
//! and routing never run concurrently and the latest fix needs no locking.
//! Errors from either source or from the logfiles go to the [`ErrorReporter`]
//! and never stop the loop. After a transport error only the failing source
//! is paused for the retry interval.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::{sleep, Sleep};
use tracing::{error, info};

use crate::error::LoggerError;
use crate::logfile::{Clock, EventRouter, LogStorage, RouteOutcome};
use crate::nmea::NmeaFixDecoder;
use crate::raddec::{AcceptanceFilter, DetectionEvent, EventSource};
use crate::serial::NmeaSource;

type Backoff = Pin<Box<Sleep>>;

async fn backoff_elapsed(backoff: &mut Option<Backoff>) {
    match backoff.as_mut() {
        Some(delay) => delay.as_mut().await,
        None => std::future::pending().await,
    }
}

/// Sink for errors the pipeline recovers from
pub trait ErrorReporter: Send {
    fn report(&mut self, error: &LoggerError);
}

/// Reports errors through `tracing`
#[derive(Debug, Default)]
pub struct TracingReporter {
    reported: u64,
}

impl TracingReporter {
    pub fn reported(&self) -> u64 {
        self.reported
    }
}

impl ErrorReporter for TracingReporter {
    fn report(&mut self, error: &LoggerError) {
        self.reported += 1;
        error!(error = %error, reported = self.reported, "pipeline_error");
    }
}

/// Counters for inbound events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub events_received: u64,
    pub events_rejected: u64,
}

/// GPS + event pipeline
pub struct Pipeline<S: LogStorage, C: Clock> {
    decoder: NmeaFixDecoder,
    router: EventRouter<S, C>,
    filter: Box<dyn AcceptanceFilter>,
    reporter: Box<dyn ErrorReporter>,
    retry_interval: Duration,
    stats: PipelineStats,
}

impl<S: LogStorage, C: Clock> Pipeline<S, C> {
    /// # Arguments
    ///
    /// * `router` - Router owning the logfiles
    /// * `filter` - Acceptance predicate applied to every inbound event
    /// * `reporter` - Destination for recoverable errors
    /// * `retry_interval` - Pause of a source after its transport error
    pub fn new(
        router: EventRouter<S, C>,
        filter: Box<dyn AcceptanceFilter>,
        reporter: Box<dyn ErrorReporter>,
        retry_interval: Duration,
    ) -> Self {
        Self {
            decoder: NmeaFixDecoder::new(),
            router,
            filter,
            reporter,
            retry_interval,
            stats: PipelineStats::default(),
        }
    }

    /// Feed one chunk of GPS characters to the decoder
    pub fn on_nmea_chunk(&mut self, chunk: &str) {
        self.decoder.feed(chunk);
    }

    /// Filter and route one detection event
    ///
    /// Returns `None` if the event was rejected by the filter or routing
    /// failed (the failure is reported).
    pub fn on_event(&mut self, event: &DetectionEvent) -> Option<RouteOutcome> {
        self.stats.events_received += 1;

        if !self.filter.is_passing(event) {
            self.stats.events_rejected += 1;
            return None;
        }

        match self.router.handle(event, self.decoder.latest()) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                self.reporter.report(&e);
                None
            }
        }
    }

    /// Run until `shutdown` resolves or both sources are exhausted, then
    /// close the logfiles
    pub async fn run<G, E, F>(&mut self, gps: &mut G, events: &mut E, shutdown: F)
    where
        G: NmeaSource + ?Sized,
        E: EventSource + ?Sized,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut gps_open = true;
        let mut events_open = true;
        // A source that hit a transport error is not polled until its
        // backoff elapses; the other source keeps flowing
        let mut gps_backoff: Option<Backoff> = None;
        let mut events_backoff: Option<Backoff> = None;

        info!("Pipeline started");

        while gps_open || events_open {
            tokio::select! {
                chunk = gps.next_chunk(), if gps_open && gps_backoff.is_none() => match chunk {
                    Ok(Some(chunk)) => self.on_nmea_chunk(&chunk),
                    Ok(None) => {
                        info!("GPS stream ended");
                        gps_open = false;
                    }
                    Err(e) => gps_backoff = self.recover(e),
                },
                _ = backoff_elapsed(&mut gps_backoff), if gps_backoff.is_some() => {
                    gps_backoff = None;
                }
                event = events.next_event(), if events_open && events_backoff.is_none() => match event {
                    Ok(Some(event)) => {
                        self.on_event(&event);
                    }
                    Ok(None) => {
                        info!("Event stream ended");
                        events_open = false;
                    }
                    Err(e) => events_backoff = self.recover(e),
                },
                _ = backoff_elapsed(&mut events_backoff), if events_backoff.is_some() => {
                    events_backoff = None;
                }
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        if let Err(e) = self.router.close() {
            self.reporter.report(&e);
        }

        let decoder = self.decoder.stats();
        let router = self.router.stats();
        info!(
            sentences_decoded = decoder.sentences_decoded,
            partial_discarded = decoder.partial_discarded,
            events_received = self.stats.events_received,
            events_rejected = self.stats.events_rejected,
            written = router.written,
            dropped_no_fix = router.dropped_no_fix,
            dropped_unroutable = router.dropped_unroutable,
            rotations = self.router.rotator().rotations(),
            "Pipeline stopped"
        );
    }

    /// Report a source error; transport errors return the backoff to wait
    /// out before polling that source again
    fn recover(&mut self, e: LoggerError) -> Option<Backoff> {
        let transport = e.is_transport();
        self.reporter.report(&e);
        transport.then(|| Box::pin(sleep(self.retry_interval)))
    }

    pub fn decoder(&self) -> &NmeaFixDecoder {
        &self.decoder
    }

    pub fn router(&self) -> &EventRouter<S, C> {
        &self.router
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }
}
