//! Interval polling scoped to a component's lifetime.
//!
//! [`use_poller`] runs a fetch immediately and then on a fixed interval. The
//! interval is cleared when the owning component is cleaned up. At most one
//! fetch per poller is outstanding: ticks that fire while the previous fetch
//! is pending are dropped, and results arriving after cleanup are discarded
//! by checking [`PollTicket::is_current`] before applying them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::LocalBoxFuture;
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, warn};

/// In-flight and cancellation flags shared between a poller and its tickets.
#[derive(Clone, Debug, Default)]
pub struct PollGuard {
	in_flight: Arc<AtomicBool>,
	cancelled: Arc<AtomicBool>,
}

impl PollGuard {
	/// Idle, uncancelled guard.
	pub fn new() -> Self {
		Self::default()
	}

	/// Claims the guard for one fetch. `None` while another fetch is
	/// outstanding or after cancellation.
	pub fn try_begin(&self) -> Option<PollTicket> {
		if self.is_cancelled() {
			return None;
		}
		self.in_flight
			.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.ok()
			.map(|_| PollTicket {
				guard: self.clone(),
			})
	}

	/// Stops new fetches and marks outstanding tickets stale.
	pub fn cancel(&self) {
		self.cancelled.store(true, Ordering::Release);
	}

	/// Whether [`Self::cancel`] was called.
	pub fn is_cancelled(&self) -> bool {
		self.cancelled.load(Ordering::Acquire)
	}

	/// Whether a ticket is outstanding.
	pub fn is_busy(&self) -> bool {
		self.in_flight.load(Ordering::Acquire)
	}
}

/// Proof that a fetch holds the guard. Dropping it re-arms the guard.
#[derive(Debug)]
pub struct PollTicket {
	guard: PollGuard,
}

impl PollTicket {
	/// Whether results may still be applied.
	pub fn is_current(&self) -> bool {
		!self.guard.is_cancelled()
	}
}

impl Drop for PollTicket {
	fn drop(&mut self) {
		self.guard.in_flight.store(false, Ordering::Release);
	}
}

type PollFn = Arc<dyn Fn(PollTicket) -> LocalBoxFuture<'static, ()> + Send + Sync>;

/// Handle to a running poll subscription.
#[derive(Clone)]
pub struct Poller {
	name: &'static str,
	guard: PollGuard,
	run: PollFn,
}

impl Poller {
	/// Starts a fetch unless one is already pending.
	pub fn poll_now(&self) {
		match self.guard.try_begin() {
			Some(ticket) => spawn_local((self.run)(ticket)),
			None if self.guard.is_cancelled() => {}
			None => debug!("drift-graph: {} poll skipped, previous fetch pending", self.name),
		}
	}
}

/// Subscribes the current component to `run` every `interval`.
///
/// `run` receives the ticket and must check `is_current()` before writing
/// to signals.
pub fn use_poller<F>(name: &'static str, interval: Duration, run: F) -> Poller
where
	F: Fn(PollTicket) -> LocalBoxFuture<'static, ()> + Send + Sync + 'static,
{
	let poller = Poller {
		name,
		guard: PollGuard::new(),
		run: Arc::new(run),
	};
	poller.poll_now();

	let tick = poller.clone();
	let handle = match set_interval_with_handle(move || tick.poll_now(), interval) {
		Ok(handle) => Some(handle),
		Err(e) => {
			warn!("drift-graph: {name} could not schedule polling: {e:?}");
			None
		}
	};

	let guard = poller.guard.clone();
	on_cleanup(move || {
		guard.cancel();
		if let Some(h) = handle {
			h.clear();
		}
		debug!("drift-graph: {name} polling stopped");
	});

	poller
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tick_while_busy_is_skipped() {
		let guard = PollGuard::new();
		let ticket = guard.try_begin().unwrap();
		assert!(guard.is_busy());
		assert!(guard.try_begin().is_none());
		drop(ticket);
		assert!(!guard.is_busy());
		assert!(guard.try_begin().is_some());
	}

	#[test]
	fn cancelled_guard_rejects_results_and_new_fetches() {
		let guard = PollGuard::new();
		let ticket = guard.try_begin().unwrap();
		assert!(ticket.is_current());
		guard.cancel();
		assert!(!ticket.is_current());
		drop(ticket);
		assert!(guard.try_begin().is_none());
	}

	#[test]
	fn clones_share_state() {
		let guard = PollGuard::new();
		let other = guard.clone();
		let _ticket = guard.try_begin().unwrap();
		assert!(other.is_busy());
		other.cancel();
		assert!(guard.is_cancelled());
	}
}
