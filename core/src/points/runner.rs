use alloc::vec::Vec;
use futures_util::{
    future::{FutureExt, LocalBoxFuture},
    stream::{FuturesUnordered, StreamExt},
};

use super::*;
use crate::Service;

/// Drives a [`PointsMachine`] against a [`PointsApi`].
///
/// Effects emitted by the machine become in-flight calls; each call's result
/// is fed back as a settlement event once it resolves.
pub struct PointsRunner<A: PointsApi> {
    service: Service<PointsMachine>,
    api: A,
    in_flight: FuturesUnordered<LocalBoxFuture<'static, Settlement>>,
}

impl<A: PointsApi> PointsRunner<A> {
    pub fn new(api: A) -> Self {
        let mut runner = Self {
            service: Service::new(PointsMachine::new()),
            api,
            in_flight: FuturesUnordered::new(),
        };
        let effects = runner.service.take_effects();
        runner.dispatch(effects);
        runner
    }

    pub fn service(&self) -> &Service<PointsMachine> {
        &self.service
    }

    pub fn api_mut(&mut self) -> &mut A {
        &mut self.api
    }

    pub fn context(&self) -> &PointsContext {
        self.service.context()
    }

    pub fn matches(&self, path: &str) -> bool {
        self.service.matches(path)
    }

    /// Number of calls that have not settled yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn send(&mut self, event: PointsEvent) {
        let effects = self.service.send(event);
        self.dispatch(effects);
    }

    fn dispatch(&mut self, effects: Vec<PointsEffect>) {
        for PointsEffect::Invoke(Invocation { id, op }) in effects {
            let call = self.api.call(op);
            self.in_flight
                .push(call.map(move |outcome| Settlement { id, outcome }).boxed_local());
        }
    }

    /// Feed back every settlement that is ready right now. Returns how many
    /// were processed.
    pub fn poll_settled(&mut self) -> usize {
        let mut settled = 0;
        while let Some(Some(settlement)) = self.in_flight.next().now_or_never() {
            self.send(PointsEvent::Settled(settlement));
            settled += 1;
        }
        settled
    }

    /// Await outstanding calls, including the ones they trigger, until
    /// nothing is in flight.
    pub async fn run_until_idle(&mut self) {
        while let Some(settlement) = self.in_flight.next().await {
            self.send(PointsEvent::Settled(settlement));
        }
    }
}
