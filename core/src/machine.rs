use alloc::{boxed::Box, collections::VecDeque, vec::Vec};
use core::fmt;
use serde::Serialize;
use smallvec::SmallVec;

/// Side effects requested by a single transition, usually zero or one.
pub type Effects<E> = SmallVec<[E; 2]>;

/// Active state names from the root down to the innermost leaf.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct StatePath(SmallVec<[&'static str; 4]>);

impl StatePath {
    pub fn new(segments: &[&'static str]) -> Self {
        Self(segments.iter().copied().collect())
    }

    pub fn leaf(&self) -> &'static str {
        self.0.last().copied().unwrap_or_default()
    }

    /// Membership test at any depth.
    ///
    /// `path` is split on `.` or `/` and must be a prefix of the active path,
    /// so `"authenticated"` and `"authenticated.subscribed"` both match while
    /// `authenticated.subscribed.points_available` is active.
    pub fn matches(&self, path: &str) -> bool {
        let mut active = self.0.iter();
        path.split(['.', '/'])
            .filter(|segment| !segment.is_empty())
            .all(|segment| active.next().is_some_and(|&name| name == segment))
    }
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

/// Implemented by every machine's state type so the render layer can address
/// it without knowing the enum.
pub trait StateNode {
    fn path(&self) -> StatePath;

    fn tags(&self) -> &'static [&'static str] {
        &[]
    }
}

/// Result of an accepted transition.
pub struct Step<M: Machine + ?Sized> {
    pub state: M::State,
    pub context: M::Context,
    pub effects: Effects<M::Effect>,
}

impl<M: Machine + ?Sized> Step<M> {
    pub fn new(state: M::State, context: M::Context) -> Self {
        Self {
            state,
            context,
            effects: SmallVec::new(),
        }
    }

    pub fn with_effect(mut self, effect: M::Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// A finite-state transition system with typed context.
///
/// `transition` returns `None` when no transition matches the event in the
/// given state, which covers both unknown events and failed guards. The
/// running [`Service`] then leaves state and context untouched.
pub trait Machine {
    type State: StateNode + Clone + fmt::Debug;
    type Context: Clone + fmt::Debug;
    type Event: fmt::Debug;
    type Effect: fmt::Debug;

    /// Identifier used in log lines.
    const ID: &'static str;

    fn initial(&mut self) -> Step<Self>;

    fn transition(
        &mut self,
        state: &Self::State,
        context: &Self::Context,
        event: Self::Event,
    ) -> Option<Step<Self>>;
}

/// Read-only view handed to the render layer.
pub struct Snapshot<'a, M: Machine> {
    pub state: &'a M::State,
    pub context: &'a M::Context,
}

impl<M: Machine> Clone for Snapshot<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: Machine> Copy for Snapshot<'_, M> {}

impl<M: Machine> fmt::Debug for Snapshot<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("state", self.state)
            .field("context", self.context)
            .finish()
    }
}

impl<'a, M: Machine> Snapshot<'a, M> {
    pub fn path(&self) -> StatePath {
        self.state.path()
    }

    pub fn matches(&self, path: &str) -> bool {
        self.state.path().matches(path)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.state.tags().contains(&tag)
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value>
    where
        M::Context: Serialize,
    {
        #[derive(Serialize)]
        struct View<'v, C> {
            state: StatePath,
            tags: &'static [&'static str],
            context: &'v C,
        }

        serde_json::to_value(View {
            state: self.state.path(),
            tags: self.state.tags(),
            context: self.context,
        })
    }
}

type Subscriber<M> = Box<dyn FnMut(&Snapshot<'_, M>)>;

/// A running machine instance.
///
/// Events are queued and processed strictly one at a time; every accepted
/// transition updates the snapshot, notifies subscribers and appends its
/// effects to the outbox returned by [`Service::send`].
pub struct Service<M: Machine> {
    machine: M,
    state: M::State,
    context: M::Context,
    queue: VecDeque<M::Event>,
    outbox: Vec<M::Effect>,
    subscribers: Vec<Subscriber<M>>,
}

impl<M: Machine> Service<M> {
    pub fn new(mut machine: M) -> Self {
        let Step {
            state,
            context,
            effects,
        } = machine.initial();
        log::debug!("{}: start in {}", M::ID, state.path());
        Self {
            machine,
            state,
            context,
            queue: VecDeque::new(),
            outbox: effects.into_iter().collect(),
            subscribers: Vec::new(),
        }
    }

    /// Start from an existing state and context instead of the machine's
    /// initial step. No entry effects are produced.
    pub fn resume(machine: M, state: M::State, context: M::Context) -> Self {
        log::debug!("{}: resume in {}", M::ID, state.path());
        Self {
            machine,
            state,
            context,
            queue: VecDeque::new(),
            outbox: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn state(&self) -> &M::State {
        &self.state
    }

    pub fn context(&self) -> &M::Context {
        &self.context
    }

    pub fn snapshot(&self) -> Snapshot<'_, M> {
        Snapshot {
            state: &self.state,
            context: &self.context,
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.snapshot().matches(path)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.snapshot().has_tag(tag)
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&Snapshot<'_, M>) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Queue an event without processing it.
    pub fn enqueue(&mut self, event: M::Event) {
        self.queue.push_back(event);
    }

    /// Queue `event`, run the queue to completion and return every effect
    /// produced since the outbox was last drained.
    pub fn send(&mut self, event: M::Event) -> Vec<M::Effect> {
        self.enqueue(event);
        self.process_queued()
    }

    pub fn process_queued(&mut self) -> Vec<M::Effect> {
        while let Some(event) = self.queue.pop_front() {
            self.process(event);
        }
        self.take_effects()
    }

    pub fn take_effects(&mut self) -> Vec<M::Effect> {
        core::mem::take(&mut self.outbox)
    }

    /// Throw away the current state and context and start over.
    pub fn restart(&mut self) {
        let step = self.machine.initial();
        self.queue.clear();
        self.apply(step);
    }

    fn process(&mut self, event: M::Event) {
        log::trace!("{}: {:?} in {}", M::ID, event, self.state.path());
        match self.machine.transition(&self.state, &self.context, event) {
            Some(step) => self.apply(step),
            None => log::trace!("{}: no transition from {}", M::ID, self.state.path()),
        }
    }

    fn apply(&mut self, step: Step<M>) {
        log::debug!(
            "{}: {} -> {}",
            M::ID,
            self.state.path(),
            step.state.path()
        );
        self.state = step.state;
        self.context = step.context;
        self.outbox.extend(step.effects);

        let snapshot = Snapshot {
            state: &self.state,
            context: &self.context,
        };
        for subscriber in &mut self.subscribers {
            subscriber(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use core::cell::Cell;

    #[derive(Clone, Debug, PartialEq)]
    enum Light {
        Off,
        On,
    }

    impl StateNode for Light {
        fn path(&self) -> StatePath {
            match self {
                Light::Off => StatePath::new(&["off"]),
                Light::On => StatePath::new(&["on", "lit"]),
            }
        }

        fn tags(&self) -> &'static [&'static str] {
            match self {
                Light::Off => &[],
                Light::On => &["bright"],
            }
        }
    }

    #[derive(Debug)]
    enum Press {
        Toggle,
        Nothing,
    }

    struct Switch;

    impl Machine for Switch {
        type State = Light;
        type Context = u32;
        type Event = Press;
        type Effect = u32;

        const ID: &'static str = "switch";

        fn initial(&mut self) -> Step<Self> {
            Step::new(Light::Off, 0)
        }

        fn transition(&mut self, state: &Light, flips: &u32, event: Press) -> Option<Step<Self>> {
            match (state, event) {
                (_, Press::Nothing) => None,
                (Light::Off, Press::Toggle) => {
                    Some(Step::new(Light::On, flips + 1).with_effect(flips + 1))
                }
                (Light::On, Press::Toggle) => Some(Step::new(Light::Off, flips + 1)),
            }
        }
    }

    #[test]
    fn path_matches_prefixes_at_any_depth() {
        let path = StatePath::new(&["authenticated", "subscribed", "points_available"]);

        assert!(path.matches("authenticated"));
        assert!(path.matches("authenticated.subscribed"));
        assert!(path.matches("authenticated/subscribed/points_available"));
        assert!(!path.matches("subscribed"));
        assert!(!path.matches("authenticated.subscribed.points_available.extra"));
        assert_eq!(path.leaf(), "points_available");
        assert_eq!(alloc::format!("{path}"), "authenticated.subscribed.points_available");
    }

    #[test]
    fn unmatched_events_leave_state_alone() {
        let mut service = Service::new(Switch);

        let effects = service.send(Press::Nothing);

        assert!(effects.is_empty());
        assert_eq!(*service.state(), Light::Off);
        assert_eq!(*service.context(), 0);
    }

    #[test]
    fn queued_events_run_in_order_and_collect_effects() {
        let mut service = Service::new(Switch);

        service.enqueue(Press::Toggle);
        service.enqueue(Press::Toggle);
        service.enqueue(Press::Toggle);
        let effects = service.process_queued();

        assert_eq!(effects, [1, 3]);
        assert!(service.matches("on"));
        assert!(service.has_tag("bright"));
        assert_eq!(*service.context(), 3);
    }

    #[test]
    fn subscribers_see_every_accepted_transition() {
        let mut service = Service::new(Switch);
        let seen = Rc::new(Cell::new(0));
        let counter = seen.clone();
        service.subscribe(move |snapshot| {
            assert_eq!(*snapshot.context, counter.get() + 1);
            counter.set(*snapshot.context);
        });

        service.send(Press::Toggle);
        service.send(Press::Nothing);
        service.send(Press::Toggle);

        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn restart_returns_to_initial_step() {
        let mut service = Service::new(Switch);
        service.send(Press::Toggle);

        service.restart();

        assert_eq!(*service.state(), Light::Off);
        assert_eq!(*service.context(), 0);
    }
}
