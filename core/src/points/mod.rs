//! Account and points flow.
//!
//! A strictly sequential chain of asynchronous calls: fetch the signed-in
//! user, fetch the subscription, fetch the points balance, donate. Each call
//! is requested as a [`PointsEffect::Invoke`] and its result comes back as a
//! [`PointsEvent::Settled`] carrying the id of the invocation that produced it.
//!
//! ```text
//! unauthenticated ──SIGNIN──▶ signing_in
//!        │                        │
//!        └─────── user ───────────┴──▶ authenticated
//!                                        subscription_loading
//!                                        ├─▶ not_subscribed ──SUBSCRIBE──▶ subscribing
//!                                        └─▶ subscribed ◀───────────────────────┘
//!                                              points_loading
//!                                              ├─▶ points_empty
//!                                              └─▶ points_available ──DONATE──▶ donating
//!                                                    ▲                           ├─▶ donate_success
//!                                                    └────────RETRY──────────────┴─▶ donate_failed
//! ```

use alloc::string::String;
use core::fmt;
use serde::{Deserialize, Serialize};

use crate::{ApiError, Machine, StateNode, StatePath, Step};

pub use api::*;
pub use runner::*;

mod api;
mod runner;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: String,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub subscribed: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsContext {
    pub user: Option<User>,
    pub subscription: Option<Subscription>,
    pub points: u32,
    /// Outcome of the most recent donation.
    pub donate_result: Option<bool>,
}

/// The six calls the flow makes against its data source.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    FetchUser,
    SignIn,
    FetchSubscription,
    Subscribe,
    FetchPoints,
    Donate,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InvocationId(pub u32);

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub id: InvocationId,
    pub op: Operation,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointsEffect {
    /// Start `op`; report back with a settlement tagged with `id`.
    Invoke(Invocation),
}

/// Payload of a settled invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Fetch user or sign in. `None` means nobody is signed in.
    User(Option<User>),
    Subscription(Subscription),
    /// Subscribe call completed, carrying its success flag.
    Subscribed(bool),
    Points(u32),
    Donation(bool),
    Failed(ApiError),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub id: InvocationId,
    pub outcome: Outcome,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointsEvent {
    SignIn,
    Subscribe,
    FetchPoints,
    Donate,
    Retry,
    Settled(Settlement),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointsStage {
    Loading,
    Empty,
    Available,
    Donating { donate: InvocationId },
    DonateSuccess,
    DonateFailed,
}

impl PointsStage {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Loading => "points_loading",
            Self::Empty => "points_empty",
            Self::Available => "points_available",
            Self::Donating { .. } => "donating",
            Self::DonateSuccess => "donate_success",
            Self::DonateFailed => "donate_failed",
        }
    }

    /// Target picked purely from the balance, without asking the data source.
    const fn from_balance(points: u32) -> Self {
        if points > 0 {
            Self::Available
        } else {
            Self::Empty
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthState {
    SubscriptionLoading { fetch: InvocationId },
    NotSubscribed,
    Subscribing { subscribe: InvocationId },
    /// The points fetch belongs to this level and may settle in any stage.
    Subscribed { fetch: InvocationId, stage: PointsStage },
}

/// Each invoking state remembers the invocation it started, so settlements
/// from an earlier visit are recognised as stale.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointsState {
    Unauthenticated { fetch: InvocationId },
    SigningIn { signin: InvocationId },
    Authenticated(AuthState),
}

impl StateNode for PointsState {
    fn path(&self) -> StatePath {
        match self {
            Self::Unauthenticated { .. } => StatePath::new(&["unauthenticated"]),
            Self::SigningIn { .. } => StatePath::new(&["signing_in"]),
            Self::Authenticated(auth) => match auth {
                AuthState::SubscriptionLoading { .. } => {
                    StatePath::new(&["authenticated", "subscription_loading"])
                }
                AuthState::NotSubscribed => StatePath::new(&["authenticated", "not_subscribed"]),
                AuthState::Subscribing { .. } => StatePath::new(&["authenticated", "subscribing"]),
                AuthState::Subscribed { stage, .. } => {
                    StatePath::new(&["authenticated", "subscribed", stage.name()])
                }
            },
        }
    }

    fn tags(&self) -> &'static [&'static str] {
        use AuthState::*;
        use PointsStage::*;

        match self {
            Self::SigningIn { .. }
            | Self::Authenticated(
                SubscriptionLoading { .. }
                | Subscribing { .. }
                | Subscribed {
                    stage: Loading | Donating { .. },
                    ..
                },
            ) => &["loading"],
            _ => &[],
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PointsMachine {
    next_invocation: u32,
}

impl PointsMachine {
    pub fn new() -> Self {
        Self::default()
    }

    fn invoke(&mut self, op: Operation) -> (InvocationId, PointsEffect) {
        let id = InvocationId(self.next_invocation);
        self.next_invocation = self.next_invocation.wrapping_add(1);
        log::debug!("invoke {:?} {}", op, id);
        (id, PointsEffect::Invoke(Invocation { id, op }))
    }

    /// Root state: forget everything and look for an existing session.
    fn enter_unauthenticated(&mut self) -> Step<Self> {
        let (fetch, effect) = self.invoke(Operation::FetchUser);
        Step::new(
            PointsState::Unauthenticated { fetch },
            PointsContext::default(),
        )
        .with_effect(effect)
    }

    fn enter_signing_in(&mut self, context: &PointsContext) -> Step<Self> {
        let (signin, effect) = self.invoke(Operation::SignIn);
        Step::new(PointsState::SigningIn { signin }, context.clone()).with_effect(effect)
    }

    fn enter_authenticated(&mut self, context: &PointsContext, user: User) -> Step<Self> {
        let context = PointsContext {
            user: Some(user),
            subscription: None,
            ..context.clone()
        };
        let (fetch, effect) = self.invoke(Operation::FetchSubscription);
        let state = PointsState::Authenticated(AuthState::SubscriptionLoading { fetch });
        Step::new(state, context).with_effect(effect)
    }

    fn enter_subscribing(&mut self, context: &PointsContext) -> Step<Self> {
        let (subscribe, effect) = self.invoke(Operation::Subscribe);
        let state = PointsState::Authenticated(AuthState::Subscribing { subscribe });
        Step::new(state, context.clone()).with_effect(effect)
    }

    fn enter_subscribed(&mut self, context: PointsContext) -> Step<Self> {
        let context = PointsContext {
            points: 0,
            ..context
        };
        let (fetch, effect) = self.invoke(Operation::FetchPoints);
        let state = PointsState::Authenticated(AuthState::Subscribed {
            fetch,
            stage: PointsStage::Loading,
        });
        Step::new(state, context).with_effect(effect)
    }

    fn enter_donating(&mut self, fetch: InvocationId, context: &PointsContext) -> Step<Self> {
        let (donate, effect) = self.invoke(Operation::Donate);
        Step::new(subscribed(fetch, PointsStage::Donating { donate }), context.clone())
            .with_effect(effect)
    }

    fn settle(
        &mut self,
        state: &PointsState,
        context: &PointsContext,
        Settlement { id, outcome }: Settlement,
    ) -> Option<Step<Self>> {
        use AuthState::*;
        use PointsState::*;
        use PointsStage::*;

        match (*state, outcome) {
            (Unauthenticated { fetch }, Outcome::User(user)) if id == fetch => {
                match identity(user) {
                    Some(user) => Some(self.enter_authenticated(context, user)),
                    None => Some(Step::new(*state, context.clone())),
                }
            }
            (Unauthenticated { fetch }, Outcome::Failed(err)) if id == fetch => {
                log::debug!("no session: {}", err);
                Some(Step::new(*state, context.clone()))
            }
            (SigningIn { signin }, Outcome::User(user)) if id == signin => match identity(user) {
                Some(user) => Some(self.enter_authenticated(context, user)),
                None => Some(self.enter_unauthenticated()),
            },
            (SigningIn { signin }, Outcome::Failed(err)) if id == signin => {
                log::debug!("sign in failed: {}", err);
                Some(self.enter_unauthenticated())
            }
            (Authenticated(SubscriptionLoading { fetch }), Outcome::Subscription(subscription))
                if id == fetch =>
            {
                let context = PointsContext {
                    subscription: Some(subscription),
                    ..context.clone()
                };
                if subscription.subscribed {
                    Some(self.enter_subscribed(context))
                } else {
                    Some(Step::new(Authenticated(NotSubscribed), context))
                }
            }
            (Authenticated(SubscriptionLoading { fetch }), Outcome::Failed(err)) if id == fetch => {
                log::debug!("subscription fetch failed: {}", err);
                Some(Step::new(Authenticated(NotSubscribed), context.clone()))
            }
            (Authenticated(Subscribing { subscribe }), Outcome::Subscribed(_))
                if id == subscribe =>
            {
                let context = PointsContext {
                    subscription: Some(Subscription { subscribed: true }),
                    ..context.clone()
                };
                Some(self.enter_subscribed(context))
            }
            (Authenticated(Subscribing { subscribe }), Outcome::Failed(err)) if id == subscribe => {
                log::debug!("subscribe failed: {}", err);
                Some(Step::new(Authenticated(NotSubscribed), context.clone()))
            }
            (Authenticated(Subscribed { fetch, .. }), Outcome::Points(points)) if id == fetch => {
                let context = PointsContext {
                    points,
                    ..context.clone()
                };
                Some(Step::new(subscribed(fetch, PointsStage::from_balance(points)), context))
            }
            (Authenticated(Subscribed { fetch, .. }), Outcome::Failed(err)) if id == fetch => {
                log::debug!("points fetch failed: {}", err);
                Some(Step::new(subscribed(fetch, Empty), context.clone()))
            }
            (
                Authenticated(Subscribed {
                    fetch,
                    stage: Donating { donate },
                }),
                outcome @ (Outcome::Donation(_) | Outcome::Failed(_)),
            ) if id == donate => {
                let success = matches!(outcome, Outcome::Donation(true));
                if let Outcome::Failed(err) = outcome {
                    log::debug!("donation failed: {}", err);
                }
                let mut context = PointsContext {
                    donate_result: Some(success),
                    ..context.clone()
                };
                if success {
                    context.points = 0;
                    Some(Step::new(subscribed(fetch, DonateSuccess), context))
                } else {
                    Some(Step::new(subscribed(fetch, DonateFailed), context))
                }
            }
            (_, outcome) => {
                log::trace!("ignoring stale settlement {}: {:?}", id, outcome);
                None
            }
        }
    }
}

fn subscribed(fetch: InvocationId, stage: PointsStage) -> PointsState {
    PointsState::Authenticated(AuthState::Subscribed { fetch, stage })
}

/// A user only counts when it carries a non-empty id. This also applies to
/// the initial session lookup, where a present but empty user would
/// otherwise be accepted.
fn identity(user: Option<User>) -> Option<User> {
    user.filter(|user| !user.id.is_empty())
}

impl Machine for PointsMachine {
    type State = PointsState;
    type Context = PointsContext;
    type Event = PointsEvent;
    type Effect = PointsEffect;

    const ID: &'static str = "points";

    fn initial(&mut self) -> Step<Self> {
        self.enter_unauthenticated()
    }

    fn transition(
        &mut self,
        state: &PointsState,
        context: &PointsContext,
        event: PointsEvent,
    ) -> Option<Step<Self>> {
        use AuthState::*;
        use PointsState::*;
        use PointsStage::*;

        match (*state, event) {
            (_, PointsEvent::Settled(settlement)) => self.settle(state, context, settlement),
            (Unauthenticated { .. }, PointsEvent::SignIn) => Some(self.enter_signing_in(context)),
            (Authenticated(NotSubscribed), PointsEvent::Subscribe) => {
                Some(self.enter_subscribing(context))
            }
            (Authenticated(Subscribed { fetch, .. }), PointsEvent::FetchPoints) => Some(Step::new(
                subscribed(fetch, PointsStage::from_balance(context.points)),
                context.clone(),
            )),
            (
                Authenticated(Subscribed {
                    fetch,
                    stage: Available,
                }),
                PointsEvent::Donate,
            ) => Some(self.enter_donating(fetch, context)),
            (
                Authenticated(Subscribed {
                    fetch,
                    stage: DonateFailed,
                }),
                PointsEvent::Retry,
            ) => Some(Step::new(subscribed(fetch, Available), context.clone())),
            _ => None,
        }
    }
}
