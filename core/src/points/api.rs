use futures_util::future::{self, FutureExt, LocalBoxFuture};
use rand::{SeedableRng, rngs::SmallRng};

use super::{Operation, Outcome, Subscription, User};
use crate::{ApiError, DemoConfig};

pub type ApiFuture<T> = LocalBoxFuture<'static, core::result::Result<T, ApiError>>;

/// Data source behind the points flow.
///
/// Every call returns a `'static` future so the runner can keep several in
/// flight without borrowing the source.
pub trait PointsApi {
    /// Currently signed-in user, if any.
    fn fetch_user(&mut self) -> ApiFuture<Option<User>>;

    fn sign_in(&mut self) -> ApiFuture<Option<User>>;

    fn fetch_subscription(&mut self) -> ApiFuture<Subscription>;

    fn subscribe(&mut self) -> ApiFuture<bool>;

    fn fetch_points(&mut self) -> ApiFuture<u32>;

    fn donate(&mut self) -> ApiFuture<bool>;

    /// Start `op` and map its result into a settlement payload.
    fn call(&mut self, op: Operation) -> LocalBoxFuture<'static, Outcome> {
        fn settle<T: 'static>(
            fut: ApiFuture<T>,
            wrap: fn(T) -> Outcome,
        ) -> LocalBoxFuture<'static, Outcome> {
            fut.map(move |res| res.map_or_else(Outcome::Failed, wrap))
                .boxed_local()
        }

        match op {
            Operation::FetchUser => settle(self.fetch_user(), Outcome::User),
            Operation::SignIn => settle(self.sign_in(), Outcome::User),
            Operation::FetchSubscription => {
                settle(self.fetch_subscription(), Outcome::Subscription)
            }
            Operation::Subscribe => settle(self.subscribe(), Outcome::Subscribed),
            Operation::FetchPoints => settle(self.fetch_points(), Outcome::Points),
            Operation::Donate => settle(self.donate(), Outcome::Donation),
        }
    }
}

fn ready<T: 'static>(res: core::result::Result<T, ApiError>) -> ApiFuture<T> {
    future::ready(res).boxed_local()
}

/// Fixed answers that resolve immediately.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptedApi {
    pub user: core::result::Result<Option<User>, ApiError>,
    pub sign_in: core::result::Result<Option<User>, ApiError>,
    pub subscription: core::result::Result<Subscription, ApiError>,
    pub subscribe: core::result::Result<bool, ApiError>,
    pub points: core::result::Result<u32, ApiError>,
    pub donation: core::result::Result<bool, ApiError>,
}

impl Default for ScriptedApi {
    fn default() -> Self {
        Self {
            user: Ok(None),
            sign_in: Ok(Some(User::new(MockApi::USER_ID))),
            subscription: Ok(Subscription { subscribed: false }),
            subscribe: Ok(true),
            points: Ok(MockApi::POINTS),
            donation: Ok(true),
        }
    }
}

impl PointsApi for ScriptedApi {
    fn fetch_user(&mut self) -> ApiFuture<Option<User>> {
        ready(self.user.clone())
    }

    fn sign_in(&mut self) -> ApiFuture<Option<User>> {
        ready(self.sign_in.clone())
    }

    fn fetch_subscription(&mut self) -> ApiFuture<Subscription> {
        ready(self.subscription)
    }

    fn subscribe(&mut self) -> ApiFuture<bool> {
        ready(self.subscribe)
    }

    fn fetch_points(&mut self) -> ApiFuture<u32> {
        ready(self.points)
    }

    fn donate(&mut self) -> ApiFuture<bool> {
        ready(self.donation)
    }
}

/// The demo data source: nobody is signed in until `sign_in`, the initial
/// subscription state and donations are coin flips, subscribing always works.
#[derive(Clone, Debug)]
pub struct MockApi {
    rng: SmallRng,
}

impl MockApi {
    pub const USER_ID: &'static str = "user1";
    pub const POINTS: u32 = 200;

    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn from_config(config: &DemoConfig) -> Self {
        Self::new(config.mock_seed)
    }

    fn flip(&mut self) -> bool {
        use rand::prelude::*;

        self.rng.random_bool(0.5)
    }
}

impl PointsApi for MockApi {
    fn fetch_user(&mut self) -> ApiFuture<Option<User>> {
        ready(Ok(None))
    }

    fn sign_in(&mut self) -> ApiFuture<Option<User>> {
        ready(Ok(Some(User::new(Self::USER_ID))))
    }

    fn fetch_subscription(&mut self) -> ApiFuture<Subscription> {
        let subscribed = self.flip();
        ready(Ok(Subscription { subscribed }))
    }

    fn subscribe(&mut self) -> ApiFuture<bool> {
        ready(Ok(true))
    }

    fn fetch_points(&mut self) -> ApiFuture<u32> {
        ready(Ok(Self::POINTS))
    }

    fn donate(&mut self) -> ApiFuture<bool> {
        ready(Ok(self.flip()))
    }
}
