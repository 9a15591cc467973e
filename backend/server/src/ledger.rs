//! # Vote Ledger
//!
//! One vote per participant per dish, scored 1 to 5, never withdrawn.
//!
//! ## Uniqueness
//!
//! The voter identity is the participant name folded by [`voter_key`]. Every
//! vote is written under the deterministic key `{dish}:{voter_key}` through
//! [`Store::insert_vote`], an atomic insert-if-absent. Checking
//! [`Ledger::has_voted`] first is only a courtesy for the UI; the store write is
//! what rejects the second of two simultaneous casts.
//!
//! ## Live aggregates
//!
//! Each watched dish has one `watch` channel. After a successful cast the
//! aggregate is recomputed from the full vote set and offered to the channel.
//! Votes are only ever added, so an offer is accepted only if it counts more
//! votes than the value already published. A recomputation that finishes late
//! can never replace a newer snapshot, and every subscriber converges on the
//! latest vote set.
//!
//! Channels whose receivers are all gone are pruned the next time anyone
//! subscribes or a vote lands on that dish. Casting on a dish nobody watches
//! publishes nothing and skips the recomputation.
//!
//! [`voter_key`]: crate::utils::voter_key
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use chrono::Utc;
use futures::future::try_join_all;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    models::{DishAggregate, RankedDish, Score, Vote},
    store::Store,
    utils::normalize_name,
};

/// Mean and count over `votes`, counting each voter once.
pub fn aggregate_votes(dish_id: &str, votes: &[Vote]) -> DishAggregate {
    let mut voters = HashSet::new();
    let mut sum = 0u32;

    for vote in votes.iter().filter(|v| v.dish_id == dish_id) {
        if voters.insert(vote.voter_key()) {
            sum += u32::from(vote.score.get());
        }
    }

    let vote_count = voters.len() as u32;
    let mean_score = if vote_count == 0 {
        0.0
    } else {
        f64::from(sum) / f64::from(vote_count)
    };

    DishAggregate {
        dish_id: dish_id.to_string(),
        mean_score,
        vote_count,
    }
}

/// Descending mean. The sort is stable, so equal means keep insertion order.
pub fn rank(dishes: &mut [RankedDish]) {
    dishes.sort_by(|a, b| b.aggregate.mean_score.total_cmp(&a.aggregate.mean_score));
}

fn offer(sender: &watch::Sender<DishAggregate>, aggregate: DishAggregate) -> bool {
    sender.send_if_modified(|current| {
        if aggregate.vote_count > current.vote_count {
            *current = aggregate;
            true
        } else {
            false
        }
    })
}

pub struct Ledger {
    store: Arc<dyn Store>,
    watchers: Mutex<HashMap<String, Arc<watch::Sender<DishAggregate>>>>,
}

impl Ledger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            watchers: Mutex::new(HashMap::new()),
        }
    }

    async fn ensure_dish(&self, dish_id: &str) -> Result<(), AppError> {
        match self.store.dish(dish_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("Dish {dish_id}"))),
        }
    }

    /// The vote already recorded for this pair, if any.
    pub async fn has_voted(&self, dish_id: &str, voter: &str) -> Result<Option<Vote>, AppError> {
        if voter.trim().is_empty() {
            return Err(AppError::Validation("Voter is required".into()));
        }

        Ok(self.store.vote(dish_id, voter).await?)
    }

    pub async fn cast_vote(&self, dish_id: &str, voter: &str, score: u8) -> Result<Vote, AppError> {
        let score = Score::try_from(score).map_err(AppError::Validation)?;

        let voter = normalize_name(voter);
        if voter.is_empty() {
            return Err(AppError::Validation("Voter is required".into()));
        }

        self.ensure_dish(dish_id).await?;

        let vote = Vote {
            id: Vote::key(dish_id, &voter),
            dish_id: dish_id.to_string(),
            voter,
            score,
            cast_at: Utc::now(),
        };

        if !self.store.insert_vote(&vote).await? {
            warn!(dish_id, voter = %vote.voter, "Rejected duplicate vote");
            return Err(AppError::DuplicateVote { voter: vote.voter });
        }

        info!(dish_id, voter = %vote.voter, %score, "Vote cast");
        self.publish(dish_id).await;

        Ok(vote)
    }

    pub async fn aggregate(&self, dish_id: &str) -> Result<DishAggregate, AppError> {
        let votes = self.store.votes(dish_id).await?;
        Ok(aggregate_votes(dish_id, &votes))
    }

    /// Every dish with its aggregate, best first.
    pub async fn ranking(&self) -> Result<Vec<RankedDish>, AppError> {
        let dishes = self.store.dishes().await?;
        let aggregates = try_join_all(dishes.iter().map(|dish| self.aggregate(&dish.id))).await?;

        let mut ranked: Vec<RankedDish> = dishes
            .into_iter()
            .zip(aggregates)
            .map(|(dish, aggregate)| RankedDish { dish, aggregate })
            .collect();
        rank(&mut ranked);

        Ok(ranked)
    }

    /// The live channel for a dish, dropping it if nobody listens anymore.
    fn watcher(&self, dish_id: &str) -> Option<Arc<watch::Sender<DishAggregate>>> {
        let mut watchers = self.watchers.lock().unwrap_or_else(|e| e.into_inner());
        let sender = watchers.get(dish_id)?;
        if sender.receiver_count() == 0 {
            debug!(dish_id, "Pruning unwatched aggregate channel");
            watchers.remove(dish_id);
            return None;
        }

        Some(sender.clone())
    }

    async fn publish(&self, dish_id: &str) {
        let Some(sender) = self.watcher(dish_id) else {
            return;
        };

        match self.aggregate(dish_id).await {
            Ok(aggregate) => {
                if offer(&sender, aggregate) {
                    debug!(dish_id, receivers = sender.receiver_count(), "Published aggregate");
                }
            }
            Err(e) => warn!(dish_id, error = %e, "Failed to recompute aggregate"),
        }
    }

    /// Live aggregate for a dish. The receiver starts at the current value and
    /// changes whenever a vote lands.
    pub async fn watch_aggregate(
        &self,
        dish_id: &str,
    ) -> Result<watch::Receiver<DishAggregate>, AppError> {
        self.ensure_dish(dish_id).await?;

        // Register before reading votes, so a cast landing in between is
        // either counted here or published to this channel.
        let (sender, receiver) = {
            let mut watchers = self.watchers.lock().unwrap_or_else(|e| e.into_inner());
            watchers.retain(|_, sender| sender.receiver_count() > 0);

            let sender = watchers
                .entry(dish_id.to_string())
                .or_insert_with(|| Arc::new(watch::Sender::new(DishAggregate::empty(dish_id))))
                .clone();
            let receiver = sender.subscribe();

            (sender, receiver)
        };

        offer(&sender, self.aggregate(dish_id).await?);

        Ok(receiver)
    }

    /// Calls `callback` with the current aggregate and again after every
    /// change, until the returned [`Subscription`] is cancelled or dropped.
    pub async fn subscribe_aggregate<F>(
        &self,
        dish_id: &str,
        mut callback: F,
    ) -> Result<Subscription, AppError>
    where
        F: FnMut(DishAggregate) + Send + 'static,
    {
        let mut receiver = self.watch_aggregate(dish_id).await?;
        let closed = Arc::new(Mutex::new(false));
        let task_closed = closed.clone();

        let handle = tokio::spawn(async move {
            loop {
                let snapshot = receiver.borrow_and_update().clone();
                {
                    // held across the callback so closing waits for a running one
                    let closed = task_closed.lock().unwrap_or_else(|e| e.into_inner());
                    if *closed {
                        break;
                    }
                    callback(snapshot);
                }

                if receiver.changed().await.is_err() {
                    break;
                }
            }
        });

        Ok(Subscription {
            handle: Some(handle),
            closed,
        })
    }
}

/// Live aggregate callback. Cancelling or dropping it stops the callback: once
/// either returns the callback will not run again. Dropping from inside the
/// callback itself deadlocks.
pub struct Subscription {
    handle: Option<JoinHandle<()>>,
    closed: Arc<Mutex<bool>>,
}

impl Subscription {
    fn close(&self) {
        *self.closed.lock().unwrap_or_else(|e| e.into_inner()) = true;
    }

    /// Stops the subscription and waits for its task to finish.
    pub async fn cancel(mut self) {
        self.close();
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
