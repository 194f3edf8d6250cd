//! Concurrent joins with an explicit failure policy.
//!
//! Every call site picks one: [`fail_fast`] aborts on the first error and
//! returns nothing partial, [`best_effort`] waits for everything and hands
//! back each outcome in input order.

use std::future::Future;

use futures::future;

use crate::error::QueryResult;

pub async fn fail_fast<I, F, T>(futures: I) -> QueryResult<Vec<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = QueryResult<T>>,
{
    future::try_join_all(futures).await
}

pub async fn best_effort<I, F, T>(futures: I) -> Vec<QueryResult<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = QueryResult<T>>,
{
    future::join_all(futures).await
}
