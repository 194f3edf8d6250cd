use std::pin::Pin;

use futures::stream::{self, StreamExt};

use super::RecordStream;

/// Interleaves two newest-first streams into one newest-first stream.
///
/// Neither input is materialized; at most one item per side is buffered.
/// Errors are yielded as soon as they reach the head of either side.
pub fn merge_newest_first(left: RecordStream, right: RecordStream) -> RecordStream {
    stream::unfold((left.peekable(), right.peekable()), |(mut left, mut right)| async move {
        let take_left = {
            let head_left = Pin::new(&mut left).peek().await;
            let head_right = Pin::new(&mut right).peek().await;
            match (head_left, head_right) {
                (None, None) => return None,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (Some(Err(_)), Some(_)) => true,
                (Some(Ok(_)), Some(Err(_))) => false,
                (Some(Ok(l)), Some(Ok(r))) => l.timestamp() >= r.timestamp(),
            }
        };

        let item = if take_left {
            left.next().await
        } else {
            right.next().await
        };
        item.map(|item| (item, (left, right)))
    })
    .boxed()
}
