//! Cursor-bounded traversal over an ordered history slice.

use assistd_core::error::StoreError;
use assistd_core::message::Message;
use assistd_core::store::{Order, PageQuery};
use uuid::Uuid;

/// Apply `query` to `history`, which must already be in
/// `(created_at, insertion)` order.
///
/// Each bound is resolved on its own: `after` only moves the start of the
/// window, `before` only moves its end.
pub fn paginate(
    history: &[Message],
    agent_id: Uuid,
    query: &PageQuery,
) -> Result<Vec<Message>, StoreError> {
    let position = |message_id: Uuid| {
        history
            .iter()
            .position(|m| m.id == message_id)
            .ok_or(StoreError::CursorNotFound {
                agent_id,
                message_id,
            })
    };

    let start = match query.after {
        Some(id) => position(id)? + 1,
        None => 0,
    };
    let end = match query.before {
        Some(id) => position(id)?,
        None => history.len(),
    };

    if start >= end {
        return Ok(Vec::new());
    }

    let window = &history[start..end];
    let page = match query.order {
        Order::Asc => window.iter().take(query.limit).cloned().collect(),
        Order::Desc => window.iter().rev().take(query.limit).cloned().collect(),
    };
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    /// Five messages one second apart, plus a sixth sharing the last timestamp.
    fn history(agent_id: Uuid) -> Vec<Message> {
        let base = Utc::now();
        let mut out: Vec<Message> = (0..5)
            .map(|i| {
                let mut m = Message::user(agent_id, "u", format!("m{i}"));
                m.created_at = base + Duration::seconds(i);
                m
            })
            .collect();
        let mut tie = Message::user(agent_id, "u", "m5");
        tie.created_at = out[4].created_at;
        out.push(tie);
        out
    }

    fn contents(page: &[Message]) -> Vec<&str> {
        page.iter().map(|m| m.content.as_str()).collect()
    }

    #[test]
    fn unbounded_ascending() {
        let agent = Uuid::new_v4();
        let h = history(agent);
        let page = paginate(&h, agent, &PageQuery::default()).unwrap();
        assert_eq!(contents(&page), vec!["m0", "m1", "m2", "m3", "m4", "m5"]);
    }

    #[test]
    fn descending_is_exact_reverse() {
        let agent = Uuid::new_v4();
        let h = history(agent);
        let asc = paginate(&h, agent, &PageQuery::default()).unwrap();
        let desc = paginate(
            &h,
            agent,
            &PageQuery {
                order: Order::Desc,
                ..PageQuery::default()
            },
        )
        .unwrap();
        let reversed: Vec<_> = asc.into_iter().rev().collect();
        assert_eq!(desc, reversed);
    }

    #[test]
    fn after_only_is_honored_without_before() {
        let agent = Uuid::new_v4();
        let h = history(agent);
        let query = PageQuery {
            after: Some(h[1].id),
            ..PageQuery::default()
        };
        let page = paginate(&h, agent, &query).unwrap();
        assert_eq!(contents(&page), vec!["m2", "m3", "m4", "m5"]);
    }

    #[test]
    fn before_only() {
        let agent = Uuid::new_v4();
        let h = history(agent);
        let query = PageQuery {
            before: Some(h[2].id),
            ..PageQuery::default()
        };
        let page = paginate(&h, agent, &query).unwrap();
        assert_eq!(contents(&page), vec!["m0", "m1"]);
    }

    #[test]
    fn both_bounds_are_exclusive() {
        let agent = Uuid::new_v4();
        let h = history(agent);
        let query = PageQuery {
            after: Some(h[0].id),
            before: Some(h[4].id),
            ..PageQuery::default()
        };
        let page = paginate(&h, agent, &query).unwrap();
        assert_eq!(contents(&page), vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn desc_with_limit_returns_newest_within_bounds() {
        let agent = Uuid::new_v4();
        let h = history(agent);
        let query = PageQuery {
            before: Some(h[4].id),
            order: Order::Desc,
            limit: 2,
            ..PageQuery::default()
        };
        let page = paginate(&h, agent, &query).unwrap();
        assert_eq!(contents(&page), vec!["m3", "m2"]);
    }

    #[test]
    fn limit_is_respected() {
        let agent = Uuid::new_v4();
        let h = history(agent);
        for limit in 1..=7 {
            let query = PageQuery {
                limit,
                ..PageQuery::default()
            };
            let page = paginate(&h, agent, &query).unwrap();
            assert!(page.len() <= limit);
        }
    }

    #[test]
    fn equal_timestamps_keep_insertion_order() {
        let agent = Uuid::new_v4();
        let h = history(agent);
        let query = PageQuery {
            after: Some(h[3].id),
            ..PageQuery::default()
        };
        let page = paginate(&h, agent, &query).unwrap();
        assert_eq!(contents(&page), vec!["m4", "m5"]);
    }

    #[test]
    fn crossed_bounds_yield_empty_page() {
        let agent = Uuid::new_v4();
        let h = history(agent);
        let query = PageQuery {
            after: Some(h[3].id),
            before: Some(h[1].id),
            ..PageQuery::default()
        };
        assert!(paginate(&h, agent, &query).unwrap().is_empty());
    }

    #[test]
    fn unknown_cursor_is_reported() {
        let agent = Uuid::new_v4();
        let h = history(agent);
        let missing = Uuid::new_v4();
        let query = PageQuery {
            before: Some(missing),
            ..PageQuery::default()
        };
        let err = paginate(&h, agent, &query).unwrap_err();
        assert!(matches!(
            err,
            StoreError::CursorNotFound { message_id, .. } if message_id == missing
        ));
    }
}
