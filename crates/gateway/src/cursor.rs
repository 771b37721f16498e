//! Validation of `limit`/`order`/`after`/`before` list parameters.

use assistd_core::store::{DEFAULT_PAGE_LIMIT, Order, PageQuery};
use uuid::Uuid;

use crate::dto::ListMessagesParams;
use crate::error::ApiError;

/// Parse a resource identifier, naming the parameter on failure.
pub fn parse_id(name: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::invalid(format!("Invalid {name}: '{raw}'")))
}

impl ListMessagesParams {
    /// Validate into a store query. Missing parameters take their defaults.
    pub fn into_query(self) -> Result<PageQuery, ApiError> {
        let limit = match self.limit.as_deref() {
            None => DEFAULT_PAGE_LIMIT,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(0) | Err(_) => {
                    return Err(ApiError::invalid(format!(
                        "limit must be a positive integer, got '{raw}'"
                    )));
                }
                Ok(n) => n,
            },
        };

        let order = match self.order.as_deref() {
            None | Some("asc") => Order::Asc,
            Some("desc") => Order::Desc,
            Some(other) => {
                return Err(ApiError::invalid(format!(
                    "order must be 'asc' or 'desc', got '{other}'"
                )));
            }
        };

        let after = self
            .after
            .as_deref()
            .map(|raw| parse_id("after", raw))
            .transpose()?;
        let before = self
            .before
            .as_deref()
            .map(|raw| parse_id("before", raw))
            .transpose()?;

        Ok(PageQuery {
            after,
            before,
            order,
            limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(limit: Option<&str>, order: Option<&str>) -> ListMessagesParams {
        ListMessagesParams {
            limit: limit.map(str::to_string),
            order: order.map(str::to_string),
            ..ListMessagesParams::default()
        }
    }

    #[test]
    fn defaults_when_absent() {
        let query = ListMessagesParams::default().into_query().unwrap();
        assert_eq!(query, PageQuery::default());
    }

    #[test]
    fn parses_limit_and_order() {
        let query = params(Some("25"), Some("desc")).into_query().unwrap();
        assert_eq!(query.limit, 25);
        assert_eq!(query.order, Order::Desc);
    }

    #[test]
    fn rejects_bad_limits() {
        for bad in ["0", "-1", "ten", ""] {
            let err = params(Some(bad), None).into_query().unwrap_err();
            assert!(matches!(err, ApiError::InvalidArgument(_)), "limit {bad:?}");
        }
    }

    #[test]
    fn rejects_unknown_order() {
        let err = params(None, Some("newest")).into_query().unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
    }

    #[test]
    fn after_and_before_are_parsed_independently() {
        let after = Uuid::new_v4();
        let query = ListMessagesParams {
            after: Some(after.to_string()),
            ..ListMessagesParams::default()
        }
        .into_query()
        .unwrap();
        assert_eq!(query.after, Some(after));
        assert_eq!(query.before, None);
    }

    #[test]
    fn malformed_cursor_is_invalid() {
        let err = ListMessagesParams {
            before: Some("msg-123".into()),
            ..ListMessagesParams::default()
        }
        .into_query()
        .unwrap_err();
        assert!(err.to_string().contains("before"));
    }
}
