use std::collections::BTreeSet;

use serde::Deserialize;

use messages::{AppError, ErrorResponse, MessageQuery};

/// Query string of `GET /messages`.
///
/// `?fields=id,message&pageSize=20&pageStartIndex=2` selects two fields and
/// the second page of twenty.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub fields: Option<String>,
    pub page_size: Option<String>,
    pub page_start_index: Option<String>,
}

fn invalid_param(op: &'static str, name: &str) -> AppError {
    AppError::invalid(op).with_response(ErrorResponse::message(format!("invalid {} value", name)))
}

fn parse_positive(op: &'static str, name: &str, value: &str) -> Result<u64, AppError> {
    match value.trim().parse::<u64>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(invalid_param(op, name)),
    }
}

impl ListParams {
    /// Resolve the page into an absolute offset: `(pageStartIndex - 1) * pageSize`.
    pub fn into_query(self, op: &'static str) -> Result<MessageQuery, AppError> {
        let limit = self
            .page_size
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| parse_positive(op, "pageSize", s))
            .transpose()?;

        let page = self
            .page_start_index
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| parse_positive(op, "pageStartIndex", s))
            .transpose()?;

        let offset = match (page, limit) {
            (None, _) => None,
            (Some(_), None) => {
                return Err(AppError::invalid(op).with_response(ErrorResponse::message(
                    "pageStartIndex requires pageSize",
                )))
            }
            (Some(page), Some(size)) => Some(
                (page - 1)
                    .checked_mul(size)
                    .ok_or_else(|| invalid_param(op, "pageStartIndex"))?,
            ),
        };

        let fields: BTreeSet<String> = self
            .fields
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect();

        Ok(MessageQuery {
            fields,
            limit,
            offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(fields: Option<&str>, size: Option<&str>, index: Option<&str>) -> ListParams {
        ListParams {
            fields: fields.map(String::from),
            page_size: size.map(String::from),
            page_start_index: index.map(String::from),
        }
    }

    fn error_json(err: AppError) -> String {
        err.to_json().unwrap()
    }

    #[test]
    fn test_empty_params() {
        let query = ListParams::default().into_query("op").unwrap();
        assert_eq!(query, MessageQuery::default());
    }

    #[test]
    fn test_fields_are_split_and_trimmed() {
        let query = params(Some(" id, message,,isPalindrome ,"), None, None)
            .into_query("op")
            .unwrap();
        assert_eq!(
            query.fields,
            ["id", "isPalindrome", "message"]
                .into_iter()
                .map(String::from)
                .collect()
        );
    }

    #[test]
    fn test_page_resolves_to_offset() {
        let query = params(None, Some("20"), Some("3")).into_query("op").unwrap();
        assert_eq!(query.limit, Some(20));
        assert_eq!(query.offset, Some(40));

        let query = params(None, Some("20"), Some("1")).into_query("op").unwrap();
        assert_eq!(query.offset, Some(0));

        let query = params(None, Some("5"), None).into_query("op").unwrap();
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.offset, None);
    }

    #[test]
    fn test_invalid_page_size() {
        for value in ["badSize", "0", "-1", "true"] {
            let err = params(None, Some(value), None).into_query("op").unwrap_err();
            assert_eq!(
                error_json(err),
                r#"{"errors":[{"error":"invalid pageSize value"}]}"#,
                "pageSize={}",
                value
            );
        }
    }

    #[test]
    fn test_invalid_page_start_index() {
        for value in ["badSize", "0", "-1", "true"] {
            let err = params(None, Some("10"), Some(value))
                .into_query("op")
                .unwrap_err();
            assert_eq!(
                error_json(err),
                r#"{"errors":[{"error":"invalid pageStartIndex value"}]}"#,
                "pageStartIndex={}",
                value
            );
        }
    }

    #[test]
    fn test_page_start_index_requires_page_size() {
        let err = params(None, None, Some("2")).into_query("op").unwrap_err();
        assert_eq!(
            error_json(err),
            r#"{"errors":[{"error":"pageStartIndex requires pageSize"}]}"#
        );
    }

    #[test]
    fn test_offset_overflow_is_invalid() {
        let err = params(None, Some(&u64::MAX.to_string()), Some("3"))
            .into_query("op")
            .unwrap_err();
        assert!(err.has_response());
    }
}
