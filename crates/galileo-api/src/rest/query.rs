// Query-string construction for filter-style list endpoints.

use url::form_urlencoded::byte_serialize;

/// One filter value.
///
/// Falsy values (empty text, zero, `false`, empty lists) are dropped
/// entirely when the query string is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Absent,
    Text(String),
    Number(i64),
    Flag(bool),
    List(Vec<String>),
}

impl QueryValue {
    fn is_falsy(&self) -> bool {
        match self {
            Self::Absent => true,
            Self::Text(s) => s.is_empty(),
            Self::Number(n) => *n == 0,
            Self::Flag(b) => !b,
            Self::List(items) => items.is_empty(),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for QueryValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&String> for QueryValue {
    fn from(v: &String) -> Self {
        Self::Text(v.clone())
    }
}

impl From<i64> for QueryValue {
    fn from(v: i64) -> Self {
        Self::Number(v)
    }
}

impl From<u32> for QueryValue {
    fn from(v: u32) -> Self {
        Self::Number(i64::from(v))
    }
}

impl From<bool> for QueryValue {
    fn from(v: bool) -> Self {
        Self::Flag(v)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(v: Vec<String>) -> Self {
        Self::List(v)
    }
}

impl From<&[String]> for QueryValue {
    fn from(v: &[String]) -> Self {
        Self::List(v.to_vec())
    }
}

impl From<&Vec<String>> for QueryValue {
    fn from(v: &Vec<String>) -> Self {
        Self::List(v.clone())
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Absent, Into::into)
    }
}

/// Ordered filter set rendered as `key=value&key=value`.
///
/// Keys keep their insertion order and list values expand into one
/// `key=item` pair per element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, QueryValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter, consuming and returning the builder.
    pub fn with(mut self, key: &str, value: impl Into<QueryValue>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: &str, value: impl Into<QueryValue>) {
        self.pairs.push((key.to_owned(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.iter().all(|(_, v)| v.is_falsy())
    }

    /// Render the query string without a leading `?`.
    pub fn to_query_string(&self) -> String {
        let mut parts = Vec::new();
        for (key, value) in &self.pairs {
            if value.is_falsy() {
                continue;
            }
            let key = encode(key);
            match value {
                QueryValue::List(items) => {
                    parts.extend(items.iter().map(|item| format!("{key}={}", encode(item))));
                }
                QueryValue::Text(s) => parts.push(format!("{key}={}", encode(s))),
                QueryValue::Number(n) => parts.push(format!("{key}={n}")),
                QueryValue::Flag(_) => parts.push(format!("{key}=True")),
                QueryValue::Absent => {}
            }
        }
        parts.join("&")
    }
}

fn encode(raw: &str) -> String {
    byte_serialize(raw.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lists_expand_and_absent_values_drop() {
        let query = QueryParams::new()
            .with("ids", vec!["a".to_owned(), "b".to_owned()])
            .with("page", None::<u32>);
        assert_eq!(query.to_query_string(), "ids=a&ids=b");
    }

    #[test]
    fn falsy_values_are_omitted() {
        let query = QueryParams::new()
            .with("name", "")
            .with("page", 0_u32)
            .with("archived", false)
            .with("stationids", Vec::<String>::new())
            .with("items", 25_u32);
        assert_eq!(query.to_query_string(), "items=25");
    }

    #[test]
    fn insertion_order_is_kept() {
        let query = QueryParams::new()
            .with("page", 2_u32)
            .with("statuses", vec!["running".to_owned(), "paused".to_owned()])
            .with("userids", vec!["u1".to_owned()])
            .with("items", 10_u32);
        assert_eq!(
            query.to_query_string(),
            "page=2&statuses=running&statuses=paused&userids=u1&items=10"
        );
    }

    #[test]
    fn values_are_percent_encoded() {
        let query = QueryParams::new().with("names", vec!["my station".to_owned(), "a&b".to_owned()]);
        assert_eq!(query.to_query_string(), "names=my+station&names=a%26b");
    }

    #[test]
    fn true_flags_render() {
        let query = QueryParams::new().with("archived", true);
        assert_eq!(query.to_query_string(), "archived=True");
    }

    #[test]
    fn empty_when_everything_is_falsy() {
        let query = QueryParams::new().with("page", None::<u32>).with("name", "");
        assert!(query.is_empty());
        assert_eq!(query.to_query_string(), "");
    }
}
