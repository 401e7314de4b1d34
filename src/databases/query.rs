//! Query predicates for listing documents and files.
//!
//! Each query is sent as a JSON string in a repeated `queries[]` parameter.

use serde::Serialize;
use serde_json::Value;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Query {
    method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    attribute: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    values: Vec<Value>,
}

impl Query {
    fn new(method: &'static str, attribute: Option<&str>, values: Vec<Value>) -> Self {
        Self {
            method,
            attribute: attribute.map(str::to_string),
            values,
        }
    }

    /// Matches documents whose attribute equals the value.
    pub fn equal(attribute: &str, value: impl Into<Value>) -> Self {
        Self::new("equal", Some(attribute), vec![value.into()])
    }

    /// Full-text search on an attribute with a fulltext index.
    pub fn search(attribute: &str, text: &str) -> Self {
        Self::new("search", Some(attribute), vec![Value::from(text)])
    }

    pub fn limit(limit: u32) -> Self {
        Self::new("limit", None, vec![Value::from(limit)])
    }

    /// Returns results after the document with the given id.
    pub fn cursor_after(document_id: &str) -> Self {
        Self::new("cursorAfter", None, vec![Value::from(document_id)])
    }

    /// The wire form of the query.
    pub fn to_query_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

pub(crate) fn to_query_params(queries: &[Query]) -> Result<Vec<(&'static str, String)>, serde_json::Error> {
    queries
        .iter()
        .map(|q| Ok(("queries[]", q.to_query_string()?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        assert_eq!(
            Query::equal("accountId", "abc").to_query_string().unwrap(),
            r#"{"method":"equal","attribute":"accountId","values":["abc"]}"#
        );
        assert_eq!(
            Query::search("name", "burger").to_query_string().unwrap(),
            r#"{"method":"search","attribute":"name","values":["burger"]}"#
        );
        assert_eq!(
            Query::limit(100).to_query_string().unwrap(),
            r#"{"method":"limit","values":[100]}"#
        );
        assert_eq!(
            Query::cursor_after("doc-9").to_query_string().unwrap(),
            r#"{"method":"cursorAfter","values":["doc-9"]}"#
        );
    }
}
