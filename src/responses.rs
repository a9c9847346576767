// Collected listener return values from a single dispatch

use serde_json::Value;

/// Responses produced by one trigger call, in invocation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseCollection {
    responses: Vec<Value>,
    stopped: bool,
}

impl ResponseCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, response: Value) {
        self.responses.push(response);
    }

    pub(crate) fn set_stopped(&mut self, flag: bool) {
        self.stopped = flag;
    }

    /// Whether the dispatch ended before exhausting its listeners.
    pub fn stopped(&self) -> bool {
        self.stopped
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Response of the first listener invoked.
    pub fn first(&self) -> Option<&Value> {
        self.responses.first()
    }

    /// Response of the last listener invoked; when the dispatch was stopped,
    /// this is the stopping listener's response.
    pub fn last(&self) -> Option<&Value> {
        self.responses.last()
    }

    /// Strict-equality membership test over all responses.
    pub fn contains(&self, value: &Value) -> bool {
        self.responses.iter().any(|response| response == value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.responses.iter()
    }
}

impl<'a> IntoIterator for &'a ResponseCollection {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.responses.iter()
    }
}

impl IntoIterator for ResponseCollection {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.responses.into_iter()
    }
}
