use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Conversation participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

/// One turn of the conversation, kept as the exact JSON sent or received.
///
/// Content parts (text blocks, tool results, ...) are opaque; only `role`
/// and `content` get typed accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message(Value);

impl Message {
    /// A user turn holding a single text block
    pub fn user_text(text: &str) -> Self {
        Self(json!({
            "role": Role::User.as_str(),
            "content": [{"type": "text", "text": text}],
        }))
    }

    /// The final message of a `response` event, stored unchanged
    pub fn from_server(message: Value) -> Self {
        Self(message)
    }

    pub fn role(&self) -> Option<Role> {
        self.0.get("role").and_then(Value::as_str).and_then(Role::from_str)
    }

    pub fn content(&self) -> &[Value] {
        self.0
            .get("content")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Concatenated text of all `text` content blocks
    pub fn text(&self) -> String {
        self.content()
            .iter()
            .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect()
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }
}

/// Append-only transcript exchanged with the agent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    history: Vec<Message>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_user(&mut self, text: &str) {
        self.history.push(Message::user_text(text));
    }

    pub fn append_from_server(&mut self, message: Value) {
        self.history.push(Message::from_server(message));
    }

    /// Full ordered history for the next request body
    pub fn snapshot(&self) -> Vec<Message> {
        self.history.clone()
    }

    pub fn messages(&self) -> &[Message] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.history.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.history.iter()
    }
}

impl<'a> IntoIterator for &'a ConversationState {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.history.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_append_user_shape() {
        let mut state = ConversationState::new();
        state.append_user("Where's my order ORD-1042?");

        let msg = state.last().unwrap();
        assert_eq!(msg.role(), Some(Role::User));
        assert_eq!(
            msg.as_json(),
            &json!({
                "role": "user",
                "content": [{"type": "text", "text": "Where's my order ORD-1042?"}]
            })
        );
        assert_eq!(msg.text(), "Where's my order ORD-1042?");
    }

    #[test]
    fn test_append_user_accepts_empty_text() {
        let mut state = ConversationState::new();
        state.append_user("");
        assert_eq!(state.len(), 1);
        assert_eq!(state.last().unwrap().text(), "");
    }

    #[test]
    fn test_append_from_server_is_verbatim() {
        let server = json!({
            "role": "assistant",
            "content": [
                {"type": "tool_use", "tool_use": {"name": "orders"}},
                {"type": "text", "text": "Shipped."}
            ],
            "metadata": {"request_id": "abc"}
        });
        let mut state = ConversationState::new();
        state.append_from_server(server.clone());

        let msg = state.last().unwrap();
        assert_eq!(msg.as_json(), &server);
        assert_eq!(msg.role(), Some(Role::Assistant));
        assert_eq!(msg.content().len(), 2);
        assert_eq!(msg.text(), "Shipped.");
        assert_eq!(serde_json::to_value(msg).unwrap(), server);
    }

    #[test]
    fn test_snapshot_is_idempotent() {
        let mut state = ConversationState::new();
        state.append_user("one");
        state.append_from_server(json!({"role": "assistant", "content": []}));

        let first = state.snapshot();
        let second = state.snapshot();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_history_order_is_chronological() {
        let mut state = ConversationState::new();
        state.append_user("a");
        state.append_user("a");
        state.append_user("b");

        let texts: Vec<String> = state.iter().map(Message::text).collect();
        assert_eq!(texts, vec!["a", "a", "b"]);
    }

    #[test]
    fn test_message_without_role_or_content() {
        let msg = Message::from_server(json!({"foo": 1}));
        assert_eq!(msg.role(), None);
        assert!(msg.content().is_empty());
        assert_eq!(msg.text(), "");
    }
}
