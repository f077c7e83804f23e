use serde::{Deserialize, Serialize};

/// Who produced a message. Styling and parsing policy are looked up from this
/// tag rather than branched on ad hoc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MessageKind {
    User,
    Assistant,
    System,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub kind: MessageKind,
    pub content: String,
}

impl MessageKind {
    pub const ALL: [MessageKind; 4] = [
        MessageKind::User,
        MessageKind::Assistant,
        MessageKind::System,
        MessageKind::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::User => "user",
            MessageKind::Assistant => "assistant",
            MessageKind::System => "system",
            MessageKind::Custom => "custom",
        }
    }

    /// Dense index used by the style lookup tables.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_user(self) -> bool {
        self == MessageKind::User
    }

    pub fn is_assistant(self) -> bool {
        self == MessageKind::Assistant
    }
}

impl AsRef<str> for MessageKind {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for MessageKind {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(MessageKind::User),
            "assistant" | "ai" => Ok(MessageKind::Assistant),
            "system" => Ok(MessageKind::System),
            "custom" => Ok(MessageKind::Custom),
            _ => Err(format!("invalid message kind: {value}")),
        }
    }
}

impl TryFrom<String> for MessageKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<MessageKind> for String {
    fn from(value: MessageKind) -> Self {
        value.as_str().to_string()
    }
}

impl std::str::FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

impl Message {
    pub fn new(kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageKind::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageKind::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageKind::System, content)
    }

    pub fn is_user(&self) -> bool {
        self.kind.is_user()
    }

    pub fn is_assistant(&self) -> bool {
        self.kind.is_assistant()
    }
}
