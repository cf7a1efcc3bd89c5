use serde::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Purchase,
    Activation,
    Success,
    Error,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Purchase => "purchase",
            Self::Activation => "activation",
            Self::Success => "success",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// A transient modal shown by the purchase workflow.
///
/// At most one is visible per session; `success` and `error` modals close
/// themselves after `duration`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationModal {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub is_visible: bool,
    pub auto_close: bool,
    #[serde(with = "duration_millis")]
    pub duration: Option<Duration>,
}

impl NotificationModal {
    pub fn purchasing(id: u64, item_name: &str) -> Self {
        Self::sticky(
            id,
            NotificationKind::Purchase,
            "Processing purchase",
            format!("Processing the purchase of {item_name}..."),
        )
    }

    pub fn activating(id: u64, item_name: &str) -> Self {
        Self::sticky(
            id,
            NotificationKind::Activation,
            "Activating",
            format!("Activating {item_name} for your organization..."),
        )
    }

    pub fn success(id: u64, item_name: &str, duration: Duration) -> Self {
        Self::closing(
            id,
            NotificationKind::Success,
            "Purchase completed",
            format!("{item_name} is now active."),
            duration,
        )
    }

    pub fn error(id: u64, duration: Duration) -> Self {
        Self::closing(
            id,
            NotificationKind::Error,
            "Purchase failed",
            "The purchase could not be completed. Please try again.".to_string(),
            duration,
        )
    }

    fn sticky(id: u64, kind: NotificationKind, title: &str, message: String) -> Self {
        Self {
            id,
            kind,
            title: title.to_string(),
            message,
            is_visible: true,
            auto_close: false,
            duration: None,
        }
    }

    fn closing(
        id: u64,
        kind: NotificationKind,
        title: &str,
        message: String,
        duration: Duration,
    ) -> Self {
        Self {
            id,
            kind,
            title: title.to_string(),
            message,
            is_visible: true,
            auto_close: true,
            duration: Some(duration),
        }
    }
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_u64(d.as_millis() as u64),
            None => serializer.serialize_none(),
        }
    }
}
