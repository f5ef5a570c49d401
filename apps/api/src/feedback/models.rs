use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Medium the feedback arrived through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Whatsapp,
    #[default]
    Website,
    Widget,
    Survey,
    Sms,
    SocialMedia,
    Phone,
    Other,
}

impl Channel {
    pub const ALL: [Channel; 9] = [
        Channel::Email,
        Channel::Whatsapp,
        Channel::Website,
        Channel::Widget,
        Channel::Survey,
        Channel::Sms,
        Channel::SocialMedia,
        Channel::Phone,
        Channel::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Whatsapp => "whatsapp",
            Channel::Website => "website",
            Channel::Widget => "widget",
            Channel::Survey => "survey",
            Channel::Sms => "sms",
            Channel::SocialMedia => "social_media",
            Channel::Phone => "phone",
            Channel::Other => "other",
        }
    }
}

/// Lifecycle of a feedback row.
///
/// ```text
/// pending    → processing | archived
/// processing → processed | failed
/// failed     → processing | archived
/// processed  → archived
/// archived   → (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    Pending,
    Processing,
    Processed,
    Failed,
    Archived,
}

impl FeedbackStatus {
    pub const ALL: [FeedbackStatus; 5] = [
        FeedbackStatus::Pending,
        FeedbackStatus::Processing,
        FeedbackStatus::Processed,
        FeedbackStatus::Failed,
        FeedbackStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackStatus::Pending => "pending",
            FeedbackStatus::Processing => "processing",
            FeedbackStatus::Processed => "processed",
            FeedbackStatus::Failed => "failed",
            FeedbackStatus::Archived => "archived",
        }
    }

    pub fn can_transition_to(self, next: FeedbackStatus) -> bool {
        use FeedbackStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Archived)
                | (Processing, Processed)
                | (Processing, Failed)
                | (Failed, Processing)
                | (Failed, Archived)
                | (Processed, Archived)
        )
    }

    /// Every status allowed to move into `self`. Used in conditional UPDATEs.
    pub fn predecessors(self) -> Vec<FeedbackStatus> {
        FeedbackStatus::ALL
            .into_iter()
            .filter(|from| from.can_transition_to(self))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown value '{0}'")]
pub struct UnknownVariant(pub String);

impl FromStr for FeedbackStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeedbackStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl FromStr for Channel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|channel| channel.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl fmt::Display for FeedbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use FeedbackStatus::*;

    #[test]
    fn test_processed_never_returns_to_pending() {
        assert!(!Processed.can_transition_to(Pending));
        assert!(!Processed.can_transition_to(Processing));
        assert!(!Processed.can_transition_to(Failed));
        assert!(!Processed.predecessors().contains(&Pending));
        assert!(Pending.predecessors().is_empty());
    }

    #[test]
    fn test_happy_path_transitions() {
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Processed));
        assert!(Processing.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Processing));
    }

    #[test]
    fn test_archived_is_terminal() {
        for next in FeedbackStatus::ALL {
            assert!(!Archived.can_transition_to(next));
        }
    }

    #[test]
    fn test_no_self_transitions() {
        for status in FeedbackStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_predecessors() {
        assert_eq!(Processing.predecessors(), vec![Pending, Failed]);
        assert_eq!(Processed.predecessors(), vec![Processing]);
        assert_eq!(Archived.predecessors(), vec![Pending, Processed, Failed]);
    }

    #[test]
    fn test_string_round_trip_matches_serde() {
        for status in FeedbackStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<FeedbackStatus>().unwrap(), status);
        }
        for channel in Channel::ALL {
            let json = serde_json::to_string(&channel).unwrap();
            assert_eq!(json, format!("\"{}\"", channel.as_str()));
            assert_eq!(channel.as_str().parse::<Channel>().unwrap(), channel);
        }
    }

    #[test]
    fn test_unknown_strings_are_rejected() {
        assert!("done".parse::<FeedbackStatus>().is_err());
        assert!("fax".parse::<Channel>().is_err());
    }

    #[test]
    fn test_unknown_variant_message() {
        let err = "done".parse::<FeedbackStatus>().unwrap_err();
        assert_eq!(err, UnknownVariant("done".to_string()));
        assert_eq!(err.to_string(), "unknown value 'done'");
    }
}
