//! Notifications surfaced to the operator.

/// Kind of an [`Alert`]; drives its colour and icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AlertKind {
    #[default]
    Info,
    Warning,
    Error,
    Success,
}

/// A follow-up the operator can trigger from an alert.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlertAction {
    pub label: String,
    pub action: String,
}

/// An operator notification.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Alert {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub timestamp_ms: u64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub read: bool,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub actions: Vec<AlertAction>,
}

impl Alert {
    /// Create an unread alert stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        kind: AlertKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            message: message.into(),
            timestamp_ms: crate::current_timestamp_ms(),
            read: false,
            actions: Vec::new(),
        }
    }

    /// Attach a follow-up action.
    pub fn with_action(mut self, label: impl Into<String>, action: impl Into<String>) -> Self {
        self.actions.push(AlertAction {
            label: label.into(),
            action: action.into(),
        });
        self
    }
}

/// Category of an [`Insight`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum InsightKind {
    Optimization,
    Security,
    #[default]
    Performance,
    Maintenance,
}

impl InsightKind {
    /// Parse a category name case-insensitively, falling back to `Performance`.
    pub fn from_category(category: &str) -> Self {
        match category.to_ascii_lowercase().as_str() {
            "optimization" => InsightKind::Optimization,
            "security" => InsightKind::Security,
            "maintenance" => InsightKind::Maintenance,
            _ => InsightKind::Performance,
        }
    }
}

/// Severity shared by insights and security findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Parse a severity name case-insensitively, falling back to `Low`.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "medium" => Severity::Medium,
            "high" => Severity::High,
            "critical" => Severity::Critical,
            _ => Severity::Low,
        }
    }
}

/// An analysis finding with a recommended remedy.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Insight {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: InsightKind,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub recommendation: String,
    /// Confidence in percent.
    #[cfg_attr(feature = "serde", serde(default))]
    pub confidence: f64,
    pub timestamp_ms: u64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub applied: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_new_is_unread() {
        let alert = Alert::new("a-1", AlertKind::Warning, "CPU", "CPU at 91%")
            .with_action("Open processes", "view:processes");
        assert!(!alert.read);
        assert!(alert.timestamp_ms > 0);
        assert_eq!(alert.actions.len(), 1);
    }

    #[test]
    fn test_category_and_severity_parsing() {
        assert_eq!(InsightKind::from_category("Security"), InsightKind::Security);
        assert_eq!(InsightKind::from_category("whatever"), InsightKind::Performance);
        assert_eq!(Severity::from_name("High"), Severity::High);
        assert!(Severity::Critical > Severity::Medium);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_alert_wire_format() {
        let alert = Alert::new("a-2", AlertKind::Error, "Kill failed", "permission denied");
        let value = serde_json::to_value(&alert).unwrap();
        assert_eq!(value["type"], "error");
        assert!(value.get("timestampMs").is_some());
        assert!(value.get("actions").is_none());
    }
}
