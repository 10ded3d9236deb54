use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    #[default]
    Dashboard,
    Customers,
    DailyEntry,
    Reports,
    AiInsights,
    Settings,
    Payments,
}

impl View {
    pub fn tag(self) -> &'static str {
        match self {
            View::Dashboard => "dashboard",
            View::Customers => "customers",
            View::DailyEntry => "daily-entry",
            View::Reports => "reports",
            View::AiInsights => "ai-insights",
            View::Settings => "settings",
            View::Payments => "payments",
        }
    }

    pub fn title(self) -> String {
        match self {
            View::Dashboard => "Daily Pulse".to_string(),
            other => other.tag().replacen('-', " ", 1),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryTab {
    #[default]
    Deliveries,
    Payments,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Modal {
    AddCustomer,
    EditCustomer { customer_id: String },
    CustomerHistory { customer_id: String, tab: HistoryTab },
    DeleteCustomer { customer_id: String },
    RecordPayment { customer_id: String },
}

/// Which screen is showing and which dialog, if any, sits on top of it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Navigation {
    pub view: View,
    pub modal: Option<Modal>,
}

impl Navigation {
    pub fn navigate(&mut self, view: View) {
        self.view = view;
        self.modal = None;
    }

    /// Replaces any dialog already open.
    pub fn open_modal(&mut self, modal: Modal) {
        self.modal = Some(modal);
    }

    pub fn close_modal(&mut self) -> Option<Modal> {
        self.modal.take()
    }

    pub fn switch_history_tab(&mut self, tab: HistoryTab) {
        if let Some(Modal::CustomerHistory { tab: current, .. }) = self.modal.as_mut() {
            *current = tab;
        }
    }

    pub fn title(&self) -> String {
        self.view.title()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_follow_view_tags() {
        assert_eq!(View::Dashboard.title(), "Daily Pulse");
        assert_eq!(View::DailyEntry.title(), "daily entry");
        assert_eq!(View::AiInsights.title(), "ai insights");
        assert_eq!(View::Reports.title(), "reports");
    }

    #[test]
    fn view_tags_match_serde_names() {
        for view in [View::Dashboard, View::DailyEntry, View::AiInsights, View::Payments] {
            let json = serde_json::to_string(&view).unwrap();
            assert_eq!(json, format!("\"{}\"", view.tag()));
        }
    }

    #[test]
    fn navigating_closes_open_modal() {
        let mut nav = Navigation::default();
        nav.open_modal(Modal::RecordPayment {
            customer_id: "1".to_string(),
        });
        nav.navigate(View::Customers);
        assert_eq!(nav.view, View::Customers);
        assert!(nav.modal.is_none());
    }

    #[test]
    fn history_tab_switches_only_inside_history_modal() {
        let mut nav = Navigation::default();
        nav.switch_history_tab(HistoryTab::Payments);
        assert!(nav.modal.is_none());

        nav.open_modal(Modal::CustomerHistory {
            customer_id: "2".to_string(),
            tab: HistoryTab::Deliveries,
        });
        nav.switch_history_tab(HistoryTab::Payments);
        assert_eq!(
            nav.close_modal(),
            Some(Modal::CustomerHistory {
                customer_id: "2".to_string(),
                tab: HistoryTab::Payments,
            })
        );
    }
}
