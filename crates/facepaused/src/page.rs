//! Presentation state the daemon exposes: status label, root classes, button.

use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const STATUS_ATTENTIVE: &str = "✅ Attentive";
pub const STATUS_NOT_ATTENTIVE: &str = "❌ Not attentive";
pub const CLASS_ATTENTIVE: &str = "paying-attention";
pub const CLASS_NOT_ATTENTIVE: &str = "not-paying-attention";
pub const LABEL_START: &str = "Start";
pub const LABEL_STOP: &str = "Stop";

pub type SharedPage = Arc<Mutex<Page>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub detecting: bool,
    pub status_text: String,
    pub status_class: String,
    pub root_classes: BTreeSet<String>,
    pub button_label: String,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            detecting: false,
            status_text: String::new(),
            status_class: String::new(),
            root_classes: BTreeSet::new(),
            button_label: LABEL_START.to_string(),
        }
    }
}

impl Page {
    pub fn shared() -> SharedPage {
        Arc::new(Mutex::new(Self::default()))
    }

    /// Replace the status text and its (single) style class.
    pub fn set_status(&mut self, text: &str, class: &str) {
        self.status_text = text.to_string();
        self.status_class = class.to_string();
    }

    pub fn add_root_class(&mut self, class: &str) {
        self.root_classes.insert(class.to_string());
    }

    pub fn remove_root_class(&mut self, class: &str) {
        self.root_classes.remove(class);
    }

    #[cfg(test)]
    pub fn has_root_class(&self, class: &str) -> bool {
        self.root_classes.contains(class)
    }

    /// Mirror the session state and its button label.
    pub fn set_detecting(&mut self, detecting: bool) {
        let label = if detecting { LABEL_STOP } else { LABEL_START };
        self.detecting = detecting;
        self.button_label = label.to_string();
    }
}
