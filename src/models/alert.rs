// Alert handed to the notifier: when it was raised and what to say

use chrono::{DateTime, Local};

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl Alert {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            message: message.into(),
        }
    }
}
