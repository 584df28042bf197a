use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A discrete discussion instance within a thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub thread_id: String,
    pub title: String,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    /// Set semantics: de-duplicated, first-seen order kept
    pub participant_ids: Vec<String>,
    #[serde(default)]
    pub concept_tags: Vec<String>,
}

impl Conversation {
    pub fn from_new(
        id: String,
        thread_id: String,
        new: NewConversation,
        started_at: DateTime<Utc>,
    ) -> Self {
        let mut participant_ids: Vec<String> = Vec::with_capacity(new.participant_ids.len());
        for participant in new.participant_ids {
            if !participant_ids.contains(&participant) {
                participant_ids.push(participant);
            }
        }

        Self {
            id,
            thread_id,
            title: new.title,
            started_at,
            last_activity_at: started_at,
            participant_ids,
            concept_tags: new.concept_tags,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConversation {
    pub title: String,
    #[serde(default)]
    pub participant_ids: Vec<String>,
    #[serde(default)]
    pub concept_tags: Vec<String>,
}
