use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A discussion topic, optionally nested under a parent thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: String,
    pub name: String,
    pub description: String,
    pub parent_thread_id: Option<String>,
    #[serde(default)]
    pub related_course_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub active: bool,
    #[serde(default)]
    pub sub_thread_ids: Vec<String>,
    #[serde(default)]
    pub concept_tags: Vec<String>,
}

impl Thread {
    /// Build a thread from a creation request. Sub-threads start empty and
    /// are linked as children get created.
    pub fn from_new(id: String, new: NewThread, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            description: new.description,
            parent_thread_id: new.parent_thread_id,
            related_course_ids: new.related_course_ids,
            created_at,
            active: new.active,
            sub_thread_ids: Vec::new(),
            concept_tags: new.concept_tags,
        }
    }

    /// Shallow merge: every field present in the update replaces the current value
    pub fn apply(&mut self, update: ThreadUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(related_course_ids) = update.related_course_ids {
            self.related_course_ids = related_course_ids;
        }
        if let Some(active) = update.active {
            self.active = active;
        }
        if let Some(concept_tags) = update.concept_tags {
            self.concept_tags = concept_tags;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewThread {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent_thread_id: Option<String>,
    #[serde(default)]
    pub related_course_ids: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub concept_tags: Vec<String>,
}

fn default_active() -> bool {
    true
}

/// Partial update for PUT. Hierarchy links and creation time are not updatable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub related_course_ids: Option<Vec<String>>,
    pub active: Option<bool>,
    pub concept_tags: Option<Vec<String>>,
}

impl ThreadUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.related_course_ids.is_none()
            && self.active.is_none()
            && self.concept_tags.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadFilter {
    pub parent_thread_id: Option<String>,
    pub active: Option<bool>,
}

impl ThreadFilter {
    pub fn matches(&self, thread: &Thread) -> bool {
        let parent_ok = match &self.parent_thread_id {
            Some(parent) => thread.parent_thread_id.as_deref() == Some(parent.as_str()),
            None => true,
        };
        let active_ok = self.active.map_or(true, |active| thread.active == active);
        parent_ok && active_ok
    }
}
