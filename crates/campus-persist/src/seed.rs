use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::{
    Conversation, MemberRole, Message, MessageContent, Thread, ThreadMember, User,
};

/// 2024-01-15T09:00:00Z
const SEED_EPOCH: i64 = 1_705_309_200;

/// Demo community data loaded when `store.seed` is enabled
#[derive(Debug, Clone, Default)]
pub struct Fixtures {
    pub users: Vec<User>,
    pub threads: Vec<Thread>,
    pub conversations: Vec<Conversation>,
    pub messages: Vec<Message>,
    pub members: HashMap<String, Vec<ThreadMember>>,
}

fn at(minutes: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(SEED_EPOCH + minutes * 60, 0).unwrap_or_default()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn user(id: &str, username: &str, level: u32) -> User {
    User {
        id: id.to_string(),
        username: username.to_string(),
        level,
    }
}

#[allow(clippy::too_many_arguments)]
fn thread(
    id: &str,
    name: &str,
    description: &str,
    parent: Option<&str>,
    courses: &[&str],
    subs: &[&str],
    tags: &[&str],
    minutes: i64,
) -> Thread {
    Thread {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        parent_thread_id: parent.map(str::to_string),
        related_course_ids: strings(courses),
        created_at: at(minutes),
        active: true,
        sub_thread_ids: strings(subs),
        concept_tags: strings(tags),
    }
}

fn message(
    id: &str,
    thread_id: &str,
    conversation_id: &str,
    user_id: &str,
    content: MessageContent,
    minutes: i64,
    reply_to: Option<&str>,
) -> Message {
    Message {
        id: id.to_string(),
        thread_id: thread_id.to_string(),
        conversation_id: conversation_id.to_string(),
        user_id: user_id.to_string(),
        message_type: content.kind(),
        content,
        timestamp: at(minutes),
        reply_to_message_id: reply_to.map(str::to_string),
        concept_tags: None,
    }
}

pub fn fixtures() -> Fixtures {
    let users = vec![
        user("user-1", "ada", 3),
        user("user-2", "linus", 5),
        user("user-3", "grace", 7),
        user("user-4", "alan", 1),
    ];

    let threads = vec![
        thread(
            "thread-rust",
            "Rust Fundamentals",
            "Questions and tips for the introductory Rust course",
            None,
            &["course-rust-101"],
            &["thread-ownership"],
            &["rust", "systems"],
            0,
        ),
        thread(
            "thread-ownership",
            "Ownership & Borrowing",
            "Everything about moves, borrows and lifetimes",
            Some("thread-rust"),
            &["course-rust-101"],
            &[],
            &["ownership", "lifetimes"],
            30,
        ),
        thread(
            "thread-algorithms",
            "Algorithms Study Group",
            "Weekly problem sets on sorting, graphs and dynamic programming",
            None,
            &["course-algo-201"],
            &[],
            &["algorithms", "complexity"],
            60,
        ),
    ];

    let conversations = vec![
        Conversation {
            id: "conv-borrowck".to_string(),
            thread_id: "thread-ownership".to_string(),
            title: "Why does the borrow checker reject this loop?".to_string(),
            started_at: at(90),
            last_activity_at: at(120),
            participant_ids: strings(&["user-1", "user-2"]),
            concept_tags: strings(&["borrowing"]),
        },
        Conversation {
            id: "conv-quicksort".to_string(),
            thread_id: "thread-algorithms".to_string(),
            title: "Quicksort worst case".to_string(),
            started_at: at(150),
            last_activity_at: at(170),
            participant_ids: strings(&["user-3", "user-4"]),
            concept_tags: strings(&["sorting"]),
        },
    ];

    // Deliberately out of timestamp order; reads must sort.
    let messages = vec![
        message(
            "msg-3",
            "thread-ownership",
            "conv-borrowck",
            "user-1",
            MessageContent::text("That fixed it, thanks!"),
            120,
            Some("msg-2"),
        ),
        message(
            "msg-1",
            "thread-ownership",
            "conv-borrowck",
            "user-1",
            MessageContent::code(
                "for item in &items { items.push(item.clone()); }",
                "rust",
            ),
            90,
            None,
        ),
        message(
            "msg-2",
            "thread-ownership",
            "conv-borrowck",
            "user-2",
            MessageContent::text(
                "You are mutating the vector while iterating over a shared borrow of it.",
            ),
            100,
            Some("msg-1"),
        ),
        message(
            "msg-4",
            "thread-algorithms",
            "conv-quicksort",
            "user-4",
            MessageContent::text("When does quicksort degrade to O(n^2)?"),
            150,
            None,
        ),
        message(
            "msg-5",
            "thread-algorithms",
            "conv-quicksort",
            "user-3",
            MessageContent::text("With a bad pivot on already sorted input."),
            170,
            Some("msg-4"),
        ),
    ];

    let mut members = HashMap::new();
    members.insert(
        "thread-rust".to_string(),
        vec![
            ThreadMember::for_user(&users[1], MemberRole::Expert, at(5)),
            ThreadMember::for_user(&users[2], MemberRole::Moderator, at(6)),
        ],
    );
    members.insert(
        "thread-algorithms".to_string(),
        vec![
            ThreadMember::for_user(&users[2], MemberRole::Expert, at(61)),
            ThreadMember::for_user(&users[3], MemberRole::Member, at(62)),
        ],
    );

    Fixtures {
        users,
        threads,
        conversations,
        messages,
        members,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageType;

    #[test]
    fn test_fixture_references_resolve() {
        let data = fixtures();
        let thread_ids: Vec<&str> = data.threads.iter().map(|t| t.id.as_str()).collect();

        for thread in &data.threads {
            for sub in &thread.sub_thread_ids {
                assert!(thread_ids.contains(&sub.as_str()));
            }
        }
        for conversation in &data.conversations {
            assert!(thread_ids.contains(&conversation.thread_id.as_str()));
        }
        for message in &data.messages {
            let conversation = data
                .conversations
                .iter()
                .find(|c| c.id == message.conversation_id)
                .unwrap();
            assert_eq!(conversation.thread_id, message.thread_id);
        }
    }

    #[test]
    fn test_fixture_message_types_match_content() {
        for message in fixtures().messages {
            assert_eq!(message.message_type, message.content.kind());
        }
        assert!(fixtures()
            .messages
            .iter()
            .any(|m| m.message_type == MessageType::Code));
    }
}
