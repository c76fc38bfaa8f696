//! Project each provider-specific record into the canonical task-item
//! shape (§4.7). Pure functions: given the same record and mission id,
//! `transform` produces the same task item (the created/updated
//! timestamps excepted, same as the wall-clock stamps in the upstream
//! providers this was modeled on).

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use serde_json::json;
use std::collections::HashMap;

use wizard_core::sync::{TaskItem, TaskItemType, TaskStatus};

use crate::provider::{CalendarEvent, ChatMessage, EmailMessage, Issue};

pub fn calendar_event_to_task_item(event: &CalendarEvent, mission_id: &str) -> TaskItem {
    let now = Utc::now();
    let description = if event.description.is_empty() {
        format!("Calendar event from {}", event.provider)
    } else {
        format!("Calendar event from {}\n\n{}", event.provider, event.description)
    };

    let mut metadata = HashMap::new();
    metadata.insert("external_id".to_string(), json!(event.id));
    metadata.insert("external_provider".to_string(), json!(event.provider));
    metadata.insert("location".to_string(), json!(event.location));
    metadata.insert("is_all_day".to_string(), json!(event.is_all_day));
    metadata.insert("attendees".to_string(), json!(event.attendees));
    metadata.insert("start_time".to_string(), json!(event.start_time));
    metadata.insert("end_time".to_string(), json!(event.end_time));

    TaskItem {
        id: format!("task-{}", event.id),
        item_type: TaskItemType::Task,
        title: event.title.clone(),
        description,
        status: TaskStatus::Todo,
        parent_mission: mission_id.to_string(),
        created_at: now,
        updated_at: now,
        due_date: Some(event.end_time),
        assigned_to: None,
        tags: vec!["calendar_sync".to_string(), event.provider.clone()],
        metadata,
    }
}

pub fn email_message_to_task_item(email: &EmailMessage, mission_id: &str) -> TaskItem {
    let now = Utc::now();
    let body_excerpt: String = email.body.chars().take(1000).collect();

    let mut tags = vec!["email_sync".to_string(), email.provider.clone()];
    tags.extend(email.labels.iter().cloned());

    let mut metadata = HashMap::new();
    metadata.insert("external_id".to_string(), json!(email.message_id));
    metadata.insert("external_provider".to_string(), json!(email.provider));
    metadata.insert("from".to_string(), json!(email.from_addr));
    metadata.insert("to".to_string(), json!(email.to_addrs));
    metadata.insert("thread_id".to_string(), json!(email.thread_id));
    metadata.insert("is_unread".to_string(), json!(email.is_unread));
    metadata.insert("attachments".to_string(), json!(email.attachments));
    metadata.insert("received_at".to_string(), json!(email.timestamp));

    TaskItem {
        id: format!("task-{}", email.message_id),
        item_type: TaskItemType::Task,
        title: email.subject.clone(),
        description: format!("Email from {}\n\n{}", email.from_addr, body_excerpt),
        status: TaskStatus::Todo,
        parent_mission: mission_id.to_string(),
        created_at: now,
        updated_at: now,
        due_date: Some(email.timestamp + Duration::days(1)),
        assigned_to: None,
        tags,
        metadata,
    }
}

/// `todo/backlog/open/new → todo`, `in progress/doing → in-progress`,
/// `done/closed/resolved → done`, `blocked/on hold → blocked`, unknown → todo.
pub fn map_issue_status(issue_status: &str) -> TaskStatus {
    match issue_status.to_lowercase().trim() {
        "todo" | "to do" | "backlog" | "open" | "new" => TaskStatus::Todo,
        "in progress" | "in_progress" | "doing" | "in development" | "developing" => {
            TaskStatus::InProgress
        }
        "done" | "completed" | "closed" | "resolved" => TaskStatus::Done,
        "blocked" | "on hold" | "paused" => TaskStatus::Blocked,
        _ => TaskStatus::Todo,
    }
}

pub fn issue_to_task_item(issue: &Issue, mission_id: &str) -> TaskItem {
    let project_prefix = issue
        .key
        .split('-')
        .next()
        .unwrap_or(&issue.key)
        .to_uppercase();

    let mut metadata = HashMap::new();
    metadata.insert("external_id".to_string(), json!(issue.id));
    metadata.insert("external_provider".to_string(), json!(issue.provider));
    metadata.insert("issue_key".to_string(), json!(issue.key));
    metadata.insert("issue_status".to_string(), json!(issue.status));
    metadata.insert("issue_url".to_string(), json!(issue.url));
    metadata.insert("custom_fields".to_string(), json!(issue.custom_fields));

    TaskItem {
        id: format!("issue-{}", issue.id),
        item_type: TaskItemType::Issue,
        title: format!("[{}] {}", issue.key, issue.title),
        description: issue
            .description
            .clone()
            .unwrap_or_else(|| "No description provided".to_string()),
        status: map_issue_status(&issue.status),
        parent_mission: mission_id.to_string(),
        created_at: issue.created_at,
        updated_at: issue.updated_at,
        due_date: issue.due_date,
        assigned_to: issue.assignee.clone(),
        tags: vec![issue.provider.clone(), project_prefix],
        metadata,
    }
}

/// Slack/chat message formulas (`SlackMessageTransformer` in the original
/// implementation): title truncates to the first 80 characters of the
/// first line, the due date lands on the same calendar day at 17:00, and
/// the reaction count is the sum of each reaction's tally.
pub fn chat_message_to_task_item(message: &ChatMessage, mission_id: &str) -> TaskItem {
    let now = Utc::now();

    let title = if message.text.is_empty() {
        "Chat message".to_string()
    } else {
        let head: String = message.text.chars().take(80).collect();
        head.lines().next().unwrap_or(&head).to_string()
    };

    let description_excerpt: String = message.text.chars().take(500).collect();
    let description = format!("Chat message from <@{}>\n\n{}", message.user_id, description_excerpt);

    let due_date = Utc
        .with_ymd_and_hms(
            message.timestamp.year(),
            message.timestamp.month(),
            message.timestamp.day(),
            17,
            0,
            0,
        )
        .single()
        .unwrap_or(message.timestamp.with_hour(17).unwrap_or(message.timestamp));

    let reaction_count: u32 = message.reactions.values().sum();

    let mut metadata = HashMap::new();
    metadata.insert("external_id".to_string(), json!(message.message_id));
    metadata.insert("external_provider".to_string(), json!("slack"));
    metadata.insert("channel_id".to_string(), json!(message.channel_id));
    metadata.insert("user_id".to_string(), json!(message.user_id));
    metadata.insert("thread_id".to_string(), json!(message.thread_ts));
    metadata.insert("reaction_count".to_string(), json!(reaction_count));
    metadata.insert("attachments".to_string(), json!(message.attachments));

    TaskItem {
        id: format!("task-{}", message.message_id),
        item_type: TaskItemType::Task,
        title,
        description,
        status: TaskStatus::Todo,
        parent_mission: mission_id.to_string(),
        created_at: message.timestamp,
        updated_at: now,
        due_date: Some(due_date),
        assigned_to: None,
        tags: vec!["chat_sync".to_string(), format!("channel-{}", message.channel_id)],
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as StdHashMap;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn calendar_event_formula() {
        let event = CalendarEvent {
            id: "evt-1".into(),
            title: "Standup".into(),
            description: "Daily sync".into(),
            start_time: dt(2026, 7, 26, 9, 0),
            end_time: dt(2026, 7, 26, 9, 30),
            location: Some("Room A".into()),
            attendees: vec!["alice@example.com".into()],
            provider: "google_calendar".into(),
            is_all_day: false,
        };
        let item = calendar_event_to_task_item(&event, "mission-1");
        assert_eq!(item.id, "task-evt-1");
        assert_eq!(item.title, "Standup");
        assert_eq!(item.description, "Calendar event from google_calendar\n\nDaily sync");
        assert_eq!(item.due_date, Some(event.end_time));
        assert!(item.tags.contains(&"calendar_sync".to_string()));
        assert_eq!(item.metadata.get("external_id").unwrap(), "evt-1");
    }

    #[test]
    fn calendar_event_without_description() {
        let event = CalendarEvent {
            id: "evt-2".into(),
            title: "Focus block".into(),
            description: String::new(),
            start_time: dt(2026, 7, 26, 9, 0),
            end_time: dt(2026, 7, 26, 10, 0),
            location: None,
            attendees: vec![],
            provider: "google_calendar".into(),
            is_all_day: false,
        };
        let item = calendar_event_to_task_item(&event, "mission-1");
        assert_eq!(item.description, "Calendar event from google_calendar");
    }

    #[test]
    fn email_message_formula() {
        let email = EmailMessage {
            message_id: "msg-1".into(),
            subject: "Quarterly report".into(),
            from_addr: "boss@example.com".into(),
            to_addrs: vec!["me@example.com".into()],
            body: "Please review.".into(),
            timestamp: dt(2026, 7, 26, 8, 0),
            thread_id: Some("thread-1".into()),
            labels: vec!["important".into()],
            attachments: vec![],
            provider: "gmail".into(),
            is_unread: true,
        };
        let item = email_message_to_task_item(&email, "mission-1");
        assert_eq!(item.id, "task-msg-1");
        assert_eq!(item.title, "Quarterly report");
        assert_eq!(item.description, "Email from boss@example.com\n\nPlease review.");
        assert_eq!(item.due_date, Some(dt(2026, 7, 27, 8, 0)));
        assert!(item.tags.contains(&"important".to_string()));
    }

    #[test]
    fn issue_status_mapping() {
        assert_eq!(map_issue_status("Open"), TaskStatus::Todo);
        assert_eq!(map_issue_status("In Progress"), TaskStatus::InProgress);
        assert_eq!(map_issue_status("Done"), TaskStatus::Done);
        assert_eq!(map_issue_status("On Hold"), TaskStatus::Blocked);
        assert_eq!(map_issue_status("something-else"), TaskStatus::Todo);
    }

    #[test]
    fn issue_formula() {
        let issue = Issue {
            id: "10001".into(),
            key: "ENG-42".into(),
            title: "Fix the flaky test".into(),
            description: None,
            status: "In Progress".into(),
            assignee: Some("dev@example.com".into()),
            created_at: dt(2026, 7, 1, 0, 0),
            updated_at: dt(2026, 7, 26, 0, 0),
            due_date: None,
            url: Some("https://example.atlassian.net/browse/ENG-42".into()),
            provider: "jira".into(),
            custom_fields: StdHashMap::new(),
        };
        let item = issue_to_task_item(&issue, "mission-1");
        assert_eq!(item.id, "issue-10001");
        assert_eq!(item.title, "[ENG-42] Fix the flaky test");
        assert_eq!(item.description, "No description provided");
        assert_eq!(item.status, TaskStatus::InProgress);
        assert_eq!(item.tags, vec!["jira".to_string(), "ENG".to_string()]);
    }

    #[test]
    fn chat_message_formula() {
        let mut reactions = StdHashMap::new();
        reactions.insert("thumbsup".to_string(), 3u32);
        reactions.insert("eyes".to_string(), 2u32);

        let message = ChatMessage {
            message_id: "1234.5678".into(),
            channel_id: "C123".into(),
            user_id: "U456".into(),
            text: "Ship it\nfollow up tomorrow".into(),
            timestamp: dt(2026, 7, 26, 9, 15),
            thread_ts: None,
            attachments: vec![],
            reactions,
        };
        let item = chat_message_to_task_item(&message, "mission-1");
        assert_eq!(item.title, "Ship it");
        assert_eq!(item.due_date, Some(dt(2026, 7, 26, 17, 0)));
        assert_eq!(item.metadata.get("reaction_count").unwrap(), 5);
        assert!(item.tags.contains(&"channel-C123".to_string()));
    }

    #[test]
    fn chat_message_without_text_falls_back_to_default_title() {
        let message = ChatMessage {
            message_id: "1".into(),
            channel_id: "C1".into(),
            user_id: "U1".into(),
            text: String::new(),
            timestamp: dt(2026, 7, 26, 9, 15),
            thread_ts: None,
            attachments: vec![],
            reactions: StdHashMap::new(),
        };
        let item = chat_message_to_task_item(&message, "mission-1");
        assert_eq!(item.title, "Chat message");
    }
}
