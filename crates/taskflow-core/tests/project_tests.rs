//! Project, membership, issue and inbox tests

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use taskflow_core::prelude::*;
use taskflow_core::{
    ErrorKind, IssueDraft, IssueFilter, IssuePatch, IssueStatus, ProjectPatch, ProjectStatus,
    ISSUE_NOTIFICATION_EVENT,
};
use std::sync::Arc;
use taskflow_test_utils::{
    actor, project_draft, seed_user, task_draft, FaultyStore, Harness, RecordingPublisher,
};

#[tokio::test]
async fn project_round_trip_preserves_fields() {
    let h = Harness::new().await;
    let created = h
        .services
        .projects
        .create_project(project_draft("Apollo"), &actor(&h.manager))
        .await
        .unwrap();
    let fetched = h.services.projects.get_project(created.id).await.unwrap();

    assert_eq!(fetched, created);
    assert_eq!(fetched.created_by, h.manager.id);
    assert_eq!(fetched.status, ProjectStatus::NotStarted);
    assert!(fetched.members.is_empty());
}

#[tokio::test]
async fn project_update_and_delete() {
    let h = Harness::new().await;
    let manager = actor(&h.manager);
    let project = h.project().await;

    let renamed = h
        .services
        .projects
        .update_project(
            project.id,
            ProjectPatch {
                name: Some("Relaunch".to_string()),
                ..ProjectPatch::default()
            },
            &manager,
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Relaunch");

    h.services
        .projects
        .delete_project(project.id, &manager)
        .await
        .unwrap();
    let err = h.services.projects.get_project(project.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(h.services.projects.list_projects().await.unwrap().is_empty());
}

#[tokio::test]
async fn add_member_twice_conflicts() {
    let h = Harness::new().await;
    let project = h.project().await;

    let updated = h
        .services
        .membership
        .add_member(project.id, Some(h.member.id))
        .await
        .unwrap();
    assert!(updated.members.contains(&h.member.id));

    let err = h
        .services
        .membership
        .add_member(project.id, Some(h.member.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.to_string(), "User is already a member");

    let stored = h.services.projects.get_project(project.id).await.unwrap();
    assert_eq!(stored.members.len(), 1);
}

#[tokio::test]
async fn add_unknown_user_or_project_is_not_found() {
    let h = Harness::new().await;
    let project = h.project().await;

    let err = h
        .services
        .membership
        .add_member(project.id, Some(UserId::new()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = h
        .services
        .membership
        .add_member(ProjectId::new(), Some(h.member.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = h
        .services
        .membership
        .add_member(project.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn remove_non_member_is_a_no_op() {
    let h = Harness::new().await;
    let project = h.project().await;

    let unchanged = h
        .services
        .membership
        .remove_member(project.id, Some(h.outsider.id))
        .await
        .unwrap();
    assert_eq!(unchanged.version, project.version);

    h.services
        .membership
        .add_member(project.id, Some(h.member.id))
        .await
        .unwrap();
    let after = h
        .services
        .membership
        .remove_member(project.id, Some(h.member.id))
        .await
        .unwrap();
    assert!(after.members.is_empty());
}

#[tokio::test]
async fn list_members_returns_display_fields() {
    let h = Harness::new().await;
    let project = h.project().await;
    for user in [&h.member, &h.outsider] {
        h.services
            .membership
            .add_member(project.id, Some(user.id))
            .await
            .unwrap();
    }

    let members = h.services.membership.list_members(project.id).await.unwrap();
    let mut names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["Otto Outsider", "Uma User"]);
}

#[tokio::test]
async fn issue_lifecycle_notifies_the_task_assignee() {
    let h = Harness::new().await;
    let project = h.project().await;
    let task = h.assigned_task(&project).await;
    let reporter = actor(&h.outsider);

    let issue = h
        .services
        .issues
        .create_issue(
            IssueDraft {
                title: Some("Typos".to_string()),
                description: Some("Chapter 2".to_string()),
                task: Some(task.id),
                priority: None,
            },
            &reporter,
        )
        .await
        .unwrap();
    assert_eq!(issue.status, IssueStatus::Open);
    assert_eq!(issue.reported_by, h.outsider.id);

    h.services
        .issues
        .update_issue(
            issue.id,
            IssuePatch {
                status: Some(IssueStatus::Resolved),
                ..IssuePatch::default()
            },
            &reporter,
        )
        .await
        .unwrap();

    let pushed = h.publisher.published_to(h.member.id);
    let events: Vec<_> = pushed.iter().map(|p| p.event.as_str()).collect();
    assert_eq!(
        events,
        vec!["receiveNotification", ISSUE_NOTIFICATION_EVENT, ISSUE_NOTIFICATION_EVENT]
    );

    let inbox = h.services.inbox.list(&actor(&h.member)).await.unwrap();
    let messages: Vec<_> = inbox.iter().map(|n| n.message.as_str()).collect();
    assert!(messages.contains(&"A new issue has been reported for the task: Write docs"));
    assert!(messages.contains(&"An issue has been updated for the task: Write docs"));
    assert!(inbox.iter().all(|n| n.link == task.link()));
}

#[tokio::test]
async fn issue_update_survives_a_failed_task_lookup() {
    let store = Arc::new(FaultyStore::new());
    let publisher = Arc::new(RecordingPublisher::new());
    let services = Services::new(store.clone(), publisher.clone(), WorkflowConfig::new());
    let manager = actor(&seed_user(store.as_ref(), "Mia Manager", Role::Manager).await);
    let member = seed_user(store.as_ref(), "Uma User", Role::User).await;
    let project = services
        .projects
        .create_project(project_draft("Launch"), &manager)
        .await
        .unwrap();
    let task = services
        .tasks
        .create_task(task_draft("Write docs", &project, Some(member.id)), &manager)
        .await
        .unwrap();
    let issue = services
        .issues
        .create_issue(
            IssueDraft {
                title: Some("Typos".to_string()),
                description: Some("Chapter 2".to_string()),
                task: Some(task.id),
                priority: None,
            },
            &manager,
        )
        .await
        .unwrap();
    let pushed_before = publisher.published().len();

    store.fail_task_reads(true);
    let updated = services
        .issues
        .update_issue(
            issue.id,
            IssuePatch {
                status: Some(IssueStatus::Resolved),
                ..IssuePatch::default()
            },
            &manager,
        )
        .await
        .unwrap();

    assert_eq!(updated.status, IssueStatus::Resolved);
    assert_eq!(services.issues.get_issue(issue.id).await.unwrap().status, IssueStatus::Resolved);
    assert_eq!(publisher.published().len(), pushed_before);
}

#[tokio::test]
async fn issue_on_unassigned_task_is_silent() {
    let h = Harness::new().await;
    let project = h.project().await;
    let task = h
        .services
        .tasks
        .create_task(task_draft("Loose end", &project, None), &actor(&h.manager))
        .await
        .unwrap();

    h.services
        .issues
        .create_issue(
            IssueDraft {
                title: Some("Unclear".to_string()),
                description: Some("Needs owner".to_string()),
                task: Some(task.id),
                priority: None,
            },
            &actor(&h.manager),
        )
        .await
        .unwrap();

    assert!(h.publisher.published().is_empty());
    let open = h
        .services
        .issues
        .list_issues(IssueFilter {
            task: Some(task.id),
            ..IssueFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(open.len(), 1);
}

#[tokio::test]
async fn inbox_is_private_and_mark_read_is_idempotent() {
    let h = Harness::new().await;
    let project = h.project().await;
    h.assigned_task(&project).await;
    let member = actor(&h.member);

    let notification = h.services.inbox.list(&member).await.unwrap().remove(0);

    let err = h
        .services
        .inbox
        .mark_as_read(notification.id, &actor(&h.outsider))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    for _ in 0..2 {
        let read = h
            .services
            .inbox
            .mark_as_read(notification.id, &member)
            .await
            .unwrap();
        assert!(read.read);
    }

    h.services.inbox.delete(notification.id, &member).await.unwrap();
    assert!(h.services.inbox.list(&member).await.unwrap().is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn membership_is_a_set(ops in proptest::collection::vec((0usize..3, any::<bool>()), 1..12)) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        rt.block_on(async {
            let h = Harness::new().await;
            let project = h.project().await;
            let extra = seed_user(h.store.as_ref(), "Extra Person", Role::User).await;
            let users = [h.member.id, h.outsider.id, extra.id];
            let mut expected = std::collections::BTreeSet::new();

            for (idx, add) in ops {
                let user = users[idx];
                if add {
                    let result = h.services.membership.add_member(project.id, Some(user)).await;
                    if expected.insert(user) {
                        prop_assert!(result.is_ok());
                    } else {
                        prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::Conflict);
                    }
                } else {
                    h.services
                        .membership
                        .remove_member(project.id, Some(user))
                        .await
                        .unwrap();
                    expected.remove(&user);
                }
            }

            let stored = h.services.projects.get_project(project.id).await.unwrap();
            prop_assert_eq!(stored.members, expected);
            Ok(())
        })?;
    }
}
