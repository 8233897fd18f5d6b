mod common;

use std::sync::Arc;

use engine::{Engine, EngineError, GroupAccess, INVITE_CODE_LEN};

use common::{
    FixedCodes, count_rows, engine_from, engine_with_db, engine_with_file_db, execute,
    group_with_members,
};

#[tokio::test]
async fn creator_becomes_first_admin() {
    let (engine, _db) = engine_with_db().await;

    let group = engine
        .create_group("  Flat 3B ", Some("  rent and bills "), "alice")
        .await
        .unwrap();
    assert_eq!(group.name, "Flat 3B");
    assert_eq!(group.description.as_deref(), Some("rent and bills"));
    assert_eq!(group.created_by, "alice");
    assert_eq!(group.invite_code.len(), INVITE_CODE_LEN);

    let members = engine.list_members(group.id, "alice").await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, "alice");
    assert!(members[0].is_admin);
    assert_eq!(
        engine.group_access(group.id, "alice").await.unwrap(),
        GroupAccess::Admin
    );
}

#[tokio::test]
async fn blank_group_name_is_rejected() {
    let (engine, db) = engine_with_db().await;

    let err = engine.create_group("   ", None, "alice").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidName("group name must not be empty".to_string())
    );
    assert_eq!(count_rows(&db, "groups").await, 0);
}

#[tokio::test]
async fn join_accepts_lowercase_code_and_is_not_admin() {
    let (engine, _db) = engine_with_db().await;
    let group = engine.create_group("Trip", None, "alice").await.unwrap();

    let member = engine
        .join_group(&format!(" {} ", group.invite_code.to_lowercase()), "bob")
        .await
        .unwrap();
    assert_eq!(member.group_id, group.id);
    assert!(!member.is_admin);

    let members = engine.list_members(group.id, "bob").await.unwrap();
    let users: Vec<&str> = members.iter().map(|m| m.user_id.as_str()).collect();
    assert_eq!(users, ["alice", "bob"]);
    assert_eq!(
        engine.group_access(group.id, "bob").await.unwrap(),
        GroupAccess::Member
    );
    assert!(engine.is_member(group.id, "bob").await.unwrap());
}

#[tokio::test]
async fn joining_twice_leaves_membership_unchanged() {
    let (engine, db) = engine_with_db().await;
    let group = group_with_members(&engine, "alice", &["bob"]).await;
    assert_eq!(count_rows(&db, "group_members").await, 2);

    let err = engine
        .join_group(&group.invite_code, "bob")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::DuplicateMembership {
            group_id: group.id.to_string(),
            user_id: "bob".to_string(),
        }
    );

    // The creator is already a member too.
    let err = engine
        .join_group(&group.invite_code, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DuplicateMembership { .. }));

    assert_eq!(count_rows(&db, "group_members").await, 2);
}

#[tokio::test]
async fn join_racing_a_concurrent_insert_is_a_duplicate() {
    let (engine, db) = engine_with_db().await;
    let group = engine.create_group("Flat 3B", None, "alice").await.unwrap();
    // Slips bob's membership in after the pre-check has looked for it.
    execute(
        &db,
        "CREATE TRIGGER sneak_in_bob BEFORE INSERT ON group_members \
         WHEN NEW.user_id = 'bob' AND NEW.id NOT LIKE 'sneaked-%' \
         BEGIN \
             INSERT INTO group_members (id, group_id, user_id, is_admin, joined_at) \
             VALUES ('sneaked-' || NEW.id, NEW.group_id, NEW.user_id, NEW.is_admin, NEW.joined_at); \
         END",
    )
    .await;

    let err = engine
        .join_group(&group.invite_code, "bob")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::DuplicateMembership {
            group_id: group.id.to_string(),
            user_id: "bob".to_string(),
        }
    );
    assert_eq!(count_rows(&db, "group_members").await, 1);
    assert!(!engine.is_member(group.id, "bob").await.unwrap());

    engine.join_group(&group.invite_code, "carol").await.unwrap();
    assert_eq!(count_rows(&db, "group_members").await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_joins_admit_a_single_membership() {
    let (engine, db, path) = engine_with_file_db().await;
    let engine = Arc::new(engine);
    let group = engine.create_group("Flat 3B", None, "alice").await.unwrap();

    for round in 0..5 {
        let user = format!("user-{round}");
        let joins: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                let code = group.invite_code.clone();
                let user = user.clone();
                tokio::spawn(async move { engine.join_group(&code, &user).await })
            })
            .collect();

        let mut joined = 0;
        for join in joins {
            match join.await.unwrap() {
                Ok(member) => {
                    joined += 1;
                    assert_eq!(member.user_id, user);
                }
                Err(err) => assert_eq!(
                    err,
                    EngineError::DuplicateMembership {
                        group_id: group.id.to_string(),
                        user_id: user.clone(),
                    }
                ),
            }
        }
        assert_eq!(joined, 1, "round {round}");
    }
    assert_eq!(count_rows(&db, "group_members").await, 6);

    drop(engine);
    drop(db);
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn unknown_invite_code_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    engine.create_group("Trip", None, "alice").await.unwrap();

    for code in ["ZZZZ9999", "short", "BAD-CODE"] {
        let err = engine.join_group(code, "bob").await.unwrap_err();
        assert_eq!(
            err,
            EngineError::KeyNotFound("invite code not exists".to_string())
        );
    }
}

#[tokio::test]
async fn outsiders_cannot_see_the_group() {
    let (engine, _db) = engine_with_db().await;
    let group = engine.create_group("Trip", None, "alice").await.unwrap();
    let not_member = EngineError::NotMember(group.id.to_string());

    assert_eq!(
        engine.group(group.id, "mallory").await.unwrap_err(),
        not_member
    );
    assert_eq!(
        engine.list_members(group.id, "mallory").await.unwrap_err(),
        not_member
    );
    assert_eq!(
        engine.require_membership(group.id, "mallory").await.unwrap_err(),
        not_member
    );
    assert_eq!(
        engine.group_access(group.id, "mallory").await.unwrap(),
        GroupAccess::None
    );
    assert!(!engine.is_member(group.id, "mallory").await.unwrap());

    let seen = engine.group(group.id, "alice").await.unwrap();
    assert_eq!(seen.id, group.id);
    assert_eq!(seen.invite_code, group.invite_code);
}

#[tokio::test]
async fn taken_invite_code_is_retried() {
    let builder = Engine::builder().invite_codes(FixedCodes::new(&[
        "AAAA1111", "AAAA1111", "BBBB2222",
    ]));
    let (engine, db) = engine_from(builder).await;

    let first = engine.create_group("One", None, "alice").await.unwrap();
    let second = engine.create_group("Two", None, "alice").await.unwrap();

    assert_eq!(first.invite_code, "AAAA1111");
    assert_eq!(second.invite_code, "BBBB2222");
    assert_eq!(count_rows(&db, "groups").await, 2);
    assert_eq!(count_rows(&db, "group_members").await, 2);
}

/// Takes `AAAA1111` from inside the insert, after the pre-check saw it free.
const CLAIM_CODE_ON_INSERT: &str = "CREATE TRIGGER claim_code BEFORE INSERT ON groups \
     WHEN NEW.invite_code = 'AAAA1111' AND NEW.created_by <> 'mallory' \
     BEGIN \
         INSERT INTO groups (id, name, description, invite_code, created_by, created_at) \
         VALUES ('claimed-' || NEW.id, 'Claimed', NULL, NEW.invite_code, 'mallory', NEW.created_at); \
     END";

#[tokio::test]
async fn invite_code_collision_on_insert_is_retried() {
    let builder = Engine::builder().invite_codes(FixedCodes::new(&["AAAA1111", "BBBB2222"]));
    let (engine, db) = engine_from(builder).await;
    execute(&db, CLAIM_CODE_ON_INSERT).await;

    let group = engine.create_group("One", None, "alice").await.unwrap();

    assert_eq!(group.invite_code, "BBBB2222");
    // the failed attempt rolled back, claimed row included
    assert_eq!(count_rows(&db, "groups").await, 1);
    assert_eq!(count_rows(&db, "group_members").await, 1);
    assert!(engine.is_member(group.id, "alice").await.unwrap());
}

#[tokio::test]
async fn invite_code_collisions_on_insert_exhaust_attempts() {
    let builder = Engine::builder()
        .invite_codes(FixedCodes::new(&["AAAA1111"]))
        .max_invite_attempts(2);
    let (engine, db) = engine_from(builder).await;
    execute(&db, CLAIM_CODE_ON_INSERT).await;

    let err = engine.create_group("One", None, "alice").await.unwrap_err();

    assert_eq!(err, EngineError::DuplicateInviteCode(2));
    assert_eq!(count_rows(&db, "groups").await, 0);
    assert_eq!(count_rows(&db, "group_members").await, 0);
}

#[tokio::test]
async fn exhausted_invite_attempts_leave_no_rows() {
    let builder = Engine::builder()
        .invite_codes(FixedCodes::new(&["AAAA1111"]))
        .max_invite_attempts(3);
    let (engine, db) = engine_from(builder).await;

    engine.create_group("One", None, "alice").await.unwrap();
    let err = engine.create_group("Two", None, "bob").await.unwrap_err();

    assert_eq!(err, EngineError::DuplicateInviteCode(3));
    assert_eq!(count_rows(&db, "groups").await, 1);
    assert_eq!(count_rows(&db, "group_members").await, 1);
}

#[tokio::test]
async fn user_groups_lists_only_memberships() {
    let (engine, _db) = engine_with_db().await;
    let flat = engine.create_group("Flat", None, "alice").await.unwrap();
    let trip = engine.create_group("Trip", None, "alice").await.unwrap();
    engine.join_group(&trip.invite_code, "bob").await.unwrap();

    let alice: Vec<_> = engine
        .list_user_groups("alice")
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.id)
        .collect();
    assert_eq!(alice, [flat.id, trip.id]);

    let bob = engine.list_user_groups("bob").await.unwrap();
    assert_eq!(bob.len(), 1);
    assert_eq!(bob[0].id, trip.id);

    assert!(engine.list_user_groups("mallory").await.unwrap().is_empty());
}
