use entity::{maps, users};
use profiles_lib::{
    error::ProfilesError,
    link::{self, LinkEngine, LinkResult},
    session::UserSession,
    verify::NotVerified,
};
use sea_orm::{
    ColumnTrait as _, ConnectionTrait as _, EntityTrait as _, PaginatorTrait as _,
    QueryFilter as _,
};


use base::{FixedVerifier, MapSpec};

async fn maps_of(conn: &sea_orm::DbConn, user_id: i32) -> anyhow::Result<u64> {
    let count = maps::Entity::find()
        .filter(maps::Column::Uploader.eq(user_id))
        .count(conn)
        .await?;
    Ok(count)
}

#[tokio::test]
async fn resolve_raw_hash() -> anyhow::Result<()> {
    test_env::wrap(async |db| {
        let hash = test_env::gen_hash();
        let candidates = link::resolve_candidates(&db.sql_conn, Some(&hash)).await?;
        assert_eq!(candidates, [hash]);
        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn resolve_nothing() -> anyhow::Result<()> {
    test_env::wrap(async |db| {
        let candidates = link::resolve_candidates(&db.sql_conn, None).await?;
        assert!(candidates.is_empty());
        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn resolve_username() -> anyhow::Result<()> {
    test_env::wrap(async |db| {
        let conn = &db.sql_conn;
        let h1 = test_env::gen_hash();
        let h2 = test_env::gen_hash();
        base::insert_user(conn, "bob", Some(&h1), Some("bob@example.com")).await?;
        base::insert_user(conn, "bob", Some(&h2), None).await?;
        base::insert_user(conn, "bob", None, None).await?;
        base::insert_user(conn, "alice", Some(&test_env::gen_hash()), None).await?;

        let mut candidates = link::resolve_candidates(conn, Some("bob")).await?;
        candidates.sort();
        let mut expected = vec![h1, h2];
        expected.sort();
        assert_eq!(candidates, expected);

        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn resolve_hash_shaped_name() -> anyhow::Result<()> {
    test_env::wrap(async |db| {
        let conn = &db.sql_conn;
        let hash = test_env::gen_hash();
        // 24 chars, but doesn't start with a 5
        let name = "xAbCdEfGhIjKlMnOpQrStUvW";
        base::insert_user(conn, name, Some(&hash), None).await?;

        let candidates = link::resolve_candidates(conn, Some(name)).await?;
        assert_eq!(candidates, [hash]);

        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn link_raw_hash() -> anyhow::Result<()> {
    test_env::wrap(async |db| {
        let conn = &db.sql_conn;
        let hash = "5AbCdEfGhIjKlMnOpQrStUvW";
        let user_id = base::insert_user(conn, "user", None, None).await?;

        let engine = LinkEngine::new(FixedVerifier::default().with(user_id, hash));
        let mut session = UserSession::new(user_id);

        let res = engine.link(conn, &mut session, Some(hash)).await?;
        assert_eq!(
            res,
            LinkResult {
                hash: Some(hash.to_owned()),
                linked: true,
            }
        );
        assert_eq!(session.hash.as_deref(), Some(hash));
        assert_eq!(base::user_hash(conn, user_id).await?.as_deref(), Some(hash));

        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn link_is_idempotent() -> anyhow::Result<()> {
    test_env::wrap(async |db| {
        let conn = &db.sql_conn;
        let hash = test_env::gen_hash();
        let user_id = base::insert_user(conn, "user", None, None).await?;

        let engine = LinkEngine::new(FixedVerifier::default().with(user_id, &hash));
        let mut session = UserSession::new(user_id);

        let first = engine.link(conn, &mut session, Some(&hash)).await?;
        let second = engine.link(conn, &mut session, Some(&hash)).await?;
        assert!(first.linked);
        assert_eq!(first, second);

        // Once linked, the requested identity is ignored
        let other = engine
            .link(conn, &mut session, Some(&test_env::gen_hash()))
            .await?;
        assert_eq!(other, first);
        assert_eq!(base::user_hash(conn, user_id).await?, Some(hash));

        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn link_without_provider() -> anyhow::Result<()> {
    test_env::wrap(async |db| {
        let conn = &db.sql_conn;
        let hash = test_env::gen_hash();
        let user_id = base::insert_user(conn, "user", None, None).await?;

        let engine = LinkEngine::new(NotVerified);
        let mut session = UserSession::new(user_id);

        let res = engine.link(conn, &mut session, Some(&hash)).await?;
        assert_eq!(
            res,
            LinkResult {
                hash: None,
                linked: false,
            }
        );
        assert_eq!(session.hash, None);
        assert_eq!(base::user_hash(conn, user_id).await?, None);

        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn link_without_candidate() -> anyhow::Result<()> {
    test_env::wrap(async |db| {
        let conn = &db.sql_conn;
        let hash = test_env::gen_hash();
        let user_id = base::insert_user(conn, "user", None, None).await?;

        let engine = LinkEngine::new(FixedVerifier::default().with(user_id, &hash));
        let mut session = UserSession::new(user_id);

        let res = engine.link(conn, &mut session, None).await?;
        // The identity hash is only informational
        assert_eq!(
            res,
            LinkResult {
                hash: Some(hash),
                linked: false,
            }
        );
        assert_eq!(base::user_hash(conn, user_id).await?, None);

        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn link_transfers_maps() -> anyhow::Result<()> {
    test_env::wrap(async |db| {
        let conn = &db.sql_conn;
        let hash = test_env::gen_hash();
        let previous_id = base::insert_user(conn, "old", Some(&hash), None).await?;
        let user_id = base::insert_user(conn, "new", None, None).await?;
        let bystander_id = base::insert_user(conn, "bystander", None, None).await?;

        base::insert_map(conn, previous_id, "a", MapSpec::default()).await?;
        base::insert_map(
            conn,
            previous_id,
            "b",
            MapSpec {
                deleted: true,
                ..Default::default()
            },
        )
        .await?;
        base::insert_map(conn, bystander_id, "c", MapSpec::default()).await?;

        let engine = LinkEngine::new(FixedVerifier::default().with(user_id, &hash));
        let mut session = UserSession::new(user_id);

        let res = engine.link(conn, &mut session, Some(&hash)).await?;
        assert!(res.linked);
        assert_eq!(res.hash.as_ref(), Some(&hash));

        assert_eq!(base::user_hash(conn, user_id).await?, Some(hash));
        assert_eq!(base::user_hash(conn, previous_id).await?, None);
        assert_eq!(maps_of(conn, user_id).await?, 2);
        assert_eq!(maps_of(conn, previous_id).await?, 0);
        assert_eq!(maps_of(conn, bystander_id).await?, 1);

        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn email_bound_holder_is_kept() -> anyhow::Result<()> {
    test_env::wrap(async |db| {
        let conn = &db.sql_conn;
        let hash = test_env::gen_hash();
        let holder_id =
            base::insert_user(conn, "holder", Some(&hash), Some("holder@example.com")).await?;
        let user_id = base::insert_user(conn, "user", None, None).await?;
        base::insert_map(conn, holder_id, "a", MapSpec::default()).await?;

        let engine = LinkEngine::new(FixedVerifier::default().with(user_id, &hash));
        let mut session = UserSession::new(user_id);

        let res = engine.link(conn, &mut session, Some(&hash)).await?;
        assert_eq!(
            res,
            LinkResult {
                hash: Some(hash.clone()),
                linked: false,
            }
        );
        assert_eq!(session.hash, None);

        assert_eq!(base::user_hash(conn, holder_id).await?, Some(hash));
        assert_eq!(base::user_hash(conn, user_id).await?, None);
        assert_eq!(maps_of(conn, holder_id).await?, 1);
        assert_eq!(maps_of(conn, user_id).await?, 0);

        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn link_by_username() -> anyhow::Result<()> {
    test_env::wrap(async |db| {
        let conn = &db.sql_conn;
        let h1 = test_env::gen_hash();
        let h2 = test_env::gen_hash();
        let bob1 = base::insert_user(conn, "bob", Some(&h1), Some("bob@example.com")).await?;
        let bob2 = base::insert_user(conn, "bob", Some(&h2), None).await?;
        let user_id = base::insert_user(conn, "user", None, None).await?;
        base::insert_map(conn, bob1, "a", MapSpec::default()).await?;
        base::insert_map(conn, bob2, "b", MapSpec::default()).await?;
        base::insert_map(conn, bob2, "c", MapSpec::default()).await?;

        let engine = LinkEngine::new(FixedVerifier::default().with(user_id, &h2));
        let mut session = UserSession::new(user_id);

        let res = engine.link(conn, &mut session, Some("bob")).await?;
        assert_eq!(
            res,
            LinkResult {
                hash: Some(h2.clone()),
                linked: true,
            }
        );
        assert_eq!(session.hash.as_ref(), Some(&h2));

        assert_eq!(base::user_hash(conn, bob1).await?, Some(h1));
        assert_eq!(base::user_hash(conn, bob2).await?, None);
        assert_eq!(maps_of(conn, bob1).await?, 1);
        assert_eq!(maps_of(conn, user_id).await?, 2);

        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn concurrent_links_same_hash() -> anyhow::Result<()> {
    test_env::wrap(async |db| {
        let conn = &db.sql_conn;
        let hash = test_env::gen_hash();
        let previous_id = base::insert_user(conn, "old", Some(&hash), None).await?;
        let a = base::insert_user(conn, "a", None, None).await?;
        let b = base::insert_user(conn, "b", None, None).await?;
        for name in ["x", "y", "z"] {
            base::insert_map(conn, previous_id, name, MapSpec::default()).await?;
        }

        // Only `a` really owns the identity
        let engine = LinkEngine::new(
            FixedVerifier::default()
                .with(a, &hash)
                .with(b, &test_env::gen_hash()),
        );
        let mut session_a = UserSession::new(a);
        let mut session_b = UserSession::new(b);

        // The test pool has a single connection, so the transactions run one after the other
        // in an unspecified order. The race itself is covered by `hash_assigned_concurrently`.
        let (res_a, res_b) = tokio::join!(
            engine.link(conn, &mut session_a, Some(&hash)),
            engine.link(conn, &mut session_b, Some(&hash)),
        );
        let (res_a, res_b) = (res_a?, res_b?);

        assert!(res_a.linked);
        assert!(!res_b.linked);

        let holders = users::Entity::find()
            .filter(users::Column::Hash.eq(hash.as_str()))
            .count(conn)
            .await?;
        assert_eq!(holders, 1);
        assert_eq!(base::user_hash(conn, a).await?, Some(hash));
        assert_eq!(maps_of(conn, a).await?, 3);
        assert_eq!(maps_of(conn, b).await?, 0);
        assert_eq!(maps_of(conn, previous_id).await?, 0);

        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn concurrent_links_never_share_hash() -> anyhow::Result<()> {
    test_env::wrap(async |db| {
        let conn = &db.sql_conn;
        let hash = test_env::gen_hash();
        let previous_id = base::insert_user(conn, "old", Some(&hash), None).await?;
        let a = base::insert_user(conn, "a", None, None).await?;
        let b = base::insert_user(conn, "b", None, None).await?;
        for name in ["x", "y"] {
            base::insert_map(conn, previous_id, name, MapSpec::default()).await?;
        }

        // The provider confirms the identity for both users
        let engine = LinkEngine::new(FixedVerifier::default().with(a, &hash).with(b, &hash));
        let mut session_a = UserSession::new(a);
        let mut session_b = UserSession::new(b);

        let (res_a, res_b) = tokio::join!(
            engine.link(conn, &mut session_a, Some(&hash)),
            engine.link(conn, &mut session_b, Some(&hash)),
        );
        res_a?;
        res_b?;

        let holders = users::Entity::find()
            .filter(users::Column::Hash.eq(hash.as_str()))
            .all(conn)
            .await?;
        assert_eq!(holders.len(), 1);

        // The maps followed the hash
        let holder_id = holders[0].id;
        assert_eq!(maps_of(conn, holder_id).await?, 2);

        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn hash_assigned_concurrently() -> anyhow::Result<()> {
    test_env::wrap(async |db| {
        let conn = &db.sql_conn;
        let hash = test_env::gen_hash();
        let user_id = base::insert_user(conn, "user", None, None).await?;
        let other = base::insert_user(conn, "other", None, None).await?;

        // Another link attempt assigns the hash right before ours
        conn.execute_unprepared(
            "CREATE TRIGGER link_race BEFORE UPDATE OF hash ON users \
            WHEN NEW.hash IS NOT NULL AND OLD.hash IS NULL \
            BEGIN UPDATE users SET hash = NEW.hash WHERE name = 'other'; END",
        )
        .await?;

        let res = link::apply_link(conn, user_id, Some(&hash), Some(hash.clone())).await?;
        assert_eq!(
            res,
            LinkResult {
                hash: Some(hash.clone()),
                linked: false,
            }
        );

        // The whole transaction was rolled back
        assert_eq!(base::user_hash(conn, user_id).await?, None);
        assert_eq!(base::user_hash(conn, other).await?, None);

        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn failed_transfer_rolls_back() -> anyhow::Result<()> {
    test_env::wrap(async |db| {
        let conn = &db.sql_conn;
        let hash = test_env::gen_hash();
        let previous_id = base::insert_user(conn, "old", Some(&hash), None).await?;
        let user_id = base::insert_user(conn, "new", None, None).await?;
        for name in ["x", "y"] {
            base::insert_map(conn, previous_id, name, MapSpec::default()).await?;
        }

        conn.execute_unprepared(
            "CREATE TRIGGER refuse_transfer BEFORE UPDATE OF uploader ON maps \
            BEGIN SELECT RAISE(ABORT, 'transfer refused'); END",
        )
        .await?;

        let res = link::apply_link(conn, user_id, Some(&hash), None).await;
        assert!(
            matches!(res, Err(ProfilesError::DbError(_))),
            "unexpected result: {res:?}"
        );

        assert_eq!(base::user_hash(conn, previous_id).await?, Some(hash));
        assert_eq!(base::user_hash(conn, user_id).await?, None);
        assert_eq!(maps_of(conn, previous_id).await?, 2);
        assert_eq!(maps_of(conn, user_id).await?, 0);

        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn verify_discards_unknown_match() -> anyhow::Result<()> {
    let engine = LinkEngine::new(FixedVerifier::default());
    let candidates = vec![test_env::gen_hash()];

    // The expected identity isn't a candidate
    let matched = engine
        .verify(&candidates, Some(&test_env::gen_hash()))
        .await?;
    assert_eq!(matched, None);

    let matched = engine.verify(&candidates, Some(&candidates[0])).await?;
    assert_eq!(matched.as_ref(), Some(&candidates[0]));

    let matched = engine.verify(&[], Some(&candidates[0])).await?;
    assert_eq!(matched, None);

    Ok(())
}

#[tokio::test]
async fn apply_link_unknown_user() -> anyhow::Result<()> {
    test_env::wrap(async |db| {
        let hash = "5AbCdEfGhIjKlMnOpQrStUvW";
        let res = link::apply_link(&db.sql_conn, 42, Some(hash), None).await;
        assert!(matches!(res, Err(ProfilesError::UserNotFound(42))));
        anyhow::Ok(())
    })
    .await
}

#[tokio::test]
async fn link_status() -> anyhow::Result<()> {
    let hash = test_env::gen_hash();
    let engine = LinkEngine::new(FixedVerifier::default().with(1, &hash));

    let mut session = UserSession::new(1);
    let status = engine.link_status(&session).await?;
    assert_eq!(
        status,
        LinkResult {
            hash: Some(hash.clone()),
            linked: false,
        }
    );

    session.hash = Some(hash.clone());
    let status = engine.link_status(&session).await?;
    assert!(status.linked);

    Ok(())
}

#[tokio::test]
async fn lookup_by_hash() -> anyhow::Result<()> {
    test_env::wrap(async |db| {
        let conn = &db.sql_conn;
        let hash = test_env::gen_hash();
        let user_id = base::insert_user(conn, "user", Some(&hash), None).await?;

        let user = link::lookup_by_hash(conn, &hash).await?;
        assert_eq!(user.map(|u| u.id), Some(user_id));

        let user = link::lookup_by_hash(conn, &test_env::gen_hash()).await?;
        assert!(user.is_none());

        anyhow::Ok(())
    })
    .await
}
