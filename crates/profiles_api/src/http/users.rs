//! The `/api/users` routes: the profiles, the alert feed and the account linking.

use actix_session::Session;
use actix_web::{
    Responder, Scope,
    web::{self, Data, Path, Query},
};
use profiles_lib::{
    Database, alerts,
    link::{LinkEngine, LinkResult},
    profile,
    verify::UserVerifyProvider,
};
use serde::Deserialize;
use tracing_actix_web::RequestId;

use crate::{
    ApiResponse, ApiResult, FitRequestId as _, auth,
    utils::{json, public_json},
};

pub fn users_scope<V>() -> Scope
where
    V: UserVerifyProvider + 'static,
{
    web::scope("/users")
        .route("/me", web::get().to(me))
        .route("/id/{id}", web::get().to(by_id))
        .route("/id/{id}/stats", web::get().to(by_id_with_stats))
        .route("/find/{hash}", web::get().to(find))
        .route("/alerts", web::get().to(alerts))
        .route("/beatsaver", web::get().to(link_status::<V>))
        .route("/beatsaver", web::post().to(link::<V>))
        .route("/beatsaver/{hash}", web::post().to(link_with::<V>))
}

async fn me(
    req_id: RequestId,
    session: Session,
    db: Data<Database>,
) -> ApiResponse<impl Responder> {
    let user = auth::require_user(&session).fit(req_id)?;
    let detail = profile::get_self(&db.sql_conn, user.user_id)
        .await
        .fit(req_id)?;
    json(detail)
}

async fn by_id(
    req_id: RequestId,
    db: Data<Database>,
    id: Path<i32>,
) -> ApiResponse<impl Responder> {
    let detail = profile::get_by_id(&db.sql_conn, id.into_inner(), false)
        .await
        .fit(req_id)?;
    public_json(detail)
}

async fn by_id_with_stats(
    req_id: RequestId,
    db: Data<Database>,
    id: Path<i32>,
) -> ApiResponse<impl Responder> {
    let detail = profile::get_by_id(&db.sql_conn, id.into_inner(), true)
        .await
        .fit(req_id)?;
    public_json(detail)
}

async fn find(
    req_id: RequestId,
    db: Data<Database>,
    hash: Path<String>,
) -> ApiResponse<impl Responder> {
    let detail = profile::get_by_hash(&db.sql_conn, &hash)
        .await
        .fit(req_id)?;
    json(detail)
}

#[derive(Deserialize)]
struct AlertsQuery {
    limit: Option<u64>,
}

async fn alerts(
    req_id: RequestId,
    session: Session,
    db: Data<Database>,
    Query(AlertsQuery { limit }): Query<AlertsQuery>,
) -> ApiResponse<impl Responder> {
    let user = auth::require_user(&session).fit(req_id)?;
    let alerts = alerts::list_alerts(&db.sql_conn, user.user_id, limit)
        .await
        .fit(req_id)?;
    json(alerts)
}

async fn link_status<V: UserVerifyProvider>(
    req_id: RequestId,
    session: Session,
    engine: Data<LinkEngine<V>>,
) -> ApiResponse<impl Responder> {
    let user = auth::require_user(&session).fit(req_id)?;
    let status = engine.link_status(&user).await.fit(req_id)?;
    json(status)
}

async fn do_link<V: UserVerifyProvider>(
    session: &Session,
    db: &Database,
    engine: &LinkEngine<V>,
    requested: Option<&str>,
) -> ApiResult<LinkResult> {
    let mut user = auth::require_user(session)?;
    let res = engine.link(&db.sql_conn, &mut user, requested).await?;

    // The session is only updated once the link is committed
    if res.linked {
        auth::store_user(session, &user)?;
    }

    Ok(res)
}

async fn link<V: UserVerifyProvider>(
    req_id: RequestId,
    session: Session,
    db: Data<Database>,
    engine: Data<LinkEngine<V>>,
) -> ApiResponse<impl Responder> {
    let res = do_link(&session, &db, &engine, None).await.fit(req_id)?;
    json(res)
}

async fn link_with<V: UserVerifyProvider>(
    req_id: RequestId,
    session: Session,
    db: Data<Database>,
    engine: Data<LinkEngine<V>>,
    hash: Path<String>,
) -> ApiResponse<impl Responder> {
    let res = do_link(&session, &db, &engine, Some(&hash))
        .await
        .fit(req_id)?;
    json(res)
}
