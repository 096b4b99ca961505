use super::context::*;
use super::handler::*;
use super::strategy::LoginRequest;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn routes(
    handler: Arc<AuthHandler>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let login = warp::path!("auth" / "login")
        .and(warp::post())
        .and(json_body::<LoginRequest>())
        .and(with(handler.clone()))
        .and_then(|body: LoginRequest, handler: Arc<AuthHandler>| async move {
            handler.login(body).await.map_err(reject::custom)
        });

    let refresh = warp::path!("auth" / "refresh")
        .and(warp::post())
        .and(with_context())
        .and(with(handler.clone()))
        .and_then(|ctx: RequestContext, handler: Arc<AuthHandler>| async move {
            handler.refresh(ctx).await.map_err(reject::custom)
        });

    let logout = warp::path!("auth" / "logout")
        .and(warp::post())
        .and(with_context())
        .and(with(handler.clone()))
        .and_then(|ctx: RequestContext, handler: Arc<AuthHandler>| async move {
            handler.logout(ctx).await.map_err(reject::custom)
        });

    let logout_all = warp::path!("auth" / "logout-all")
        .and(warp::post())
        .and(with_context())
        .and(with(handler.clone()))
        .and_then(|ctx: RequestContext, handler: Arc<AuthHandler>| async move {
            handler.logout_all(ctx).await.map_err(reject::custom)
        });

    let register = warp::path!("users")
        .and(warp::post())
        .and(json_body::<RegisterRequest>())
        .and(with(handler.clone()))
        .and_then(|body: RegisterRequest, handler: Arc<AuthHandler>| async move {
            handler.register(body).await.map_err(reject::custom)
        });

    let me = warp::path!("users" / "me")
        .and(warp::get())
        .and(with_context())
        .and(with(handler.clone()))
        .and_then(|ctx: RequestContext, handler: Arc<AuthHandler>| async move {
            handler.me(ctx).await.map_err(reject::custom)
        });

    let delete_me = warp::path!("users" / "me")
        .and(warp::delete())
        .and(with_context())
        .and(with(handler))
        .and_then(|ctx: RequestContext, handler: Arc<AuthHandler>| async move {
            handler.delete_me(ctx).await.map_err(reject::custom)
        });

    login
        .or(refresh)
        .unify()
        .or(logout)
        .unify()
        .or(logout_all)
        .unify()
        .or(register)
        .unify()
        .or(me)
        .unify()
        .or(delete_me)
        .unify()
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn with_context() -> impl Filter<Extract = (RequestContext,), Error = Infallible> + Clone {
    warp::header::headers_cloned().map(|headers: http::HeaderMap| {
        RequestContext::from_header_map(&headers)
    })
}
