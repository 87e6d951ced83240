//! Module used to serve the routes of the API. Each submodule is specific for a route segment.

use actix_web::{
    Scope,
    body::BoxBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web::{self, JsonConfig},
};
use profiles_lib::verify::UserVerifyProvider;

use self::users::users_scope;

pub mod users;

pub fn api_route<V>() -> Scope<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<BoxBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
>
where
    V: UserVerifyProvider + 'static,
{
    let json_config = JsonConfig::default().limit(1024 * 16);

    web::scope("/api")
        .app_data(json_config)
        .service(users_scope::<V>())
}
