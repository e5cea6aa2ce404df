use std::future::{ready, Ready};

use actix_web::HttpMessage;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct UserInfo {
    pub id: Uuid,
}

impl actix_web::FromRequest for UserInfo {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        if let Some(user) = req.extensions().get::<Self>() {
            ready(Ok(*user))
        } else {
            ready(Err(actix_web::error::ErrorUnauthorized("")))
        }
    }
}
