use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Error;

pub trait Payload: Serialize + DeserializeOwned {
    fn user(&self) -> &str;
}

pub trait Tokener<P: Payload> {
    fn gen_token(&self, payload: &P) -> Result<String, Error>;
    fn verify_token(&self, token: &str) -> Result<P, Error>;
}

pub struct Jwt {
    secret: Vec<u8>,
}

impl Jwt {
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }
}

impl<P> Tokener<P> for Jwt
where
    P: Payload,
{
    fn gen_token(&self, payload: &P) -> Result<String, Error> {
        let header = Header::new(Algorithm::HS256);
        let key = EncodingKey::from_secret(&self.secret);
        let token = encode(&header, payload, &key)?;
        Ok(token)
    }

    fn verify_token(&self, token: &str) -> Result<P, Error> {
        let key = DecodingKey::from_secret(&self.secret);
        let validation = Validation::new(Algorithm::HS256);
        let payload = decode(token, &key, &validation)?;
        Ok(payload.claims)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Deserialize, Serialize)]
    struct Claim {
        user: String,
        exp: i64,
    }

    impl Payload for Claim {
        fn user(&self) -> &str {
            &self.user
        }
    }

    fn future_exp() -> i64 {
        (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp()
    }

    #[test]
    fn test_gen_and_verify_token() {
        let jwt = Jwt::new(vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 0]);
        let claim = Claim {
            user: "b3b5c0e2-0000-0000-0000-000000000000".into(),
            exp: future_exp(),
        };
        let token = jwt.gen_token(&claim).unwrap();
        let c: Claim = jwt.verify_token(&token).unwrap();
        assert_eq!(claim.user, c.user);
    }

    #[test]
    fn test_different_tokens() {
        let jwt = Jwt::new(vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 0]);
        let claim_a = Claim {
            user: "a".into(),
            exp: future_exp(),
        };
        let token_a = jwt.gen_token(&claim_a).unwrap();
        let claim_b = Claim {
            user: "b".into(),
            exp: future_exp(),
        };
        let token_b = jwt.gen_token(&claim_b).unwrap();
        let c_a: Claim = jwt.verify_token(&token_a).unwrap();
        let c_b: Claim = jwt.verify_token(&token_b).unwrap();
        assert_eq!(c_a.user, claim_a.user);
        assert_eq!(c_b.user, claim_b.user);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let jwt = Jwt::new(b"secret".to_vec());
        let claim = Claim {
            user: "a".into(),
            exp: future_exp(),
        };
        let mut token = jwt.gen_token(&claim).unwrap();
        token.push('x');
        assert!(<Jwt as Tokener<Claim>>::verify_token(&jwt, &token).is_err());
    }
}
