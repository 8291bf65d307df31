#![allow(dead_code)]

pub mod rsa {
    pub const TEST_KEY_ID: &str = "kid-1";

    pub const JWK: &str = r#"{
        "alg": "RS256",
        "e": "AQAB",
        "kid": "kid-1",
        "kty": "RSA",
        "n": "3sFyNk7yAEPg0GxQKRl2YfEnz6BN3zeL5ypmufPPOqyeTfVhBGE_3neicQOdJb0WlvaUK3JHMO_BIAwHIYztFYrEVkPsEZQwek6KX6y82QpBsgCjAV56rBWSOrCeGBqKNrd_Pluogkpo3mi2uUrHs8_gJOZbN19EvXQ6c6rdxtUqwAryQJFsDAAYH5_MI4gdVKiRE7eNhxX6H9cPzaR3Cru7wNM_RROvs-iZuO2KU46_lgGprdxtUl0kYOuuqdNlvhrsplvAR7xp4_Te5HwKpAYGX3KqFCFzaLiQIbI4lXxf2lQSfvE7dqai6TcmhNVICJrxx5TnpglFbK53luFi3w",
        "use": "sig"
    }"#;

    pub const JWK_MINIMAL: &str = r#"{
        "kty": "RSA",
        "e": "AQAB",
        "n": "3sFyNk7yAEPg0GxQKRl2YfEnz6BN3zeL5ypmufPPOqyeTfVhBGE_3neicQOdJb0WlvaUK3JHMO_BIAwHIYztFYrEVkPsEZQwek6KX6y82QpBsgCjAV56rBWSOrCeGBqKNrd_Pluogkpo3mi2uUrHs8_gJOZbN19EvXQ6c6rdxtUqwAryQJFsDAAYH5_MI4gdVKiRE7eNhxX6H9cPzaR3Cru7wNM_RROvs-iZuO2KU46_lgGprdxtUl0kYOuuqdNlvhrsplvAR7xp4_Te5HwKpAYGX3KqFCFzaLiQIbI4lXxf2lQSfvE7dqai6TcmhNVICJrxx5TnpglFbK53luFi3w"
    }"#;

    pub const JWKS: &str = r#"{
        "keys": [
            {
                "alg": "RS256",
                "e": "AQAB",
                "kid": "kid-1",
                "kty": "RSA",
                "n": "3sFyNk7yAEPg0GxQKRl2YfEnz6BN3zeL5ypmufPPOqyeTfVhBGE_3neicQOdJb0WlvaUK3JHMO_BIAwHIYztFYrEVkPsEZQwek6KX6y82QpBsgCjAV56rBWSOrCeGBqKNrd_Pluogkpo3mi2uUrHs8_gJOZbN19EvXQ6c6rdxtUqwAryQJFsDAAYH5_MI4gdVKiRE7eNhxX6H9cPzaR3Cru7wNM_RROvs-iZuO2KU46_lgGprdxtUl0kYOuuqdNlvhrsplvAR7xp4_Te5HwKpAYGX3KqFCFzaLiQIbI4lXxf2lQSfvE7dqai6TcmhNVICJrxx5TnpglFbK53luFi3w",
                "use": "sig"
            }
        ]
    }"#;
}

pub mod mixed {
    pub const JWKS: &str = r#"{
        "keys": [
            {
                "kty": "EC",
                "crv": "P-256",
                "kid": "ec-1",
                "x": "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU",
                "y": "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0",
                "alg": "ES256",
                "use": "sig"
            },
            {
                "kty": "oct",
                "kid": "hmac-1",
                "k": "c2VjcmV0",
                "alg": "HS256"
            },
            {
                "alg": "RS256",
                "e": "AQAB",
                "kid": "kid-1",
                "kty": "RSA",
                "n": "3sFyNk7yAEPg0GxQKRl2YfEnz6BN3zeL5ypmufPPOqyeTfVhBGE_3neicQOdJb0WlvaUK3JHMO_BIAwHIYztFYrEVkPsEZQwek6KX6y82QpBsgCjAV56rBWSOrCeGBqKNrd_Pluogkpo3mi2uUrHs8_gJOZbN19EvXQ6c6rdxtUqwAryQJFsDAAYH5_MI4gdVKiRE7eNhxX6H9cPzaR3Cru7wNM_RROvs-iZuO2KU46_lgGprdxtUl0kYOuuqdNlvhrsplvAR7xp4_Te5HwKpAYGX3KqFCFzaLiQIbI4lXxf2lQSfvE7dqai6TcmhNVICJrxx5TnpglFbK53luFi3w",
                "use": "sig"
            }
        ]
    }"#;
}
