use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    /// Master key for profile encryption; per-user keys are derived from it.
    pub encrypt_key: [u8; 32],
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "anime-explorer".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "anime-explorer-users".into()),
            ttl_minutes: parse_ttl_minutes(std::env::var("JWT_TTL_MINUTES").ok())?,
        };
        let encrypt_key = parse_encrypt_key(&std::env::var("ENCRYPT_KEY")?)?;
        Ok(Self {
            database_url,
            jwt,
            encrypt_key,
        })
    }
}

/// JWT_TTL_MINUTES defaults to 60 when unset; a set value must be a positive
/// integer, otherwise the proof lifetime would wrap into nonsense at signing.
pub fn parse_ttl_minutes(raw: Option<String>) -> anyhow::Result<i64> {
    let ttl = match raw {
        Some(v) => v
            .trim()
            .parse::<i64>()
            .map_err(|_| anyhow::anyhow!("JWT_TTL_MINUTES must be an integer"))?,
        None => 60,
    };
    anyhow::ensure!(ttl > 0, "JWT_TTL_MINUTES must be positive");
    Ok(ttl)
}

/// ENCRYPT_KEY is 64 hex characters (32 bytes). Anything else is a startup
/// error rather than a per-request one.
pub fn parse_encrypt_key(raw: &str) -> anyhow::Result<[u8; 32]> {
    let bytes = hex::decode(raw.trim())?;
    let key: [u8; 32] = bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("ENCRYPT_KEY must decode to exactly 32 bytes"))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_64_hex_chars() {
        let raw = "ab".repeat(32);
        let key = parse_encrypt_key(&raw).expect("valid key");
        assert_eq!(key, [0xab; 32]);
    }

    #[test]
    fn rejects_short_key() {
        assert!(parse_encrypt_key("deadbeef").is_err());
    }

    #[test]
    fn rejects_non_hex() {
        let raw = "zz".repeat(32);
        assert!(parse_encrypt_key(&raw).is_err());
    }

    #[test]
    fn ttl_defaults_to_an_hour() {
        assert_eq!(parse_ttl_minutes(None).unwrap(), 60);
    }

    #[test]
    fn ttl_accepts_positive_values() {
        assert_eq!(parse_ttl_minutes(Some("15".into())).unwrap(), 15);
    }

    #[test]
    fn ttl_rejects_zero_negative_and_garbage() {
        for bad in ["0", "-5", "soon"] {
            assert!(parse_ttl_minutes(Some(bad.into())).is_err(), "{bad:?}");
        }
    }
}
